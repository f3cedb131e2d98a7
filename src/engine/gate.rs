//! Spectral gate: per-bin attenuation against the noise profile
//!
//! For each target frame, each bin's magnitude is compared to a
//! threshold derived from the noise profile and the sensitivity offset.
//! Bins below the threshold are pushed toward a continuous attenuation
//! floor (never a hard gate), and the per-bin gain is smoothed across
//! frames so a bin cannot flip between pass and suppress from one frame
//! to the next — the main defense against musical-noise artifacts.

use serde::{Deserialize, Serialize};

use super::{db_to_linear, NoiseProfile, MAG_FLOOR};
use crate::error::ReductionError;

/// User-facing reduction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReductionParams {
    /// Maximum suppression applied to noise-dominated bins (0-48 dB)
    pub noise_gain_db: f32,
    /// Threshold offset above the noise floor (0-24 dB); higher values
    /// classify more bins as noise
    pub sensitivity_db: f32,
    /// Time-axis gain smoothing in frames; 0 disables smoothing
    pub smoothing_frames: u32,
}

impl Default for ReductionParams {
    fn default() -> Self {
        Self {
            noise_gain_db: 12.0,
            sensitivity_db: 6.0,
            smoothing_frames: 3,
        }
    }
}

impl ReductionParams {
    pub fn validate(&self) -> Result<(), ReductionError> {
        if !self.noise_gain_db.is_finite() || !(0.0..=48.0).contains(&self.noise_gain_db) {
            return Err(ReductionError::InvalidParameters(format!(
                "noise gain must be 0-48 dB, got {}",
                self.noise_gain_db
            )));
        }
        if !self.sensitivity_db.is_finite() || !(0.0..=24.0).contains(&self.sensitivity_db) {
            return Err(ReductionError::InvalidParameters(format!(
                "sensitivity must be 0-24 dB, got {}",
                self.sensitivity_db
            )));
        }
        if self.smoothing_frames > 128 {
            return Err(ReductionError::InvalidParameters(format!(
                "smoothing must be 0-128 frames, got {}",
                self.smoothing_frames
            )));
        }
        Ok(())
    }
}

/// Stateful per-bin gate applied to an ordered sequence of frames.
///
/// The smoothing accumulator makes processing order-dependent: frame
/// i's gain depends on frame i-1. Frames must be fed in time order.
pub struct SpectralGate {
    thresholds: Vec<f32>,
    attenuation_floor: f32,
    smoothing_frames: u32,
    gains: Vec<f32>,
    primed: bool,
}

impl SpectralGate {
    pub fn new(profile: &NoiseProfile, params: &ReductionParams) -> Self {
        let sensitivity = db_to_linear(params.sensitivity_db);
        let thresholds: Vec<f32> = profile
            .threshold_base()
            .iter()
            .map(|&base| (base * sensitivity).max(MAG_FLOOR))
            .collect();
        let bins = thresholds.len();

        Self {
            thresholds,
            attenuation_floor: db_to_linear(-params.noise_gain_db),
            smoothing_frames: params.smoothing_frames,
            gains: vec![1.0; bins],
            primed: false,
        }
    }

    /// Attenuate one frame's magnitudes in place. Phase is not touched
    /// by the gate; the caller reuses the original phases unchanged.
    pub fn process_frame(&mut self, magnitudes: &mut [f32]) {
        let floor = self.attenuation_floor;

        if !self.primed {
            // Seed the smoothing state from the first frame so early
            // frames are not biased toward unity gain
            for (i, &mag) in magnitudes.iter().enumerate().take(self.gains.len()) {
                self.gains[i] = raw_gain(mag, self.thresholds[i], floor);
            }
            self.primed = true;
        } else {
            let blend = 1.0 / (self.smoothing_frames as f32 + 1.0);
            for (i, &mag) in magnitudes.iter().enumerate().take(self.gains.len()) {
                let raw = raw_gain(mag, self.thresholds[i], floor);
                self.gains[i] += (raw - self.gains[i]) * blend;
            }
        }

        for (mag, &gain) in magnitudes.iter_mut().zip(&self.gains) {
            *mag *= gain;
        }
    }

    /// Current smoothed per-bin gains, for inspection in tests
    pub fn gains(&self) -> &[f32] {
        &self.gains
    }
}

/// Continuous gain in [floor, 1]. Quadratic in the magnitude ratio
/// (linear in energy): bins at or above the threshold pass unchanged,
/// bins far below approach the floor smoothly.
fn raw_gain(magnitude: f32, threshold: f32, floor: f32) -> f32 {
    let ratio = magnitude.max(MAG_FLOOR) / threshold;
    if ratio >= 1.0 {
        1.0
    } else {
        floor + (1.0 - floor) * ratio * ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with_level(fft_size: usize, level: f32, frames: usize) -> NoiseProfile {
        let mut profile = NoiseProfile::new(fft_size, 44100);
        let mags = vec![level; fft_size / 2 + 1];
        for _ in 0..frames {
            profile.add_frame(&mags);
        }
        profile
    }

    #[test]
    fn test_params_validation() {
        assert!(ReductionParams::default().validate().is_ok());

        let bad_gain = ReductionParams {
            noise_gain_db: 60.0,
            ..Default::default()
        };
        assert!(matches!(
            bad_gain.validate(),
            Err(ReductionError::InvalidParameters(_))
        ));

        let bad_sensitivity = ReductionParams {
            sensitivity_db: -1.0,
            ..Default::default()
        };
        assert!(bad_sensitivity.validate().is_err());

        let bad_smoothing = ReductionParams {
            smoothing_frames: 500,
            ..Default::default()
        };
        assert!(bad_smoothing.validate().is_err());
    }

    #[test]
    fn test_loud_bins_pass_unchanged() {
        let profile = profile_with_level(256, 0.01, 8);
        let params = ReductionParams::default();
        let mut gate = SpectralGate::new(&profile, &params);

        let mut mags = vec![1.0f32; 129];
        gate.process_frame(&mut mags);
        for &m in &mags {
            assert!((m - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_noise_bins_hit_the_floor() {
        let profile = profile_with_level(256, 0.1, 8);
        let params = ReductionParams {
            smoothing_frames: 0,
            ..Default::default()
        };
        let floor = db_to_linear(-params.noise_gain_db);
        let mut gate = SpectralGate::new(&profile, &params);

        // Far below threshold: gain should be close to the floor
        let mut mags = vec![1e-4f32; 129];
        gate.process_frame(&mut mags);
        for &g in gate.gains() {
            assert!(g >= floor);
            assert!(g < floor * 1.01, "gain {} should sit at floor {}", g, floor);
        }
    }

    #[test]
    fn test_silent_profile_is_nearly_transparent() {
        // Profile built from silence: thresholds sit at the magnitude
        // floor, so any real signal passes with unity gain
        let profile = profile_with_level(256, 0.0, 8);
        let params = ReductionParams {
            sensitivity_db: 0.0,
            ..Default::default()
        };
        let mut gate = SpectralGate::new(&profile, &params);

        let original = vec![0.3f32; 129];
        let mut mags = original.clone();
        gate.process_frame(&mut mags);
        for (o, m) in original.iter().zip(&mags) {
            assert!((o - m).abs() < 1e-6);
        }
    }

    #[test]
    fn test_monotonic_suppression_in_noise_gain() {
        let profile = profile_with_level(256, 0.1, 8);
        let below_threshold = vec![0.05f32; 129];

        let mut last_rms = f32::MAX;
        for gain_db in [6.0, 12.0, 24.0, 48.0] {
            let params = ReductionParams {
                noise_gain_db: gain_db,
                smoothing_frames: 0,
                ..Default::default()
            };
            let mut gate = SpectralGate::new(&profile, &params);
            let mut mags = below_threshold.clone();
            gate.process_frame(&mut mags);

            let rms =
                (mags.iter().map(|m| m * m).sum::<f32>() / mags.len() as f32).sqrt();
            assert!(
                rms < last_rms,
                "rms {} did not drop at noise gain {} dB",
                rms,
                gain_db
            );
            last_rms = rms;
        }
    }

    #[test]
    fn test_smoothing_bounds_gain_steps() {
        let profile = profile_with_level(256, 0.1, 8);
        let params = ReductionParams {
            noise_gain_db: 24.0,
            smoothing_frames: 4,
            ..Default::default()
        };
        let floor = db_to_linear(-params.noise_gain_db);
        let max_step = (1.0 - floor) / (params.smoothing_frames as f32 + 1.0) + 1e-6;
        let mut gate = SpectralGate::new(&profile, &params);

        let loud = vec![1.0f32; 129];
        let quiet = vec![1e-4f32; 129];

        let mut prev: Option<Vec<f32>> = None;
        for i in 0..16 {
            // Worst case for musical noise: alternate loud and quiet frames
            let mut mags = if i % 2 == 0 { quiet.clone() } else { loud.clone() };
            gate.process_frame(&mut mags);
            let gains = gate.gains().to_vec();
            if let Some(prev) = &prev {
                for (g, p) in gains.iter().zip(prev.iter()) {
                    assert!(
                        (g - p).abs() <= max_step,
                        "gain step {} exceeds bound {}",
                        (g - p).abs(),
                        max_step
                    );
                }
            }
            prev = Some(gains);
        }
    }

    #[test]
    fn test_no_smoothing_allows_full_toggle() {
        let profile = profile_with_level(256, 0.1, 8);
        let params = ReductionParams {
            smoothing_frames: 0,
            ..Default::default()
        };
        let floor = db_to_linear(-params.noise_gain_db);
        let mut gate = SpectralGate::new(&profile, &params);

        let mut quiet = vec![1e-4f32; 129];
        gate.process_frame(&mut quiet);
        assert!(gate.gains()[10] < floor * 1.01);

        let mut loud = vec![1.0f32; 129];
        gate.process_frame(&mut loud);
        assert!((gate.gains()[10] - 1.0).abs() < 1e-6);
    }
}
