//! Noise profile statistics
//!
//! Accumulates per-bin magnitude mean and variance over the reference
//! region (Welford's running algorithm), then exposes the per-bin
//! threshold base the gate compares against. The profile is built once
//! per invocation and read-only afterwards.

use super::MAG_FLOOR;

/// Per-frequency-bin statistics of the reference noise.
///
/// Indexed identically to a spectral frame (0..fft_size/2). A profile is
/// only valid against frames produced with the same FFT size and sample
/// rate; the pipeline enforces both.
#[derive(Debug, Clone)]
pub struct NoiseProfile {
    mean: Vec<f32>,
    m2: Vec<f32>,
    frame_count: usize,
    fft_size: usize,
    sample_rate: u32,
}

impl NoiseProfile {
    pub fn new(fft_size: usize, sample_rate: u32) -> Self {
        let bins = fft_size / 2 + 1;
        Self {
            mean: vec![0.0; bins],
            m2: vec![0.0; bins],
            frame_count: 0,
            fft_size,
            sample_rate,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn bins(&self) -> usize {
        self.mean.len()
    }

    /// Fold one reference frame's magnitudes into the running statistics.
    /// Magnitudes are clamped to a small positive floor first so silent
    /// stretches inside the reference cannot zero out a bin.
    pub fn add_frame(&mut self, magnitudes: &[f32]) {
        self.frame_count += 1;
        let n = self.frame_count as f32;

        for (i, &raw) in magnitudes.iter().enumerate().take(self.mean.len()) {
            let mag = raw.max(MAG_FLOOR);
            let delta = mag - self.mean[i];
            self.mean[i] += delta / n;
            let delta2 = mag - self.mean[i];
            self.m2[i] += delta * delta2;
        }
    }

    /// Per-bin noise magnitude estimate: mean plus two standard
    /// deviations, covering the typical spread of the reference noise
    /// without letting one outlier frame pin the bin the way a max
    /// statistic would.
    pub fn threshold_base(&self) -> Vec<f32> {
        let n = self.frame_count.max(1) as f32;
        self.mean
            .iter()
            .zip(&self.m2)
            .map(|(&mean, &m2)| {
                let variance = m2 / n;
                (mean + 2.0 * variance.sqrt()).max(MAG_FLOOR)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_profile() {
        let profile = NoiseProfile::new(2048, 44100);
        assert_eq!(profile.frame_count(), 0);
        assert_eq!(profile.bins(), 1025);
        // No frames: threshold base sits at the magnitude floor
        for &t in &profile.threshold_base() {
            assert_eq!(t, MAG_FLOOR);
        }
    }

    #[test]
    fn test_constant_frames_have_zero_variance() {
        let mut profile = NoiseProfile::new(256, 44100);
        let mags = vec![0.25f32; 129];
        for _ in 0..10 {
            profile.add_frame(&mags);
        }

        let base = profile.threshold_base();
        for &t in &base {
            assert!((t - 0.25).abs() < 1e-6, "threshold {} should equal mean", t);
        }
    }

    #[test]
    fn test_variance_widens_threshold() {
        let mut profile = NoiseProfile::new(256, 44100);
        for i in 0..20 {
            let mag = if i % 2 == 0 { 0.1 } else { 0.3 };
            profile.add_frame(&vec![mag; 129]);
        }

        let base = profile.threshold_base();
        // mean 0.2, stddev 0.1 -> base 0.4
        for &t in &base {
            assert!((t - 0.4).abs() < 1e-3, "threshold was {}", t);
        }
    }

    #[test]
    fn test_silence_clamped_to_floor() {
        let mut profile = NoiseProfile::new(256, 44100);
        profile.add_frame(&vec![0.0f32; 129]);
        profile.add_frame(&vec![0.0f32; 129]);

        for &t in &profile.threshold_base() {
            assert!(t >= MAG_FLOOR);
            assert!(t < 1e-8, "silent reference must stay near the floor");
        }
    }
}
