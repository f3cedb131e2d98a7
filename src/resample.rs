//! Offline sample-rate conversion
//!
//! Used when the noise reference and the source were recorded at
//! different rates: the reference is converted to the source rate so
//! profile bins and target bins describe the same frequencies.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::ReductionError;

const CHUNK_SIZE: usize = 1024;

/// Resample a mono buffer from `from_rate` to `to_rate`
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, ReductionError> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    if from_rate == 0 || to_rate == 0 {
        return Err(ReductionError::Resample(format!(
            "invalid sample rates: {} -> {}",
            from_rate, to_rate
        )));
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let expected_len = (samples.len() as f64 * ratio).round() as usize;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, CHUNK_SIZE, 1)
        .map_err(|e| ReductionError::Resample(format!("Failed to create resampler: {}", e)))?;
    let delay = resampler.output_delay();

    let mut output: Vec<f32> = Vec::with_capacity(expected_len + delay);
    let mut pos = 0;

    // Feed fixed-size input chunks, zero-padding past the end of the
    // input until the filter delay has flushed through
    while output.len() < expected_len + delay {
        let needed = resampler.input_frames_next();
        let mut chunk = vec![0.0f32; needed];
        if pos < samples.len() {
            let n = needed.min(samples.len() - pos);
            chunk[..n].copy_from_slice(&samples[pos..pos + n]);
            pos += n;
        }

        let processed = resampler
            .process(&[chunk], None)
            .map_err(|e| ReductionError::Resample(format!("Resampling failed: {}", e)))?;
        output.extend_from_slice(&processed[0]);
    }

    log::debug!(
        "Resampled {} samples at {} Hz to {} samples at {} Hz",
        samples.len(),
        from_rate,
        expected_len,
        to_rate
    );

    Ok(output[delay..delay + expected_len].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(len: usize, freq: f32, rate: f32) -> Vec<f32> {
        (0..len)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / rate).sin())
            .collect()
    }

    #[test]
    fn test_same_rate_is_identity() {
        let signal = sine(4096, 440.0, 44100.0);
        let out = resample(&signal, 44100, 44100).unwrap();
        assert_eq!(out, signal);
    }

    #[test]
    fn test_output_length_matches_ratio() {
        let signal = sine(44100, 440.0, 44100.0);
        let out = resample(&signal, 44100, 48000).unwrap();
        assert_eq!(out.len(), 48000);

        let down = resample(&signal, 44100, 22050).unwrap();
        assert_eq!(down.len(), 22050);
    }

    #[test]
    fn test_energy_roughly_preserved() {
        let signal = sine(44100, 1000.0, 44100.0);
        let out = resample(&signal, 44100, 48000).unwrap();

        let rms_in = (signal.iter().map(|s| s * s).sum::<f32>() / signal.len() as f32).sqrt();
        let rms_out = (out.iter().map(|s| s * s).sum::<f32>() / out.len() as f32).sqrt();
        let diff_db = 20.0 * (rms_out / rms_in).log10();
        assert!(diff_db.abs() < 1.0, "rms changed by {} dB", diff_db);
    }

    #[test]
    fn test_empty_input() {
        assert!(resample(&[], 44100, 48000).unwrap().is_empty());
    }
}
