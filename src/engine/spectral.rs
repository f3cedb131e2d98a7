//! Forward/inverse FFT between time-domain frames and magnitude/phase
//!
//! Thin wrapper over realfft keeping the planned transforms alive for
//! the whole run. `inverse(forward(frame)) ≈ frame` within float
//! tolerance; both directions operate on fixed-size arrays only.

use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

use crate::error::ReductionError;

/// Planned forward and inverse transforms for one FFT size
pub struct SpectralTransform {
    fft_size: usize,
    forward_fft: Arc<dyn RealToComplex<f32>>,
    inverse_fft: Arc<dyn ComplexToReal<f32>>,
}

impl SpectralTransform {
    pub fn new(fft_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        Self {
            fft_size,
            forward_fft: planner.plan_fft_forward(fft_size),
            inverse_fft: planner.plan_fft_inverse(fft_size),
        }
    }

    /// Number of frequency bins (fft_size / 2 + 1)
    pub fn bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Transform a time-domain frame into per-bin magnitude and phase
    pub fn forward(&self, frame: &[f32]) -> Result<(Vec<f32>, Vec<f32>), ReductionError> {
        let mut input = frame.to_vec();
        let mut spectrum = self.forward_fft.make_output_vec();

        self.forward_fft
            .process(&mut input, &mut spectrum)
            .map_err(|e| ReductionError::InvalidSignal(format!("Forward FFT failed: {}", e)))?;

        let magnitudes = spectrum.iter().map(|c| c.norm()).collect();
        let phases = spectrum.iter().map(|c| c.arg()).collect();
        Ok((magnitudes, phases))
    }

    /// Transform magnitude and phase back into a time-domain frame
    pub fn inverse(&self, magnitudes: &[f32], phases: &[f32]) -> Result<Vec<f32>, ReductionError> {
        let mut spectrum: Vec<Complex<f32>> = magnitudes
            .iter()
            .zip(phases)
            .map(|(&mag, &phase)| Complex::from_polar(mag, phase))
            .collect();

        // DC and Nyquist bins of a real spectrum must stay purely real;
        // from_polar leaves them with a rounding-error imaginary part
        if let Some(first) = spectrum.first_mut() {
            first.im = 0.0;
        }
        if let Some(last) = spectrum.last_mut() {
            last.im = 0.0;
        }

        let mut output = self.inverse_fft.make_output_vec();
        self.inverse_fft
            .process(&mut spectrum, &mut output)
            .map_err(|e| ReductionError::InvalidSignal(format!("Inverse FFT failed: {}", e)))?;

        let norm = 1.0 / self.fft_size as f32;
        for sample in output.iter_mut() {
            *sample *= norm;
        }
        Ok(output)
    }
}
