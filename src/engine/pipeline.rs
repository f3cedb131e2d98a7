//! Noise reduction pipeline orchestration
//!
//! Sequences profiling over the reference region and spectral gating
//! over the target region, working on in-memory mono buffers so the
//! engine is testable without any file I/O. The file-level entry point
//! lives in the crate root.

use super::frame::{Framer, OverlapAdd};
use super::gate::{ReductionParams, SpectralGate};
use super::profile::NoiseProfile;
use super::spectral::SpectralTransform;
use crate::error::ReductionError;

/// FFT size for analysis and reduction frames
pub const FFT_SIZE: usize = 2048;

/// Hop size (75% overlap)
pub const HOP_SIZE: usize = FFT_SIZE / 4;

/// Pipeline phase. `Failed` is terminal: a failed invocation is never
/// retried internally, the caller starts over with new inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionState {
    Idle,
    ProfileBuilding,
    Reducing,
    Done,
    Failed,
}

/// One noise reduction invocation: profile once, reduce once.
pub struct NoiseReducer {
    sample_rate: u32,
    params: ReductionParams,
    framer: Framer,
    transform: SpectralTransform,
    profile: Option<NoiseProfile>,
    state: ReductionState,
}

impl NoiseReducer {
    /// Create a reducer for buffers at `sample_rate`. Parameters are
    /// validated here; a rejected parameter set never constructs.
    pub fn new(sample_rate: u32, params: ReductionParams) -> Result<Self, ReductionError> {
        params.validate()?;
        if sample_rate == 0 {
            return Err(ReductionError::InvalidParameters(
                "sample rate must be non-zero".to_string(),
            ));
        }

        Ok(Self {
            sample_rate,
            params,
            framer: Framer::new(FFT_SIZE, HOP_SIZE),
            transform: SpectralTransform::new(FFT_SIZE),
            profile: None,
            state: ReductionState::Idle,
        })
    }

    /// Create a reducer around a profile built earlier. The profile must
    /// have been computed at the same sample rate and FFT size, else bin
    /// correspondence is invalid.
    pub fn with_profile(
        sample_rate: u32,
        params: ReductionParams,
        profile: NoiseProfile,
    ) -> Result<Self, ReductionError> {
        let mut reducer = Self::new(sample_rate, params)?;
        if profile.sample_rate() != sample_rate {
            return Err(ReductionError::SampleRateMismatch {
                profile: profile.sample_rate(),
                input: sample_rate,
            });
        }
        if profile.fft_size() != FFT_SIZE {
            return Err(ReductionError::InvalidParameters(format!(
                "profile FFT size {} does not match pipeline FFT size {}",
                profile.fft_size(),
                FFT_SIZE
            )));
        }
        reducer.profile = Some(profile);
        reducer.state = ReductionState::ProfileBuilding;
        Ok(reducer)
    }

    pub fn state(&self) -> ReductionState {
        self.state
    }

    pub fn profile(&self) -> Option<&NoiseProfile> {
        self.profile.as_ref()
    }

    /// Build the noise profile from a reference buffer of noise-only
    /// audio. Requires at least one full FFT window of material.
    pub fn build_profile(&mut self, reference: &[f32]) -> Result<(), ReductionError> {
        self.build_profile_inner(reference).map_err(|e| self.fail(e))
    }

    fn build_profile_inner(&mut self, reference: &[f32]) -> Result<(), ReductionError> {
        if self.state != ReductionState::Idle {
            return Err(ReductionError::InvalidParameters(format!(
                "build_profile called in {:?} state",
                self.state
            )));
        }
        self.state = ReductionState::ProfileBuilding;

        ensure_finite(reference, "reference")?;
        if reference.len() < FFT_SIZE {
            return Err(ReductionError::InsufficientReferenceData {
                needed: FFT_SIZE,
                got: reference.len(),
            });
        }

        let mut profile = NoiseProfile::new(FFT_SIZE, self.sample_rate);
        for frame in self.framer.interior_frames(reference) {
            let (magnitudes, _) = self.transform.forward(&frame)?;
            profile.add_frame(&magnitudes);
        }

        log::debug!(
            "Noise profile built from {} frames ({} reference samples)",
            profile.frame_count(),
            reference.len()
        );
        self.profile = Some(profile);
        Ok(())
    }

    /// Run spectral gating over the target buffer and return the
    /// reduced signal, same length as the input. An empty target is a
    /// successful no-op.
    pub fn reduce(&mut self, target: &[f32]) -> Result<Vec<f32>, ReductionError> {
        self.reduce_inner(target).map_err(|e| self.fail(e))
    }

    fn reduce_inner(&mut self, target: &[f32]) -> Result<Vec<f32>, ReductionError> {
        if self.state != ReductionState::ProfileBuilding {
            return Err(ReductionError::InvalidParameters(format!(
                "reduce called in {:?} state (profile not built?)",
                self.state
            )));
        }
        self.state = ReductionState::Reducing;

        if target.is_empty() {
            self.state = ReductionState::Done;
            return Ok(Vec::new());
        }
        ensure_finite(target, "target")?;

        let mut gate = match &self.profile {
            Some(profile) => SpectralGate::new(profile, &self.params),
            None => {
                return Err(ReductionError::InvalidParameters(
                    "noise profile has not been built".to_string(),
                ))
            }
        };
        let mut reconstruction = OverlapAdd::new(&self.framer, target.len());

        // The gate carries smoothing state across frames, so this loop
        // is strictly sequential in frame order
        for frame in self.framer.frames(target) {
            let (mut magnitudes, phases) = self.transform.forward(&frame.samples)?;
            gate.process_frame(&mut magnitudes);
            let reduced = self.transform.inverse(&magnitudes, &phases)?;
            reconstruction.add_frame(frame.start, &reduced);
        }

        let output = reconstruction.finish();
        log::debug!(
            "Reduced {} samples at {} Hz",
            output.len(),
            self.sample_rate
        );
        self.state = ReductionState::Done;
        Ok(output)
    }

    fn fail(&mut self, err: ReductionError) -> ReductionError {
        self.state = ReductionState::Failed;
        err
    }
}

/// Reject buffers containing NaN or infinite samples before they reach
/// the transform
fn ensure_finite(samples: &[f32], what: &str) -> Result<(), ReductionError> {
    if let Some(idx) = samples.iter().position(|s| !s.is_finite()) {
        return Err(ReductionError::InvalidSignal(format!(
            "non-finite sample in {} buffer at index {}",
            what, idx
        )));
    }
    Ok(())
}
