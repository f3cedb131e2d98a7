//! Spectral noise reduction from a noise-only reference clip
//!
//! Builds a per-frequency-bin statistical profile of stationary
//! background noise (hiss, hum, fan noise) from a reference segment,
//! then attenuates bins of the target signal that resemble the profile
//! while leaving foreground content untouched.
//!
//! Two API levels:
//! - [`NoiseReducer`] works on in-memory mono buffers and is what the
//!   tests exercise.
//! - [`reduce_noise_file`] wraps it with file decode/encode and
//!   resampling for the common path: point it at a noise-only region of
//!   a profile file and a source file, get a cleaned WAV back.

pub mod audio_io;
pub mod engine;
pub mod error;
pub mod resample;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use engine::{NoiseProfile, NoiseReducer, ReductionParams, ReductionState};
pub use error::ReductionError;

/// A file-level reduction request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReduceRequest {
    /// File containing the noise-only reference
    pub profile_path: String,
    /// Reference region start, seconds
    pub profile_start: f64,
    /// Reference region end, seconds
    pub profile_end: f64,
    /// File to reduce
    pub source_path: String,
    /// Output WAV path
    pub dest_path: String,
    pub params: ReductionParams,
}

/// Result of a successful file-level reduction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReduceReport {
    pub output_path: String,
    pub duration: f64,
    pub sample_rate: u32,
}

/// Reduce noise in `source_path` using a reference region of
/// `profile_path`, writing the result to `dest_path` as 32-bit float
/// WAV at the source rate and channel count.
///
/// If the two files were recorded at different sample rates, the
/// reference region is resampled to the source rate before profiling so
/// profile bins and target bins line up. Any failure is terminal and
/// leaves no partial output behind.
pub fn reduce_noise_file(request: &ReduceRequest) -> Result<ReduceReport, ReductionError> {
    if !request.profile_start.is_finite()
        || !request.profile_end.is_finite()
        || request.profile_start < 0.0
    {
        return Err(ReductionError::InvalidParameters(format!(
            "profile region [{}, {}] is not valid",
            request.profile_start, request.profile_end
        )));
    }
    if request.profile_end <= request.profile_start {
        return Err(ReductionError::InvalidParameters(format!(
            "profile end {} must be greater than profile start {}",
            request.profile_end, request.profile_start
        )));
    }
    request.params.validate()?;

    log::info!(
        "Reducing noise in {} using profile {} [{:.2}s - {:.2}s]",
        request.source_path,
        request.profile_path,
        request.profile_start,
        request.profile_end
    );

    let profile_audio = audio_io::load_audio(Path::new(&request.profile_path))?;
    let source_audio = audio_io::load_audio(Path::new(&request.source_path))?;

    // Slice the reference region, clamped to the file length
    let start_sample = (request.profile_start * profile_audio.sample_rate as f64) as usize;
    let end_sample = (request.profile_end * profile_audio.sample_rate as f64) as usize;
    if start_sample >= profile_audio.samples.len() {
        return Err(ReductionError::InvalidParameters(format!(
            "profile start {:.2}s is past the end of the profile file ({:.2}s)",
            request.profile_start,
            profile_audio.duration_seconds()
        )));
    }
    let end_sample = end_sample.min(profile_audio.samples.len());
    let mut reference = profile_audio.samples[start_sample..end_sample].to_vec();

    if profile_audio.sample_rate != source_audio.sample_rate {
        log::info!(
            "Resampling reference from {} Hz to {} Hz",
            profile_audio.sample_rate,
            source_audio.sample_rate
        );
        reference = resample::resample(
            &reference,
            profile_audio.sample_rate,
            source_audio.sample_rate,
        )?;
    }

    let mut reducer = NoiseReducer::new(source_audio.sample_rate, request.params.clone())?;
    reducer.build_profile(&reference)?;
    let reduced = reducer.reduce(&source_audio.samples)?;

    audio_io::write_wav(
        Path::new(&request.dest_path),
        &reduced,
        source_audio.sample_rate,
        source_audio.channels,
    )?;

    let report = ReduceReport {
        output_path: request.dest_path.clone(),
        duration: reduced.len() as f64 / source_audio.sample_rate as f64,
        sample_rate: source_audio.sample_rate,
    };
    log::info!(
        "Wrote {} ({:.2}s at {} Hz)",
        report.output_path,
        report.duration,
        report.sample_rate
    );
    Ok(report)
}
