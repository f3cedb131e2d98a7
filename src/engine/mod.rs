//! Spectral noise reduction engine
//!
//! Processing stages, in data-flow order:
//! 1. Framing into overlapping Hann-windowed frames
//! 2. Forward FFT to magnitude/phase
//! 3. Noise profiling (reference region) or spectral gating (target)
//! 4. Inverse FFT and overlap-add reconstruction

pub mod frame;
pub mod spectral;
pub mod profile;
pub mod gate;
pub mod pipeline;

pub use gate::ReductionParams;
pub use pipeline::{NoiseReducer, ReductionState};
pub use profile::NoiseProfile;

/// Magnitude floor used to keep silence and numeric underflow out of
/// bin statistics and threshold math.
pub(crate) const MAG_FLOOR: f32 = 1e-10;

/// Convert a decibel value to a linear amplitude factor
pub(crate) fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}
