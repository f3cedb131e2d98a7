/// Typed errors for the noise reduction pipeline.
///
/// Every failure is terminal for the current invocation; nothing is
/// retried internally and no partial output is written.
#[derive(Debug, thiserror::Error)]
pub enum ReductionError {
    #[error("Insufficient reference data: need at least {needed} samples, got {got}")]
    InsufficientReferenceData { needed: usize, got: usize },
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("Invalid signal: {0}")]
    InvalidSignal(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Encode error: {0}")]
    Encode(String),
    #[error("Resample error: {0}")]
    Resample(String),
    // Field cannot be named `source`: thiserror reserves that name for
    // the error cause
    #[error("Sample rate mismatch: profile is {profile} Hz, input is {input} Hz")]
    SampleRateMismatch { profile: u32, input: u32 },
}
