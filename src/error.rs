//! Error types for the share pipeline

use thiserror::Error;

/// Pipeline error type
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A threshold, share count, or channel tag outside its valid range.
    /// Raised before any file is created or opened.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A caller-side contract breach detected mid-stream, e.g. share payloads
    /// of unequal length or a missing end-of-data marker.
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// Underlying file or stream failure; aborts the whole operation.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Erasure coding failure from the Reed-Solomon backend.
    #[error("Erasure coding error: {0}")]
    Erasure(reed_solomon_erasure::Error),

    /// The self-check comparison found diverging bytes.
    #[error("Comparison mismatch at byte {position}")]
    ComparisonMismatch { position: u64 },
}

impl From<reed_solomon_erasure::Error> for PipelineError {
    fn from(e: reed_solomon_erasure::Error) -> Self {
        PipelineError::Erasure(e)
    }
}

/// Pipeline result type
pub type PipelineResult<T> = Result<T, PipelineError>;
