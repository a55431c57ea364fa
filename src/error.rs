//! Error types for simcheck.

use thiserror::Error;

/// Errors that can occur during indexing, quantization, or clustering.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Two vectors that must share a dimension do not.
    #[error("dimension mismatch: expected {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Vector is empty or contains non-finite values.
    #[error("invalid vector: {0}")]
    InvalidVector(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// An id was inserted twice into the same index.
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// An id referenced by metadata or a lookup is not known.
    #[error("unknown id: {0}")]
    UnknownId(String),

    /// Too few points to run the requested computation.
    #[error("insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// The computation was cancelled through its `CancelToken`.
    #[error("operation cancelled")]
    Cancelled,

    /// Persisted graph metadata is inconsistent.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// JSON encoding/decoding of persisted metadata failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error while reading or writing metadata.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Background worker failed or went away.
    #[error("worker error: {0}")]
    Worker(String),
}

impl IndexError {
    /// Shorthand used wherever two slices are compared.
    pub(crate) fn dimension(expected: usize, actual: usize) -> Self {
        IndexError::DimensionMismatch { expected, actual }
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
