use thiserror::Error;

/// Failure taxonomy for one evaluation cycle. None of these are retried
/// internally; the gameplay loop decides what to do with a failed cycle.
#[derive(Debug, Error)]
pub enum ProgressError {
    /// The underlying record log could not be read or written. The cycle is
    /// aborted with difficulty settings untouched.
    #[error("progress store unavailable: {0}")]
    StorageUnavailable(String),

    /// The caller supplied an attempt that is missing required fields.
    /// Rejected before key derivation, never partially processed.
    #[error("malformed attempt record: {0}")]
    MalformedRecord(String),

    /// A category outside the configured enumeration was encountered.
    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

impl From<rusqlite::Error> for ProgressError {
    fn from(e: rusqlite::Error) -> Self {
        ProgressError::StorageUnavailable(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProgressError>;
