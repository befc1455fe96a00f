use crl_types::ContentId;

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The content hash was unresolvable after exhausting every
    /// configured backend. Retryable by the caller at a later time.
    #[error("content not found on any backend: {0}")]
    NotFound(ContentId),

    /// Upload to the primary backend failed.
    #[error("upload to backend '{backend}' failed: {reason}")]
    Upload { backend: String, reason: String },

    /// Serialization failure while preparing a JSON payload.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The store has no configured backends.
    #[error("no backends configured")]
    NoBackends,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
