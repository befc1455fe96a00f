use crl_store::StoreError;
use crl_types::ContentId;

/// Errors from content resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The underlying store failed (typically `NotFound` after all
    /// backends were exhausted).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The payload cannot be decoded, or the indirection depth/cycle
    /// bound was exceeded. Not retryable: the same bytes will always
    /// fail the same way.
    #[error("malformed content {id}: {reason}")]
    MalformedContent { id: ContentId, reason: String },
}

/// Result alias for resolver operations.
pub type ResolveResult<T> = Result<T, ResolveError>;
