use async_trait::async_trait;
use crl_types::ContentId;

/// A transient failure from a single backend attempt.
///
/// Backend errors are absorbed by the store's fallback chain and never
/// surfaced per-item; callers see [`crate::StoreError::NotFound`] only
/// after every backend is exhausted.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend does not hold this object.
    #[error("object not present on this backend")]
    Missing,

    /// The backend answered with a non-success HTTP status.
    #[error("backend returned HTTP status {status}")]
    Http { status: u16 },

    /// Transport-level failure (connect, DNS, body read).
    #[error("transport error: {0}")]
    Transport(String),
}

/// A single content gateway.
///
/// Implementations must satisfy these invariants:
/// - Objects are immutable: `store` for an id that already exists must
///   be a no-op.
/// - `fetch` returns the bytes as stored; the caller verifies the hash.
/// - Calls must be safe to race; the store issues concurrent attempts
///   across backends and batch items.
#[async_trait]
pub trait ContentBackend: Send + Sync {
    /// Human-readable backend name (for logs and error messages).
    fn name(&self) -> &str;

    /// Fetch an object's bytes by content id.
    async fn fetch(&self, id: &ContentId) -> Result<Vec<u8>, BackendError>;

    /// Store an object's bytes under its content id.
    async fn store(&self, id: &ContentId, bytes: &[u8]) -> Result<(), BackendError>;

    /// Check whether this backend holds the object.
    async fn contains(&self, id: &ContentId) -> Result<bool, BackendError>;
}
