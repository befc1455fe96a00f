use std::sync::Arc;

use crl_crypto::ContentHasher;
use crl_types::ContentId;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::backend::{BackendError, ContentBackend};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::gateway::HttpGateway;

/// Content-addressed store over an ordered list of gateway backends.
///
/// Writes go to the primary (first) backend after a dedup probe across
/// the whole list. Reads walk the list in priority order; each attempt
/// carries its own timeout and every backend gets a bounded retry budget
/// before the chain advances. Transient failures are absorbed here and
/// never surfaced per attempt — [`StoreError::NotFound`] means every
/// backend was exhausted.
pub struct ContentStore {
    backends: Vec<Arc<dyn ContentBackend>>,
    config: StoreConfig,
}

impl ContentStore {
    /// Build a store from its config, constructing an [`HttpGateway`]
    /// per configured endpoint.
    pub fn new(config: StoreConfig) -> Self {
        let backends = config
            .gateways
            .iter()
            .map(|g| Arc::new(HttpGateway::from_config(g)) as Arc<dyn ContentBackend>)
            .collect();
        Self { backends, config }
    }

    /// Build a store over explicit backends (tests, embedding).
    pub fn with_backends(backends: Vec<Arc<dyn ContentBackend>>, config: StoreConfig) -> Self {
        Self { backends, config }
    }

    /// Append a backend at the lowest priority.
    pub fn add_backend(&mut self, backend: Arc<dyn ContentBackend>) {
        self.backends.push(backend);
    }

    /// Number of configured backends.
    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    /// The active configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Store raw bytes and return their content id.
    ///
    /// Deterministic and idempotent: identical bytes always produce the
    /// identical id, and if any backend already holds the object the
    /// call is a no-op success.
    pub async fn put_bytes(&self, bytes: &[u8]) -> StoreResult<ContentId> {
        let id = ContentHasher::CONTENT.hash(bytes);

        // Dedup probe in priority order; probe errors count as "not
        // present" and fall through to upload.
        for backend in &self.backends {
            match timeout(self.config.attempt_timeout, backend.contains(&id)).await {
                Ok(Ok(true)) => {
                    debug!(id = %id.short_hex(), backend = backend.name(), "put deduplicated");
                    return Ok(id);
                }
                Ok(Ok(false)) => {}
                Ok(Err(e)) => {
                    debug!(backend = backend.name(), error = %e, "dedup probe failed");
                }
                Err(_) => {
                    debug!(backend = backend.name(), "dedup probe timed out");
                }
            }
        }

        let primary = self.backends.first().ok_or(StoreError::NoBackends)?;
        match timeout(self.config.attempt_timeout, primary.store(&id, bytes)).await {
            Ok(Ok(())) => {
                debug!(id = %id.short_hex(), backend = primary.name(), size = bytes.len(), "object stored");
                Ok(id)
            }
            Ok(Err(e)) => Err(StoreError::Upload {
                backend: primary.name().to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(StoreError::Upload {
                backend: primary.name().to_string(),
                reason: format!("timed out after {:?}", self.config.attempt_timeout),
            }),
        }
    }

    /// Serialize a value as JSON and store it.
    ///
    /// Same hash type and same determinism as [`Self::put_bytes`]; the
    /// two variants differ only in encoding.
    pub async fn put_json<T: serde::Serialize>(&self, value: &T) -> StoreResult<ContentId> {
        let bytes =
            serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.put_bytes(&bytes).await
    }

    /// Fetch an object's bytes, falling back across backends.
    ///
    /// A backend attempt fails on timeout, transport error, non-success
    /// response, or a body that does not re-hash to `id`. Exhausting one
    /// backend's retry budget advances to the next, never aborting the
    /// whole call.
    pub async fn get(&self, id: &ContentId) -> StoreResult<Vec<u8>> {
        for backend in &self.backends {
            for attempt in 1..=self.config.attempts_per_backend.max(1) {
                match timeout(self.config.attempt_timeout, backend.fetch(id)).await {
                    Ok(Ok(bytes)) => {
                        if ContentHasher::CONTENT.verify(&bytes, id) {
                            debug!(id = %id.short_hex(), backend = backend.name(), "object fetched");
                            return Ok(bytes);
                        }
                        // Corrupt or wrong body; nothing this backend
                        // returns for the id can be trusted.
                        warn!(id = %id.short_hex(), backend = backend.name(), "body hash mismatch; advancing");
                        break;
                    }
                    Ok(Err(BackendError::Missing)) => {
                        debug!(id = %id.short_hex(), backend = backend.name(), "object not present; advancing");
                        break;
                    }
                    Ok(Err(e)) => {
                        warn!(id = %id.short_hex(), backend = backend.name(), attempt, error = %e, "fetch attempt failed");
                    }
                    Err(_) => {
                        warn!(id = %id.short_hex(), backend = backend.name(), attempt, "fetch attempt timed out");
                    }
                }
            }
        }
        Err(StoreError::NotFound(*id))
    }
}

impl std::fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.backends.iter().map(|b| b.name()).collect();
        f.debug_struct("ContentStore")
            .field("backends", &names)
            .finish()
    }
}
