use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use crl_types::ContentId;

use crate::backend::{BackendError, ContentBackend};

/// In-memory, HashMap-based content backend.
///
/// Intended for tests and embedding. All objects are held in memory
/// behind a `RwLock` for safe concurrent access; bytes are cloned on
/// read and write.
pub struct InMemoryBackend {
    name: String,
    objects: RwLock<HashMap<ContentId, Vec<u8>>>,
}

impl InMemoryBackend {
    /// Create a new empty in-memory backend.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the backend holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .map(|bytes| bytes.len() as u64)
            .sum()
    }

    /// Remove an object. Returns `true` if it existed.
    ///
    /// Test hook for simulating gateway data loss; production content
    /// is immutable and permanent.
    pub fn remove(&self, id: &ContentId) -> bool {
        self.objects
            .write()
            .expect("lock poisoned")
            .remove(id)
            .is_some()
    }

    /// Remove all objects.
    pub fn clear(&self) {
        self.objects.write().expect("lock poisoned").clear();
    }

    /// Insert bytes directly under an arbitrary id.
    ///
    /// Test hook for planting corrupt or unaddressed content.
    pub fn insert_raw(&self, id: ContentId, bytes: Vec<u8>) {
        self.objects.write().expect("lock poisoned").insert(id, bytes);
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait]
impl ContentBackend for InMemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, id: &ContentId) -> Result<Vec<u8>, BackendError> {
        let map = self.objects.read().expect("lock poisoned");
        map.get(id).cloned().ok_or(BackendError::Missing)
    }

    async fn store(&self, id: &ContentId, bytes: &[u8]) -> Result<(), BackendError> {
        let mut map = self.objects.write().expect("lock poisoned");
        // Idempotent: content-addressing guarantees the same id always
        // maps to the same bytes.
        map.entry(*id).or_insert_with(|| bytes.to_vec());
        Ok(())
    }

    async fn contains(&self, id: &ContentId) -> Result<bool, BackendError> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("name", &self.name)
            .field("object_count", &self.len())
            .finish()
    }
}
