use crl_types::ContentId;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"crl-content-v1"`) that is
/// prepended to every hash computation. This prevents cross-domain hash
/// collisions: content bytes and a gate-config snapshot with identical
/// bytes produce different hashes.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for stored content objects (records, profiles, documents).
    ///
    /// Every `put` variant hashes through this domain, which is what
    /// makes content addressing deterministic across upload paths.
    pub const CONTENT: Self = Self {
        domain: "crl-content-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ContentId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ContentId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Hash a serializable value as JSON with domain separation.
    pub fn hash_json<T: serde::Serialize>(&self, value: &T) -> Result<ContentId, HasherError> {
        let data =
            serde_json::to_vec(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
        Ok(self.hash(&data))
    }

    /// Verify that data produces the expected content ID.
    pub fn verify(&self, data: &[u8], expected: &ContentId) -> bool {
        self.hash(data) == *expected
    }

    /// Raw BLAKE3 hash without domain separation (for low-level use).
    pub fn raw_hash(data: &[u8]) -> [u8; 32] {
        *blake3::hash(data).as_bytes()
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let data = b"hello world";
        assert_eq!(ContentHasher::CONTENT.hash(data), ContentHasher::CONTENT.hash(data));
    }

    #[test]
    fn different_domains_produce_different_hashes() {
        let data = b"same content";
        let content = ContentHasher::CONTENT.hash(data);
        let custom = ContentHasher::new("crl-audit-v1").hash(data);
        assert_ne!(content, custom);
    }

    #[test]
    fn verify_correct_data() {
        let data = b"test data";
        let id = ContentHasher::CONTENT.hash(data);
        assert!(ContentHasher::CONTENT.verify(data, &id));
    }

    #[test]
    fn verify_incorrect_data() {
        let id = ContentHasher::CONTENT.hash(b"original");
        assert!(!ContentHasher::CONTENT.verify(b"tampered", &id));
    }

    #[test]
    fn hash_json_works() {
        let value = serde_json::json!({"text": "hello", "recordType": "self-reported"});
        let id = ContentHasher::CONTENT.hash_json(&value).unwrap();
        assert!(!id.is_null());
    }

    #[test]
    fn hash_json_is_deterministic() {
        let value = serde_json::json!({"text": "hello"});
        let id1 = ContentHasher::CONTENT.hash_json(&value).unwrap();
        let id2 = ContentHasher::CONTENT.hash_json(&value).unwrap();
        assert_eq!(id1, id2);
    }

    #[test]
    fn raw_hash_no_domain() {
        let h1 = ContentHasher::raw_hash(b"test");
        let h2 = ContentHasher::raw_hash(b"test");
        assert_eq!(h1, h2);
        let domain_hash = ContentHasher::CONTENT.hash(b"test");
        assert_ne!(h1, *domain_hash.as_bytes());
    }
}
