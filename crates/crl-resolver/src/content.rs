use crl_types::ContentId;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ResolveError, ResolveResult};

/// Materialized content, after any pointer wrappers were followed.
#[derive(Clone, Debug, PartialEq)]
pub struct Content {
    /// Hash of the content actually returned (the end of the chain).
    pub id: ContentId,
    /// Hash the caller originally asked for (the head of the chain).
    pub requested: ContentId,
    /// Number of pointer indirections followed.
    pub hops: u32,
    /// The decoded JSON payload.
    pub value: Value,
}

impl Content {
    /// Decode the payload into a typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> ResolveResult<T> {
        serde_json::from_value(self.value.clone()).map_err(|e| ResolveError::MalformedContent {
            id: self.id,
            reason: e.to_string(),
        })
    }

    /// Returns `true` if resolution went through at least one wrapper.
    pub fn followed_pointer(&self) -> bool {
        self.hops > 0
    }
}

/// Inspect a decoded payload for a pointer wrapper.
///
/// A wrapper is recognized by its `data` field holding a string that
/// parses as a content hash; inline content never matches because hash
/// strings have a fixed syntactic shape.
pub fn pointer_target(value: &Value) -> Option<ContentId> {
    let data = value.get("data")?.as_str()?;
    ContentId::from_hex(data).ok()
}
