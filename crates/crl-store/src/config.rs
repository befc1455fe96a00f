use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A single gateway endpoint entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Display name used in logs.
    pub name: String,
    /// Endpoint URL.
    pub url: String,
    /// Optional bearer credential for this gateway.
    pub token: Option<String>,
}

/// Configuration for the content store's fallback behavior.
///
/// Gateways are listed in priority order: the first entry is the primary
/// (upload target); reads advance down the list on failure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// How many attempts a backend gets before the chain advances.
    pub attempts_per_backend: u32,
    /// Independent timeout applied to every single backend attempt.
    pub attempt_timeout: Duration,
    /// Ordered gateway endpoints.
    pub gateways: Vec<GatewayConfig>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            attempts_per_backend: 2,
            attempt_timeout: Duration::from_secs(5),
            gateways: Vec::new(),
        }
    }
}

impl StoreConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
