use serde::{Deserialize, Serialize};

/// Configuration for the access gate pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateConfig {
    /// When `true`, the gate runs in permissive mode: all stages are
    /// skipped and every request is authorized. For single-user demos
    /// and test harnesses only — never for shared deployments.
    pub permissive: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self { permissive: false }
    }
}

impl GateConfig {
    /// A maximally permissive configuration.
    pub fn permissive() -> Self {
        Self { permissive: true }
    }
}
