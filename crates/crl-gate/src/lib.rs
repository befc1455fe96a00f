//! Access gate for the Clinical Record Ledger.
//!
//! Every read or write request must pass through the gate before it can
//! reach the ledger or the resolver. The gate runs a fail-fast pipeline
//! of stages (registration, role, capability) realizing the per-request
//! state machine `Unauthenticated -> Authenticated -> {Authorized,
//! Denied}`, and produces a full audit trail with per-stage reasons.
//!
//! Stages are pure: the caller assembles a [`GateContext`] from ledger
//! reads, and evaluation itself never suspends.
//!
//! # Quick Start
//!
//! ```rust
//! use crl_gate::{AccessGate, AccessRequest, GateConfig, GateContext, Operation};
//! use crl_types::{ActorId, Role};
//!
//! let gate = AccessGate::with_default_stages(GateConfig::default());
//! let patient = ActorId::ephemeral();
//! let request = AccessRequest::new(patient, Operation::ReadRecords { patient });
//! let mut context = GateContext {
//!     caller_role: Some(Role::Patient),
//!     patient_role: Some(Role::Patient),
//!     ..GateContext::minimal()
//! };
//! let result = gate.evaluate(&request, &mut context).unwrap();
//! assert!(result.is_authorized());
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod stage;
pub mod stages;

// Re-exports for convenience.
pub use config::GateConfig;
pub use error::GateError;
pub use gate::{AccessGate, GateResult};
pub use stage::{
    AccessRequest, GateContext, GateStage, Operation, RequestState, StageDecision, StageResult,
};
pub use stages::capability::CapabilityStage;
pub use stages::registration::RegistrationStage;
pub use stages::role::RoleStage;
