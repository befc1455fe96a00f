use std::time::Duration;

use crl_types::{ActorId, Role};
use uuid::Uuid;

use crate::error::GateError;

// ---------------------------------------------------------------------------
// Operation & AccessRequest
// ---------------------------------------------------------------------------

/// The operation a caller is requesting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Append a record hash to the patient's index.
    AppendRecord { patient: ActorId },
    /// Read the patient's record index and resolve its contents.
    ReadRecords { patient: ActorId },
    /// Activate a capability for a doctor over the caller's records.
    GrantAccess { doctor: ActorId },
    /// Revoke a doctor's capability over the caller's records.
    RevokeAccess { doctor: ActorId },
    /// Read the roster of patients that granted the calling doctor.
    ReadRoster,
}

impl Operation {
    /// Stage- and log-facing operation name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AppendRecord { .. } => "append-record",
            Self::ReadRecords { .. } => "read-records",
            Self::GrantAccess { .. } => "grant-access",
            Self::RevokeAccess { .. } => "revoke-access",
            Self::ReadRoster => "read-roster",
        }
    }

    /// The patient whose data is in scope, if the operation is
    /// patient-scoped. Grant management is scoped to the caller's own
    /// identity.
    pub fn patient_scope(&self, caller: &ActorId) -> Option<ActorId> {
        match self {
            Self::AppendRecord { patient } | Self::ReadRecords { patient } => Some(*patient),
            Self::GrantAccess { .. } | Self::RevokeAccess { .. } => Some(*caller),
            Self::ReadRoster => None,
        }
    }

    /// The grant/revoke target, if any.
    pub fn grantee(&self) -> Option<ActorId> {
        match self {
            Self::GrantAccess { doctor } | Self::RevokeAccess { doctor } => Some(*doctor),
            _ => None,
        }
    }
}

/// A single authorization request: who wants to do what.
#[derive(Clone, Debug)]
pub struct AccessRequest {
    /// Unique request id for the audit trail.
    pub id: Uuid,
    pub caller: ActorId,
    pub operation: Operation,
}

impl AccessRequest {
    pub fn new(caller: ActorId, operation: Operation) -> Self {
        Self {
            id: Uuid::now_v7(),
            caller,
            operation,
        }
    }
}

// ---------------------------------------------------------------------------
// RequestState
// ---------------------------------------------------------------------------

/// Per-request authorization state machine.
///
/// Every request starts `Unauthenticated`, becomes `Authenticated` once
/// the caller's registration is confirmed, and ends `Authorized` or
/// `Denied`. There are no other transitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestState {
    Unauthenticated,
    Authenticated(ActorId),
    Authorized(ActorId),
    Denied { reason: String },
}

impl RequestState {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }
}

// ---------------------------------------------------------------------------
// StageDecision & StageResult
// ---------------------------------------------------------------------------

/// The outcome of a single gate stage evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageDecision {
    /// The stage passed; proceed to the next stage.
    Pass,
    /// The stage failed; the request is denied.
    Fail { reason: String },
}

impl StageDecision {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Recorded result from a completed stage evaluation.
#[derive(Clone, Debug)]
pub struct StageResult {
    /// Name of the stage that produced this result.
    pub stage_name: String,
    /// Whether the stage passed.
    pub passed: bool,
    /// Denial reason (populated on failure).
    pub reason: Option<String>,
    /// Wall-clock time the stage took to evaluate.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// GateContext
// ---------------------------------------------------------------------------

/// Ledger-derived facts available to every gate stage.
///
/// The caller assembles the context from ledger reads before evaluation;
/// stages themselves never perform I/O — capability checks are pure
/// in-memory lookups.
#[derive(Clone, Debug, Default)]
pub struct GateContext {
    /// Registered role of the caller, if any.
    pub caller_role: Option<Role>,
    /// Registered role of the patient in scope, if any.
    pub patient_role: Option<Role>,
    /// Registered role of the grant/revoke target, if any.
    pub grantee_role: Option<Role>,
    /// Whether the caller currently holds an Active capability from the
    /// patient in scope.
    pub has_active_grant: bool,
    /// Results from stages that have already run in this evaluation.
    pub previous_stages: Vec<StageResult>,
}

impl GateContext {
    /// An empty context (useful for tests and permissive mode).
    pub fn minimal() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// GateStage trait
// ---------------------------------------------------------------------------

/// A single evaluation stage in the gate pipeline.
///
/// Stages are evaluated in order. Each stage receives the request and
/// the shared context, and returns a pass/fail decision. The trait is
/// object-safe and `Send + Sync` so stages can be stored in a
/// `Vec<Box<dyn GateStage>>`.
pub trait GateStage: Send + Sync {
    /// Human-readable name of this stage (e.g., "registration").
    fn name(&self) -> &str;

    /// Evaluate the request and return a decision.
    fn evaluate(
        &self,
        request: &AccessRequest,
        context: &GateContext,
    ) -> Result<StageDecision, GateError>;
}
