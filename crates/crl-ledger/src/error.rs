use crl_types::{ActorId, Role};

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The identity already holds a role. Registration is one-time and
    /// permanent; not retryable.
    #[error("identity {0} is already registered")]
    DuplicateRegistration(ActorId),

    /// The identity has never been registered.
    #[error("identity {0} is not registered")]
    UnknownIdentity(ActorId),

    /// The identity holds a different role than the operation requires.
    #[error("{actor} is registered as {actual}, operation requires {expected}")]
    RoleMismatch {
        actor: ActorId,
        expected: Role,
        actual: Role,
    },

    /// The caller lacks the required capability. Never retried and never
    /// escalated to a different identity.
    #[error("authorization denied: {reason}")]
    Authorization { reason: String },
}
