use crl_gate::GateError;
use crl_ledger::LedgerError;
use crl_resolver::ResolveError;
use crl_store::StoreError;

/// Errors surfaced by vault operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The gate denied the request. Never retried and never escalated
    /// to a different identity.
    #[error("access denied: {reason}")]
    Denied { reason: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Gate(#[from] GateError),
}

/// Result alias for vault operations.
pub type ClientResult<T> = Result<T, ClientError>;
