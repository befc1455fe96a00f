use crl_types::{ActorId, CapabilityState, ContentId, Role};

use crate::error::LedgerError;

/// Read boundary for ledger queries.
///
/// All reads are pure in-memory lookups returning snapshots in stable
/// order: append order for record indices, first-grant order for
/// relation listings.
pub trait LedgerReader: Send + Sync {
    /// The role bound to an identity, if registered.
    fn role_of(&self, id: &ActorId) -> Option<Role>;

    /// Returns `true` if the identity has completed registration.
    fn is_registered(&self, id: &ActorId) -> bool {
        self.role_of(id).is_some()
    }

    /// The profile content hash bound at registration.
    fn profile_of(&self, id: &ActorId) -> Result<ContentId, LedgerError>;

    /// Returns `true` iff an Active capability (patient → doctor) exists.
    fn check_access(&self, patient: &ActorId, doctor: &ActorId) -> bool;

    /// The patient's record index, in append order.
    fn records(&self, patient: &ActorId) -> Result<Vec<ContentId>, LedgerError>;

    /// Doctors currently holding an Active capability from this patient.
    fn authorized_doctors(&self, patient: &ActorId) -> Result<Vec<ActorId>, LedgerError>;

    /// Patients that currently grant this doctor an Active capability.
    fn granted_patients(&self, doctor: &ActorId) -> Result<Vec<ActorId>, LedgerError>;
}

/// Write boundary for ledger mutations.
///
/// Every mutation is atomic with respect to concurrent callers on the
/// same patient: two concurrent appends both land, in some serial order.
pub trait LedgerWriter: Send + Sync {
    /// Bind a role and profile hash to an identity, one time only.
    fn register_identity(
        &self,
        id: ActorId,
        role: Role,
        profile: ContentId,
    ) -> Result<(), LedgerError>;

    /// Set the (patient → doctor) capability to Active.
    ///
    /// Idempotent; only `patient` may mutate their own grants. Returns
    /// the capability's new state.
    fn grant_access(
        &self,
        patient: &ActorId,
        doctor: &ActorId,
    ) -> Result<CapabilityState, LedgerError>;

    /// Set the (patient → doctor) capability to Revoked.
    ///
    /// Idempotent; a no-op (not an error) if no grant exists.
    fn revoke_access(
        &self,
        patient: &ActorId,
        doctor: &ActorId,
    ) -> Result<CapabilityState, LedgerError>;

    /// Append a record hash to the patient's index.
    ///
    /// Authorized iff `caller == patient` or the caller holds an Active
    /// capability from the patient.
    fn append_record(
        &self,
        caller: &ActorId,
        patient: &ActorId,
        hash: ContentId,
    ) -> Result<(), LedgerError>;
}
