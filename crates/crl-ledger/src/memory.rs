use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crl_types::{ActorId, CapabilityState, ContentId, Role};
use tracing::debug;

use crate::error::LedgerError;
use crate::traits::{LedgerReader, LedgerWriter};

/// In-memory ledger implementation for tests, local demos, and embedding.
///
/// Identity and capability state sit behind `RwLock`s; each patient's
/// record index sits behind its own `Mutex`, so same-patient appends
/// serialize while cross-patient appends proceed in parallel.
pub struct InMemoryLedger {
    identities: RwLock<HashMap<ActorId, IdentityEntry>>,
    capabilities: RwLock<CapabilityTable>,
    records: RwLock<HashMap<ActorId, Arc<Mutex<Vec<ContentId>>>>>,
}

#[derive(Clone, Copy)]
struct IdentityEntry {
    role: Role,
    profile: ContentId,
}

/// A single (patient → doctor) capability, keyed by position in the
/// patient's grant list. Positions are stable: revocation flips state in
/// place and re-granting reuses the original slot.
struct Grant {
    doctor: ActorId,
    state: CapabilityState,
}

#[derive(Default)]
struct CapabilityTable {
    by_patient: HashMap<ActorId, Vec<Grant>>,
    /// Patients per doctor, in first-grant order. Listings filter by the
    /// authoritative state in `by_patient`.
    by_doctor: HashMap<ActorId, Vec<ActorId>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            identities: RwLock::new(HashMap::new()),
            capabilities: RwLock::new(CapabilityTable::default()),
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of registered identities.
    pub fn identity_count(&self) -> usize {
        self.identities.read().expect("lock poisoned").len()
    }

    fn require_role(&self, id: &ActorId, expected: Role) -> Result<(), LedgerError> {
        let identities = self.identities.read().expect("lock poisoned");
        match identities.get(id) {
            None => Err(LedgerError::UnknownIdentity(*id)),
            Some(entry) if entry.role != expected => Err(LedgerError::RoleMismatch {
                actor: *id,
                expected,
                actual: entry.role,
            }),
            Some(_) => Ok(()),
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerReader for InMemoryLedger {
    fn role_of(&self, id: &ActorId) -> Option<Role> {
        let identities = self.identities.read().expect("lock poisoned");
        identities.get(id).map(|entry| entry.role)
    }

    fn profile_of(&self, id: &ActorId) -> Result<ContentId, LedgerError> {
        let identities = self.identities.read().expect("lock poisoned");
        identities
            .get(id)
            .map(|entry| entry.profile)
            .ok_or(LedgerError::UnknownIdentity(*id))
    }

    fn check_access(&self, patient: &ActorId, doctor: &ActorId) -> bool {
        let capabilities = self.capabilities.read().expect("lock poisoned");
        capabilities
            .by_patient
            .get(patient)
            .and_then(|grants| grants.iter().find(|g| g.doctor == *doctor))
            .map(|g| g.state.is_active())
            .unwrap_or(false)
    }

    fn records(&self, patient: &ActorId) -> Result<Vec<ContentId>, LedgerError> {
        self.require_role(patient, Role::Patient)?;
        let indices = self.records.read().expect("lock poisoned");
        let index = indices
            .get(patient)
            .ok_or(LedgerError::UnknownIdentity(*patient))?;
        let result = Ok(index.lock().expect("lock poisoned").clone());
        result
    }

    fn authorized_doctors(&self, patient: &ActorId) -> Result<Vec<ActorId>, LedgerError> {
        self.require_role(patient, Role::Patient)?;
        let capabilities = self.capabilities.read().expect("lock poisoned");
        Ok(capabilities
            .by_patient
            .get(patient)
            .map(|grants| {
                grants
                    .iter()
                    .filter(|g| g.state.is_active())
                    .map(|g| g.doctor)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn granted_patients(&self, doctor: &ActorId) -> Result<Vec<ActorId>, LedgerError> {
        self.require_role(doctor, Role::Doctor)?;
        let capabilities = self.capabilities.read().expect("lock poisoned");
        let patients = match capabilities.by_doctor.get(doctor) {
            Some(patients) => patients,
            None => return Ok(Vec::new()),
        };
        Ok(patients
            .iter()
            .filter(|patient| {
                capabilities
                    .by_patient
                    .get(patient)
                    .and_then(|grants| grants.iter().find(|g| g.doctor == *doctor))
                    .map(|g| g.state.is_active())
                    .unwrap_or(false)
            })
            .copied()
            .collect())
    }
}

impl LedgerWriter for InMemoryLedger {
    fn register_identity(
        &self,
        id: ActorId,
        role: Role,
        profile: ContentId,
    ) -> Result<(), LedgerError> {
        let mut identities = self.identities.write().expect("lock poisoned");
        if identities.contains_key(&id) {
            return Err(LedgerError::DuplicateRegistration(id));
        }
        identities.insert(id, IdentityEntry { role, profile });
        drop(identities);

        if role == Role::Patient {
            let mut indices = self.records.write().expect("lock poisoned");
            indices.insert(id, Arc::new(Mutex::new(Vec::new())));
        }

        debug!(actor = %id, %role, "identity registered");
        Ok(())
    }

    fn grant_access(
        &self,
        patient: &ActorId,
        doctor: &ActorId,
    ) -> Result<CapabilityState, LedgerError> {
        self.require_role(patient, Role::Patient)?;
        self.require_role(doctor, Role::Doctor)?;

        let mut capabilities = self.capabilities.write().expect("lock poisoned");
        let grants = capabilities.by_patient.entry(*patient).or_default();
        match grants.iter_mut().find(|g| g.doctor == *doctor) {
            Some(grant) => {
                // Idempotent: re-granting keeps the original position.
                grant.state = CapabilityState::Active;
            }
            None => {
                grants.push(Grant {
                    doctor: *doctor,
                    state: CapabilityState::Active,
                });
                let patients = capabilities.by_doctor.entry(*doctor).or_default();
                if !patients.contains(patient) {
                    patients.push(*patient);
                }
            }
        }

        debug!(patient = %patient, doctor = %doctor, "access granted");
        Ok(CapabilityState::Active)
    }

    fn revoke_access(
        &self,
        patient: &ActorId,
        doctor: &ActorId,
    ) -> Result<CapabilityState, LedgerError> {
        self.require_role(patient, Role::Patient)?;
        self.require_role(doctor, Role::Doctor)?;

        let mut capabilities = self.capabilities.write().expect("lock poisoned");
        if let Some(grant) = capabilities
            .by_patient
            .get_mut(patient)
            .and_then(|grants| grants.iter_mut().find(|g| g.doctor == *doctor))
        {
            grant.state = CapabilityState::Revoked;
        }
        // Revoking a never-granted pair is a no-op, not an error.

        debug!(patient = %patient, doctor = %doctor, "access revoked");
        Ok(CapabilityState::Revoked)
    }

    fn append_record(
        &self,
        caller: &ActorId,
        patient: &ActorId,
        hash: ContentId,
    ) -> Result<(), LedgerError> {
        self.require_role(patient, Role::Patient)?;

        if caller != patient && !self.check_access(patient, caller) {
            return Err(LedgerError::Authorization {
                reason: format!("{caller} holds no active capability from {patient}"),
            });
        }

        // Clone the index handle out of the map so the map lock is not
        // held across the append; same-patient appends serialize on the
        // per-patient mutex only.
        let index = {
            let indices = self.records.read().expect("lock poisoned");
            indices
                .get(patient)
                .cloned()
                .ok_or(LedgerError::UnknownIdentity(*patient))?
        };
        index.lock().expect("lock poisoned").push(hash);

        debug!(patient = %patient, caller = %caller, record = %hash.short_hex(), "record appended");
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedger")
            .field("identity_count", &self.identity_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_hash(tag: &[u8]) -> ContentId {
        ContentId::from_bytes(tag)
    }

    fn registered_pair(ledger: &InMemoryLedger) -> (ActorId, ActorId) {
        let patient = ActorId::ephemeral();
        let doctor = ActorId::ephemeral();
        ledger
            .register_identity(patient, Role::Patient, profile_hash(b"patient"))
            .unwrap();
        ledger
            .register_identity(doctor, Role::Doctor, profile_hash(b"doctor"))
            .unwrap();
        (patient, doctor)
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    #[test]
    fn register_binds_role_and_profile() {
        let ledger = InMemoryLedger::new();
        let id = ActorId::ephemeral();
        let profile = profile_hash(b"profile");
        ledger.register_identity(id, Role::Patient, profile).unwrap();

        assert_eq!(ledger.role_of(&id), Some(Role::Patient));
        assert!(ledger.is_registered(&id));
        assert_eq!(ledger.profile_of(&id).unwrap(), profile);
    }

    #[test]
    fn duplicate_registration_fails() {
        let ledger = InMemoryLedger::new();
        let id = ActorId::ephemeral();
        ledger
            .register_identity(id, Role::Patient, profile_hash(b"first"))
            .unwrap();

        let err = ledger
            .register_identity(id, Role::Patient, profile_hash(b"again"))
            .unwrap_err();
        assert_eq!(err, LedgerError::DuplicateRegistration(id));

        // A role switch attempt is still a duplicate.
        let err = ledger
            .register_identity(id, Role::Doctor, profile_hash(b"switch"))
            .unwrap_err();
        assert_eq!(err, LedgerError::DuplicateRegistration(id));
        assert_eq!(ledger.role_of(&id), Some(Role::Patient));
    }

    #[test]
    fn unregistered_identity_lookups() {
        let ledger = InMemoryLedger::new();
        let id = ActorId::ephemeral();
        assert_eq!(ledger.role_of(&id), None);
        assert!(!ledger.is_registered(&id));
        assert_eq!(ledger.profile_of(&id), Err(LedgerError::UnknownIdentity(id)));
        assert_eq!(ledger.records(&id), Err(LedgerError::UnknownIdentity(id)));
    }

    // -----------------------------------------------------------------------
    // Capabilities
    // -----------------------------------------------------------------------

    #[test]
    fn grant_activates_capability() {
        let ledger = InMemoryLedger::new();
        let (patient, doctor) = registered_pair(&ledger);

        assert!(!ledger.check_access(&patient, &doctor));
        let state = ledger.grant_access(&patient, &doctor).unwrap();
        assert_eq!(state, CapabilityState::Active);
        assert!(ledger.check_access(&patient, &doctor));
    }

    #[test]
    fn grant_is_idempotent() {
        let ledger = InMemoryLedger::new();
        let (patient, doctor) = registered_pair(&ledger);

        ledger.grant_access(&patient, &doctor).unwrap();
        ledger.grant_access(&patient, &doctor).unwrap();
        assert_eq!(ledger.authorized_doctors(&patient).unwrap(), vec![doctor]);
    }

    #[test]
    fn revoke_deactivates_capability() {
        let ledger = InMemoryLedger::new();
        let (patient, doctor) = registered_pair(&ledger);

        ledger.grant_access(&patient, &doctor).unwrap();
        let state = ledger.revoke_access(&patient, &doctor).unwrap();
        assert_eq!(state, CapabilityState::Revoked);
        assert!(!ledger.check_access(&patient, &doctor));
    }

    #[test]
    fn revoke_without_grant_is_noop() {
        let ledger = InMemoryLedger::new();
        let (patient, doctor) = registered_pair(&ledger);

        let state = ledger.revoke_access(&patient, &doctor).unwrap();
        assert_eq!(state, CapabilityState::Revoked);
        assert!(!ledger.check_access(&patient, &doctor));
    }

    #[test]
    fn grant_requires_registered_patient_and_doctor() {
        let ledger = InMemoryLedger::new();
        let (patient, doctor) = registered_pair(&ledger);
        let stranger = ActorId::ephemeral();

        assert_eq!(
            ledger.grant_access(&stranger, &doctor),
            Err(LedgerError::UnknownIdentity(stranger))
        );
        assert_eq!(
            ledger.grant_access(&patient, &stranger),
            Err(LedgerError::UnknownIdentity(stranger))
        );
    }

    #[test]
    fn grant_enforces_roles() {
        let ledger = InMemoryLedger::new();
        let (patient, doctor) = registered_pair(&ledger);
        let (other_patient, _) = registered_pair(&ledger);

        // A doctor cannot act as grantor.
        let err = ledger.grant_access(&doctor, &patient).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::RoleMismatch {
                expected: Role::Patient,
                ..
            }
        ));

        // A patient cannot be a grantee.
        let err = ledger.grant_access(&patient, &other_patient).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::RoleMismatch {
                expected: Role::Doctor,
                ..
            }
        ));
    }

    #[test]
    fn regrant_keeps_first_grant_position() {
        let ledger = InMemoryLedger::new();
        let patient = ActorId::ephemeral();
        ledger
            .register_identity(patient, Role::Patient, profile_hash(b"p"))
            .unwrap();
        let doc_a = ActorId::ephemeral();
        let doc_b = ActorId::ephemeral();
        ledger.register_identity(doc_a, Role::Doctor, profile_hash(b"a")).unwrap();
        ledger.register_identity(doc_b, Role::Doctor, profile_hash(b"b")).unwrap();

        ledger.grant_access(&patient, &doc_a).unwrap();
        ledger.grant_access(&patient, &doc_b).unwrap();
        ledger.revoke_access(&patient, &doc_a).unwrap();
        ledger.grant_access(&patient, &doc_a).unwrap();

        // doc_a keeps its original (first) position.
        assert_eq!(
            ledger.authorized_doctors(&patient).unwrap(),
            vec![doc_a, doc_b]
        );
    }

    #[test]
    fn relation_listings_follow_grant_order() {
        let ledger = InMemoryLedger::new();
        let doctor = ActorId::ephemeral();
        ledger.register_identity(doctor, Role::Doctor, profile_hash(b"d")).unwrap();

        let mut patients = Vec::new();
        for i in 0..4u8 {
            let patient = ActorId::ephemeral();
            ledger
                .register_identity(patient, Role::Patient, profile_hash(&[i]))
                .unwrap();
            ledger.grant_access(&patient, &doctor).unwrap();
            patients.push(patient);
        }
        ledger.revoke_access(&patients[1], &doctor).unwrap();

        let granted = ledger.granted_patients(&doctor).unwrap();
        assert_eq!(granted, vec![patients[0], patients[2], patients[3]]);
    }

    // -----------------------------------------------------------------------
    // Record index
    // -----------------------------------------------------------------------

    #[test]
    fn patient_appends_own_records_in_order() {
        let ledger = InMemoryLedger::new();
        let (patient, _) = registered_pair(&ledger);

        let h1 = ContentId::from_bytes(b"r1");
        let h2 = ContentId::from_bytes(b"r2");
        ledger.append_record(&patient, &patient, h1).unwrap();
        ledger.append_record(&patient, &patient, h2).unwrap();

        assert_eq!(ledger.records(&patient).unwrap(), vec![h1, h2]);
    }

    #[test]
    fn authorized_doctor_appends() {
        let ledger = InMemoryLedger::new();
        let (patient, doctor) = registered_pair(&ledger);
        ledger.grant_access(&patient, &doctor).unwrap();

        let hash = ContentId::from_bytes(b"doctor note");
        ledger.append_record(&doctor, &patient, hash).unwrap();
        assert_eq!(ledger.records(&patient).unwrap(), vec![hash]);
    }

    #[test]
    fn unauthorized_doctor_append_fails() {
        let ledger = InMemoryLedger::new();
        let (patient, doctor) = registered_pair(&ledger);

        let err = ledger
            .append_record(&doctor, &patient, ContentId::from_bytes(b"nope"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Authorization { .. }));
        assert!(ledger.records(&patient).unwrap().is_empty());
    }

    #[test]
    fn revocation_blocks_further_appends() {
        let ledger = InMemoryLedger::new();
        let (patient, doctor) = registered_pair(&ledger);
        ledger.grant_access(&patient, &doctor).unwrap();

        let hash = ContentId::from_bytes(b"while authorized");
        ledger.append_record(&doctor, &patient, hash).unwrap();

        ledger.revoke_access(&patient, &doctor).unwrap();
        let err = ledger
            .append_record(&doctor, &patient, ContentId::from_bytes(b"after revoke"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Authorization { .. }));

        // Existing records are untouched by revocation.
        assert_eq!(ledger.records(&patient).unwrap(), vec![hash]);
    }

    #[test]
    fn append_to_doctor_index_is_role_mismatch() {
        let ledger = InMemoryLedger::new();
        let (_, doctor) = registered_pair(&ledger);

        let err = ledger
            .append_record(&doctor, &doctor, ContentId::from_bytes(b"x"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::RoleMismatch { .. }));
    }

    #[test]
    fn concurrent_appends_lose_nothing() {
        use std::thread;

        let ledger = Arc::new(InMemoryLedger::new());
        let (patient, doctor) = registered_pair(&ledger);
        ledger.grant_access(&patient, &doctor).unwrap();

        const PER_WRITER: usize = 50;
        let writers = [patient, doctor];
        let handles: Vec<_> = writers
            .iter()
            .enumerate()
            .map(|(w, caller)| {
                let ledger = Arc::clone(&ledger);
                let caller = *caller;
                thread::spawn(move || {
                    for i in 0..PER_WRITER {
                        let hash = ContentId::from_bytes(format!("{w}:{i}").as_bytes());
                        ledger.append_record(&caller, &patient, hash).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("writer thread should not panic");
        }

        let records = ledger.records(&patient).unwrap();
        assert_eq!(records.len(), 2 * PER_WRITER);

        // Each writer's own appends appear in its issue order.
        for w in 0..writers.len() {
            let expected: Vec<ContentId> = (0..PER_WRITER)
                .map(|i| ContentId::from_bytes(format!("{w}:{i}").as_bytes()))
                .collect();
            let observed: Vec<ContentId> = records
                .iter()
                .filter(|h| expected.contains(h))
                .copied()
                .collect();
            assert_eq!(observed, expected);
        }
    }

    #[test]
    fn cross_patient_appends_are_independent() {
        use std::thread;

        let ledger = Arc::new(InMemoryLedger::new());
        let (patient_a, _) = registered_pair(&ledger);
        let (patient_b, _) = registered_pair(&ledger);

        let handles: Vec<_> = [patient_a, patient_b]
            .iter()
            .map(|patient| {
                let ledger = Arc::clone(&ledger);
                let patient = *patient;
                thread::spawn(move || {
                    for i in 0..25u32 {
                        let hash = ContentId::from_bytes(&i.to_le_bytes());
                        ledger.append_record(&patient, &patient, hash).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("writer thread should not panic");
        }

        assert_eq!(ledger.records(&patient_a).unwrap().len(), 25);
        assert_eq!(ledger.records(&patient_b).unwrap().len(), 25);
    }
}
