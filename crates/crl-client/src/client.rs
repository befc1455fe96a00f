use std::sync::Arc;

use chrono::{DateTime, Utc};
use crl_gate::{AccessGate, AccessRequest, GateContext, Operation, RequestState};
use crl_ledger::{LedgerReader, LedgerWriter};
use crl_resolver::Resolver;
use crl_store::ContentStore;
use crl_types::{
    ActorId, CapabilityState, ContentId, DoctorProfile, DocumentMeta, PatientProfile,
    RecordPayload, Role,
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::aggregator::{Aggregator, BatchOutcome};
use crate::error::{ClientError, ClientResult};
use crate::session::Session;

/// A related identity together with its resolved profile.
#[derive(Clone, Debug)]
pub struct ActorListing<P> {
    pub actor: ActorId,
    pub profile: P,
}

pub type DoctorListing = ActorListing<DoctorProfile>;
pub type PatientListing = ActorListing<PatientProfile>;

/// The vault: gated access to the record ledger and the content store.
///
/// Every operation is authorized by the gate before it reaches the
/// ledger or the resolver. Write operations upload content first, then
/// update the ledger index; read operations fetch the hash list from
/// the ledger and batch-resolve it.
pub struct Vault<L> {
    ledger: Arc<L>,
    store: Arc<ContentStore>,
    resolver: Resolver,
    aggregator: Aggregator,
    gate: AccessGate,
}

impl<L: LedgerReader + LedgerWriter> Vault<L> {
    pub fn new(
        ledger: Arc<L>,
        store: Arc<ContentStore>,
        resolver: Resolver,
        gate: AccessGate,
    ) -> Self {
        let aggregator = Aggregator::new(resolver.clone());
        Self {
            ledger,
            store,
            resolver,
            aggregator,
            gate,
        }
    }

    /// The underlying ledger (for embedding and tests).
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// The underlying content store.
    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    // ---- Authorization ----

    /// Assemble the gate context for a request from ledger reads.
    fn context_for(&self, request: &AccessRequest) -> GateContext {
        let patient = request.operation.patient_scope(&request.caller);
        GateContext {
            caller_role: self.ledger.role_of(&request.caller),
            patient_role: patient.and_then(|p| self.ledger.role_of(&p)),
            grantee_role: request
                .operation
                .grantee()
                .and_then(|g| self.ledger.role_of(&g)),
            has_active_grant: patient
                .map(|p| self.ledger.check_access(&p, &request.caller))
                .unwrap_or(false),
            previous_stages: Vec::new(),
        }
    }

    fn authorize(&self, session: &Session, operation: Operation) -> ClientResult<()> {
        let request = AccessRequest::new(session.actor(), operation);
        let mut context = self.context_for(&request);
        let result = self.gate.evaluate(&request, &mut context)?;
        match result.state {
            RequestState::Denied { reason } => Err(ClientError::Denied { reason }),
            _ => Ok(()),
        }
    }

    // ---- Registration (one-time, ungated) ----

    /// Upload a patient profile and bind the session's identity to it.
    pub async fn register_patient(
        &self,
        session: &Session,
        profile: &PatientProfile,
    ) -> ClientResult<ContentId> {
        let hash = self.store.put_json(profile).await?;
        self.ledger
            .register_identity(session.actor(), Role::Patient, hash)?;
        debug!(actor = %session.actor(), profile = %hash.short_hex(), "patient registered");
        Ok(hash)
    }

    /// Upload a doctor profile and bind the session's identity to it.
    pub async fn register_doctor(
        &self,
        session: &Session,
        profile: &DoctorProfile,
    ) -> ClientResult<ContentId> {
        let hash = self.store.put_json(profile).await?;
        self.ledger
            .register_identity(session.actor(), Role::Doctor, hash)?;
        debug!(actor = %session.actor(), profile = %hash.short_hex(), "doctor registered");
        Ok(hash)
    }

    // ---- Capability management ----

    /// Grant a doctor access to the session patient's records.
    pub fn grant_access(&self, session: &Session, doctor: ActorId) -> ClientResult<CapabilityState> {
        self.authorize(session, Operation::GrantAccess { doctor })?;
        Ok(self.ledger.grant_access(&session.actor(), &doctor)?)
    }

    /// Revoke a doctor's access to the session patient's records.
    pub fn revoke_access(
        &self,
        session: &Session,
        doctor: ActorId,
    ) -> ClientResult<CapabilityState> {
        self.authorize(session, Operation::RevokeAccess { doctor })?;
        Ok(self.ledger.revoke_access(&session.actor(), &doctor)?)
    }

    /// Whether an Active capability (patient → doctor) exists. Open read.
    pub fn check_access(&self, patient: &ActorId, doctor: &ActorId) -> bool {
        self.ledger.check_access(patient, doctor)
    }

    // ---- Record writes ----

    /// Upload a record payload and append its hash to the patient's
    /// index.
    pub async fn add_record(
        &self,
        session: &Session,
        patient: ActorId,
        record: &RecordPayload,
    ) -> ClientResult<ContentId> {
        self.authorize(session, Operation::AppendRecord { patient })?;
        let hash = self.store.put_json(record).await?;
        self.ledger.append_record(&session.actor(), &patient, hash)?;
        Ok(hash)
    }

    /// Append an already-uploaded content hash to the patient's index
    /// (content uploaded out-of-band, possibly a pointer wrapper).
    pub fn append_record_hash(
        &self,
        session: &Session,
        patient: ActorId,
        hash: ContentId,
    ) -> ClientResult<()> {
        self.authorize(session, Operation::AppendRecord { patient })?;
        self.ledger.append_record(&session.actor(), &patient, hash)?;
        Ok(())
    }

    /// Upload a document: the raw file first, then a metadata record
    /// referencing the file's hash.
    #[allow(clippy::too_many_arguments)]
    pub async fn add_document(
        &self,
        session: &Session,
        patient: ActorId,
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
        description: impl Into<String>,
        date: DateTime<Utc>,
    ) -> ClientResult<ContentId> {
        self.authorize(session, Operation::AppendRecord { patient })?;

        let file_hash = self.store.put_bytes(&bytes).await?;
        let meta = DocumentMeta {
            file_name: file_name.into(),
            file_size: bytes.len() as u64,
            media_type: media_type.into(),
            file_hash,
        };
        let record = RecordPayload::document(patient, description, date, meta);
        let hash = self.store.put_json(&record).await?;
        self.ledger.append_record(&session.actor(), &patient, hash)?;
        Ok(hash)
    }

    // ---- Record reads ----

    /// Resolve the patient's full record index.
    pub async fn patient_records(
        &self,
        session: &Session,
        patient: ActorId,
    ) -> ClientResult<BatchOutcome<RecordPayload>> {
        self.authorize(session, Operation::ReadRecords { patient })?;
        let hashes = self.ledger.records(&patient)?;
        Ok(self.aggregator.decode_batch(&hashes).await)
    }

    /// Fetch the raw bytes of a document file belonging to a patient.
    pub async fn document_bytes(
        &self,
        session: &Session,
        patient: ActorId,
        file_hash: ContentId,
    ) -> ClientResult<Vec<u8>> {
        self.authorize(session, Operation::ReadRecords { patient })?;
        Ok(self.store.get(&file_hash).await?)
    }

    // ---- Relation reads ----

    /// Doctors holding an Active capability from the patient, with
    /// their profiles resolved. Scoped like a record read.
    pub async fn authorized_doctors(
        &self,
        session: &Session,
        patient: ActorId,
    ) -> ClientResult<BatchOutcome<DoctorListing>> {
        self.authorize(session, Operation::ReadRecords { patient })?;
        let doctors = self.ledger.authorized_doctors(&patient)?;
        Ok(self.profile_listings(doctors).await)
    }

    /// Patients granting the session doctor an Active capability, with
    /// their profiles resolved.
    pub async fn doctor_patients(
        &self,
        session: &Session,
    ) -> ClientResult<BatchOutcome<PatientListing>> {
        self.authorize(session, Operation::ReadRoster)?;
        let patients = self.ledger.granted_patients(&session.actor())?;
        Ok(self.profile_listings(patients).await)
    }

    /// Resolve profiles for a list of related identities, preserving
    /// relation order. Identities whose profile cannot be resolved or
    /// decoded are dropped and counted.
    async fn profile_listings<P: DeserializeOwned>(
        &self,
        actors: Vec<ActorId>,
    ) -> BatchOutcome<ActorListing<P>> {
        let total = actors.len();
        let mut failed = 0;
        let mut resolvable: Vec<(ActorId, ContentId)> = Vec::with_capacity(actors.len());
        for actor in actors {
            match self.ledger.profile_of(&actor) {
                Ok(hash) => resolvable.push((actor, hash)),
                Err(e) => {
                    warn!(actor = %actor, error = %e, "listed identity has no profile");
                    failed += 1;
                }
            }
        }

        let ids: Vec<ContentId> = resolvable.iter().map(|(_, hash)| *hash).collect();
        let resolved = self.resolver.resolve_all(&ids).await;

        let mut items = Vec::with_capacity(resolvable.len());
        for ((actor, _), content) in resolvable.into_iter().zip(resolved) {
            match content.map(|c| c.decode::<P>()) {
                Some(Ok(profile)) => items.push(ActorListing { actor, profile }),
                Some(Err(e)) => {
                    warn!(actor = %actor, error = %e, "profile failed to decode");
                    failed += 1;
                }
                None => failed += 1,
            }
        }
        if failed > 0 {
            warn!(failed, total, "relation listing resolved with failures");
        }
        BatchOutcome {
            items,
            failed,
            total,
        }
    }
}

impl<L> std::fmt::Debug for Vault<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("store", &self.store)
            .field("resolver", &self.resolver)
            .finish()
    }
}
