use serde::{Deserialize, Serialize};

/// Identity metadata for a registered patient.
///
/// Stored as a content object; the ledger holds only its hash, keyed by
/// the patient's [`crate::ActorId`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub name: String,
    pub age: u32,
    pub gender: String,
}

/// Identity metadata for a registered doctor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub specialization: String,
}
