use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::content::ContentId;

/// The kind of medical record a payload represents.
///
/// Wire values match the original record format (`"self-reported"`,
/// `"doctor-reported"`, `"document"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    #[serde(rename = "self-reported")]
    SelfReported,
    #[serde(rename = "doctor-reported")]
    DoctorReported,
    #[serde(rename = "document")]
    Document,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfReported => write!(f, "self-reported"),
            Self::DoctorReported => write!(f, "doctor-reported"),
            Self::Document => write!(f, "document"),
        }
    }
}

/// File metadata carried by document records.
///
/// The document's raw bytes are a separate content object; `file_hash`
/// addresses them and is distinct from the hash of the record payload
/// that carries this metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "fileSize")]
    pub file_size: u64,
    #[serde(rename = "fileType")]
    pub media_type: String,
    #[serde(rename = "fileHash")]
    pub file_hash: ContentId,
}

/// A medical record payload as stored in the content store.
///
/// Serialized as JSON with the original wire field names; the ledger
/// holds only the payload's content hash.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordPayload {
    #[serde(rename = "recordType")]
    pub kind: RecordKind,
    /// Free-text body (or document description for document records).
    pub text: String,
    pub date: DateTime<Utc>,
    pub patient: ActorId,
    #[serde(flatten)]
    pub document: Option<DocumentMeta>,
}

impl RecordPayload {
    /// A record the patient reported about themselves.
    pub fn self_reported(patient: ActorId, text: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            kind: RecordKind::SelfReported,
            text: text.into(),
            date,
            patient,
            document: None,
        }
    }

    /// A record entered by a treating doctor.
    pub fn doctor_reported(patient: ActorId, text: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            kind: RecordKind::DoctorReported,
            text: text.into(),
            date,
            patient,
            document: None,
        }
    }

    /// A record describing an uploaded document.
    pub fn document(
        patient: ActorId,
        description: impl Into<String>,
        date: DateTime<Utc>,
        meta: DocumentMeta,
    ) -> Self {
        Self {
            kind: RecordKind::Document,
            text: description.into(),
            date,
            patient,
            document: Some(meta),
        }
    }

    /// Returns `true` if this record carries document metadata.
    pub fn is_document(&self) -> bool {
        self.document.is_some()
    }
}

/// A stored object whose payload is itself another content hash.
///
/// Wrappers arise when a record was uploaded as an indirection; the
/// resolver follows `data` to the actual content instead of returning
/// the wrapper.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerWrapper {
    pub data: ContentId,
}

impl PointerWrapper {
    pub fn new(target: ContentId) -> Self {
        Self { data: target }
    }
}
