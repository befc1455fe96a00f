//! Foundation types for the Clinical Record Ledger (CRL).
//!
//! This crate provides the identity, addressing, and payload types used
//! throughout the CRL system. Every other CRL crate depends on `crl-types`.
//!
//! # Key Types
//!
//! - [`ActorId`] — Persistent identity derived from key material
//! - [`ContentId`] — Content-addressed identifier (BLAKE3 hash)
//! - [`Role`] — Patient or Doctor, bound once at registration
//! - [`CapabilityState`] — Active or Revoked access relation
//! - [`RecordPayload`] — A medical record as stored in the content store
//! - [`PatientProfile`] / [`DoctorProfile`] — Identity metadata payloads

pub mod actor;
pub mod content;
pub mod error;
pub mod profile;
pub mod record;

pub use actor::{ActorId, CapabilityState, Role};
pub use content::ContentId;
pub use error::TypeError;
pub use profile::{DoctorProfile, PatientProfile};
pub use record::{DocumentMeta, PointerWrapper, RecordKind, RecordPayload};
