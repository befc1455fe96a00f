//! High-level client for the Clinical Record Ledger.
//!
//! [`Vault`] is the composition root: every read and write is authorized
//! by the access gate before it touches the ledger, the content store,
//! or the resolver. Batched reads go through the [`Aggregator`], the
//! only component permitted to fan out unbounded hash lists (under the
//! resolver's permit limit).
//!
//! Requests carry an explicit [`Session`] — there is no process-wide
//! account state. The external identity-signing collaborator surfaces
//! "current identity changed" through [`IdentityWatch`].

pub mod aggregator;
pub mod client;
pub mod error;
pub mod session;

pub use aggregator::{Aggregator, BatchOutcome};
pub use client::{ActorListing, DoctorListing, PatientListing, Vault};
pub use error::{ClientError, ClientResult};
pub use session::{IdentityWatch, Session};
