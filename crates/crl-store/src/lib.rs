//! Content-addressed storage for the Clinical Record Ledger.
//!
//! Content objects — record payloads, profiles, raw document bytes — are
//! immutable and keyed solely by the BLAKE3 hash of their bytes. Objects
//! live on external gateway backends; this crate provides the
//! [`ContentStore`] that reaches them with ordered fallback.
//!
//! # Backends
//!
//! All backends implement the [`ContentBackend`] trait:
//!
//! - [`InMemoryBackend`] — `HashMap`-based backend for tests and embedding
//! - [`HttpGateway`] — REST gateway keyed by content hash
//!
//! # Design Rules
//!
//! 1. Objects are immutable once stored (content-addressing guarantees this).
//! 2. `put` is deterministic and idempotent: identical bytes always yield
//!    the identical id, and re-uploading is a no-op.
//! 3. `get` tries backends in configured priority order; each attempt has
//!    an independent timeout, and a backend's retry budget is exhausted
//!    before advancing — never a global abort.
//! 4. Fetched bytes are verified against the requested hash; a body that
//!    does not re-hash counts as a backend failure.
//! 5. The store never interprets object contents — it is a pure key-value
//!    store. Pointer following belongs to the resolver.
//! 6. `NotFound` surfaces only after every configured backend is exhausted.

pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod store;

pub use backend::{BackendError, ContentBackend};
pub use config::{GatewayConfig, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use gateway::HttpGateway;
pub use memory::InMemoryBackend;
pub use store::ContentStore;
