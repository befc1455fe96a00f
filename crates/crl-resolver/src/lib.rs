//! Content resolution for the Clinical Record Ledger.
//!
//! The store hands back raw bytes; this crate turns a content hash into
//! materialized content. Stored objects may be **pointer wrappers** — a
//! JSON object whose `data` field is another content hash — so resolution
//! follows indirections until it reaches real content, under a fixed
//! depth bound and a cycle check.
//!
//! Batch resolution ([`Resolver::resolve_all`]) fans out concurrently
//! under a permit limit and is partial-failure tolerant: a failing item
//! becomes `None` at its position instead of aborting the batch, and the
//! output order is positional regardless of completion order.

pub mod content;
pub mod error;
pub mod resolver;

pub use content::{pointer_target, Content};
pub use error::{ResolveError, ResolveResult};
pub use resolver::{Resolver, ResolverConfig};
