//! Content hashing for the Clinical Record Ledger.
//!
//! Provides the domain-separated BLAKE3 hasher that turns bytes into
//! `ContentId`s. All stored content — record payloads, profiles, raw
//! document bytes — is addressed through [`ContentHasher::CONTENT`], so
//! `put` is deterministic regardless of which upload variant produced the
//! bytes.

pub mod hasher;

pub use hasher::{ContentHasher, HasherError};
