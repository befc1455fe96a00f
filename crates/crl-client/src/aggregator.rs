use crl_resolver::{Content, Resolver};
use crl_types::ContentId;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Result of a batched resolution: the items that resolved, in input
/// order, plus an out-of-band failure count for observability.
///
/// A failing item is dropped from `items` rather than aborting the
/// batch; `failed` records how many were dropped.
#[derive(Clone, Debug)]
pub struct BatchOutcome<T> {
    /// Successfully resolved items, preserving input order.
    pub items: Vec<T>,
    /// Number of input positions that failed to resolve or decode.
    pub failed: usize,
    /// Number of input positions requested.
    pub total: usize,
}

impl<T> BatchOutcome<T> {
    /// Returns `true` if every requested item resolved.
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Batched, concurrent resolution of hash lists.
///
/// This is the only component permitted to issue unbounded-fan-out
/// reads; concurrency is bounded by the resolver's permit limit so a
/// patient with many records cannot overwhelm the backends.
pub struct Aggregator {
    resolver: Resolver,
}

impl Aggregator {
    pub fn new(resolver: Resolver) -> Self {
        Self { resolver }
    }

    /// Resolve a hash list to raw content.
    pub async fn resolve_batch(&self, ids: &[ContentId]) -> BatchOutcome<Content> {
        let total = ids.len();
        let resolved = self.resolver.resolve_all(ids).await;
        let items: Vec<Content> = resolved.into_iter().flatten().collect();
        let failed = total - items.len();
        if failed > 0 {
            warn!(failed, total, "batch resolved with failures");
        }
        BatchOutcome {
            items,
            failed,
            total,
        }
    }

    /// Resolve a hash list and decode each item into `T`.
    ///
    /// Items that resolve but fail to decode count toward `failed` too.
    pub async fn decode_batch<T: DeserializeOwned>(&self, ids: &[ContentId]) -> BatchOutcome<T> {
        let batch = self.resolve_batch(ids).await;
        let total = batch.total;
        let mut failed = batch.failed;
        let mut items = Vec::with_capacity(batch.items.len());
        for content in batch.items {
            match content.decode::<T>() {
                Ok(item) => items.push(item),
                Err(e) => {
                    warn!(id = %content.id.short_hex(), error = %e, "batch item failed to decode");
                    failed += 1;
                }
            }
        }
        BatchOutcome {
            items,
            failed,
            total,
        }
    }
}
