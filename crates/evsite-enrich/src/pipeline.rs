//! The site enrichment pipeline.
//!
//! Fans out one coordinate to every registered provider, absorbs each
//! provider's failure as data, and merges the results with the local power
//! sizing and grid transform into one immutable [`SiteRecord`]. Field
//! ownership is disjoint by provider category, so the merge is a plain map
//! insert with no conflict policy.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use evsite_core::{AppConfig, Coordinate};

use crate::cache::{CacheKey, LookupCache, MemoryCache};
use crate::error::AdapterError;
use crate::pacing::AdaptivePacer;
use crate::providers::{default_providers, LookupProvider};
use crate::record::{SiteRecord, SiteRequest};
use crate::types::{LookupOutcome, ProviderKind};

/// One element of a batch: either a validated request or the reason the row
/// could not be parsed. Malformed rows flow through the batch as annotated
/// records so output stays aligned with input.
#[derive(Debug)]
pub enum BatchItem {
    Request(SiteRequest),
    Malformed(String),
}

/// Message recorded on rows skipped after a cancellation request.
const CANCELLED_ROW: &str = "cancelled before processing";

/// The enrichment pipeline: a provider registry, an optional read-through
/// cache, and per-provider pacing state for batch runs.
pub struct Enricher {
    providers: Vec<Arc<dyn LookupProvider>>,
    cache: Option<Arc<dyn LookupCache>>,
    cache_precision: u8,
    pacer: AdaptivePacer,
}

impl Enricher {
    /// A pipeline over the given providers, with no cache and default pacing.
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn LookupProvider>>) -> Self {
        Self {
            providers,
            cache: None,
            cache_precision: 4,
            pacer: AdaptivePacer::new(250, 8000),
        }
    }

    /// The production pipeline: default provider registry for the
    /// configuration, a session-scoped memory cache, and configured pacing.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] if the HTTP client cannot be built or a
    /// configured base URL does not parse.
    pub fn from_config(config: &AppConfig) -> Result<Self, AdapterError> {
        Ok(Self {
            providers: default_providers(config)?,
            cache: Some(Arc::new(MemoryCache::new())),
            cache_precision: config.cache_precision,
            pacer: AdaptivePacer::new(config.pacing_base_ms, config.pacing_max_ms),
        })
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn LookupCache>, precision: u8) -> Self {
        self.cache = Some(cache);
        self.cache_precision = precision;
        self
    }

    #[must_use]
    pub fn with_pacing(mut self, base_ms: u64, max_ms: u64) -> Self {
        self.pacer = AdaptivePacer::new(base_ms, max_ms);
        self
    }

    /// Enriches one site.
    ///
    /// Always returns a record: the power figure and grid reference are
    /// local computations, and every provider failure is captured as an
    /// [`LookupOutcome::Unavailable`] entry instead of propagating. All
    /// provider calls run concurrently, so latency is bounded by the slowest
    /// provider rather than the sum.
    pub async fn process(&self, request: &SiteRequest) -> SiteRecord {
        let lookups = self
            .providers
            .iter()
            .map(|provider| self.lookup_one(provider.as_ref(), request.coordinate));
        let outcomes = futures::future::join_all(lookups).await;
        SiteRecord::enriched(request, outcomes.into_iter().collect::<BTreeMap<_, _>>())
    }

    /// Enriches a batch of rows sequentially, preserving input order.
    ///
    /// The returned vector always has the same length as `items`: malformed
    /// rows become records carrying their parse error, and rows after a
    /// cancellation request become records annotated as cancelled. Pacing
    /// delays (with rate-limit backoff) are observed between rows.
    pub async fn process_batch(
        &self,
        items: Vec<BatchItem>,
        cancel: &AtomicBool,
    ) -> Vec<SiteRecord> {
        let total = items.len();
        let mut records = Vec::with_capacity(total);
        let mut processed_any = false;

        for (index, item) in items.into_iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                records.push(SiteRecord::from_row_error(CANCELLED_ROW));
                continue;
            }
            match item {
                BatchItem::Malformed(message) => {
                    tracing::warn!(row = index + 1, error = %message, "skipping malformed row");
                    records.push(SiteRecord::from_row_error(message));
                }
                BatchItem::Request(request) => {
                    if processed_any {
                        self.pacer.pause().await;
                    }
                    tracing::debug!(row = index + 1, total, coordinate = %request.coordinate, "processing row");
                    records.push(self.process(&request).await);
                    processed_any = true;
                }
            }
        }

        records
    }

    async fn lookup_one(
        &self,
        provider: &dyn LookupProvider,
        coordinate: Coordinate,
    ) -> (ProviderKind, LookupOutcome) {
        let kind = provider.kind();
        let key = CacheKey::new(kind, coordinate.lat(), coordinate.lon(), self.cache_precision);

        if let Some(cache) = &self.cache {
            if let Some(data) = cache.get(&key) {
                tracing::debug!(provider = %kind, %coordinate, "cache hit");
                return (kind, LookupOutcome::Success { data });
            }
        }

        let outcome = match provider.lookup(coordinate).await {
            Ok(data) => {
                // Only successes are cached: a cached timeout would pin a
                // transient outage for the rest of the session.
                if let Some(cache) = &self.cache {
                    cache.put(key, data.clone());
                }
                LookupOutcome::Success { data }
            }
            Err(err) => {
                let reason = err.into_reason();
                tracing::warn!(
                    provider = %kind,
                    %coordinate,
                    reason = %reason.summary(),
                    "lookup unavailable"
                );
                LookupOutcome::Unavailable { reason }
            }
        };

        self.pacer.record(kind, &outcome);
        (kind, outcome)
    }
}
