//! Pipeline behavior tests using in-process fake providers with call
//! counters: failure isolation, cache behavior, and batch ordering.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;

use evsite_core::{ChargerConfig, ChargerMix, Coordinate};
use evsite_enrich::{
    AdapterError, BatchItem, Enricher, FailureReason, LookupProvider, MemoryCache, PostcodeInfo,
    ProviderKind, ProviderPayload, SiteRequest,
};

/// Scripted behavior for a fake provider.
enum Script {
    AlwaysSucceed,
    AlwaysFail(u16),
    FailFirstThenSucceed(u16),
}

struct FakeProvider {
    kind: ProviderKind,
    script: Script,
    calls: AtomicU32,
}

impl FakeProvider {
    fn new(kind: ProviderKind, script: Script) -> Arc<Self> {
        Arc::new(Self {
            kind,
            script,
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn payload(&self) -> ProviderPayload {
        ProviderPayload::Postcode(PostcodeInfo {
            postcode: format!("FAKE {}", self.kind),
            ward: None,
            district: None,
            region: None,
        })
    }
}

impl LookupProvider for FakeProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn lookup(
        &self,
        _coordinate: Coordinate,
    ) -> BoxFuture<'_, Result<ProviderPayload, AdapterError>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let result = match self.script {
            Script::AlwaysSucceed => Ok(self.payload()),
            Script::AlwaysFail(status) => Err(AdapterError::Status {
                status,
                url: "http://fake.test".to_string(),
            }),
            Script::FailFirstThenSucceed(status) => {
                if call == 0 {
                    Err(AdapterError::Status {
                        status,
                        url: "http://fake.test".to_string(),
                    })
                } else {
                    Ok(self.payload())
                }
            }
        };
        Box::pin(async move { result })
    }
}

fn request(lat: f64, lon: f64) -> SiteRequest {
    SiteRequest {
        coordinate: Coordinate::new(lat, lon).expect("valid test coordinate"),
        chargers: ChargerConfig::with_defaults(ChargerMix::new(2, 1, 1).expect("valid mix")),
    }
}

#[tokio::test]
async fn all_providers_failing_still_yields_a_full_record() {
    let postcode = FakeProvider::new(ProviderKind::Postcode, Script::AlwaysFail(500));
    let address = FakeProvider::new(ProviderKind::Address, Script::AlwaysFail(429));
    let enricher = Enricher::new(vec![
        postcode.clone() as Arc<dyn LookupProvider>,
        address.clone() as Arc<dyn LookupProvider>,
    ]);

    let record = enricher.process(&request(51.5074, -0.1278)).await;

    // Local computations survive total provider failure.
    assert_eq!(record.required_kva, Some(282.22));
    assert!(record.grid_ref.is_some());
    assert!(record.row_error.is_none());

    // Both failures are retained with their distinct reasons.
    assert_eq!(record.providers.len(), 2);
    assert_eq!(
        record.providers[&ProviderKind::Postcode].failure_reason(),
        Some(&FailureReason::Http { status: 500 })
    );
    assert_eq!(
        record.providers[&ProviderKind::Address].failure_reason(),
        Some(&FailureReason::Denied { status: 429 })
    );
}

#[tokio::test]
async fn one_failure_does_not_block_other_providers() {
    let failing = FakeProvider::new(ProviderKind::Traffic, Script::AlwaysFail(502));
    let healthy = FakeProvider::new(ProviderKind::Postcode, Script::AlwaysSucceed);
    let enricher = Enricher::new(vec![
        failing.clone() as Arc<dyn LookupProvider>,
        healthy.clone() as Arc<dyn LookupProvider>,
    ]);

    let record = enricher.process(&request(51.5074, -0.1278)).await;

    assert!(record.providers[&ProviderKind::Postcode].is_success());
    assert!(!record.providers[&ProviderKind::Traffic].is_success());
    assert_eq!(healthy.calls(), 1);
}

#[tokio::test]
async fn cache_prevents_repeat_lookups_for_equivalent_coordinates() {
    let provider = FakeProvider::new(ProviderKind::Postcode, Script::AlwaysSucceed);
    let enricher = Enricher::new(vec![provider.clone() as Arc<dyn LookupProvider>])
        .with_cache(Arc::new(MemoryCache::new()), 4);

    // Equal once rounded to four decimal places.
    let first = enricher.process(&request(51.507_400_1, -0.127_800_2)).await;
    let second = enricher.process(&request(51.507_399_9, -0.127_799_8)).await;

    assert_eq!(provider.calls(), 1, "second lookup should come from cache");
    assert_eq!(
        first.providers[&ProviderKind::Postcode],
        second.providers[&ProviderKind::Postcode]
    );
}

#[tokio::test]
async fn distinct_coordinates_miss_the_cache() {
    let provider = FakeProvider::new(ProviderKind::Postcode, Script::AlwaysSucceed);
    let enricher = Enricher::new(vec![provider.clone() as Arc<dyn LookupProvider>])
        .with_cache(Arc::new(MemoryCache::new()), 4);

    enricher.process(&request(51.5074, -0.1278)).await;
    enricher.process(&request(51.5075, -0.1278)).await;

    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn failures_are_not_cached() {
    let provider = FakeProvider::new(ProviderKind::Postcode, Script::FailFirstThenSucceed(503));
    let enricher = Enricher::new(vec![provider.clone() as Arc<dyn LookupProvider>])
        .with_cache(Arc::new(MemoryCache::new()), 4);

    let first = enricher.process(&request(51.5074, -0.1278)).await;
    let second = enricher.process(&request(51.5074, -0.1278)).await;

    // The failed first attempt was not pinned in the cache; re-analysis
    // retried and recovered.
    assert_eq!(provider.calls(), 2);
    assert!(!first.providers[&ProviderKind::Postcode].is_success());
    assert!(second.providers[&ProviderKind::Postcode].is_success());
}

#[tokio::test]
async fn batch_output_aligns_with_input() {
    let provider = FakeProvider::new(ProviderKind::Postcode, Script::AlwaysSucceed);
    let enricher =
        Enricher::new(vec![provider.clone() as Arc<dyn LookupProvider>]).with_pacing(0, 0);

    let items = vec![
        BatchItem::Request(request(51.5074, -0.1278)),
        BatchItem::Malformed("row 2: missing longitude".to_string()),
        BatchItem::Request(request(55.9533, -3.1883)),
    ];
    let cancel = AtomicBool::new(false);
    let records = enricher.process_batch(items, &cancel).await;

    assert_eq!(records.len(), 3);
    assert!(records[0].row_error.is_none());
    assert_eq!(
        records[1].row_error.as_deref(),
        Some("row 2: missing longitude")
    );
    assert!(records[1].providers.is_empty());
    assert!(records[1].required_kva.is_none());
    assert!(records[2].row_error.is_none());

    // Row alignment: first record is London, third is Edinburgh.
    let lat = |i: usize| records[i].coordinate.map(|c| c.lat()).unwrap_or_default();
    assert!((lat(0) - 51.5074).abs() < 1e-9);
    assert!((lat(2) - 55.9533).abs() < 1e-9);
}

#[tokio::test]
async fn cancellation_annotates_remaining_rows_without_shortening_output() {
    let provider = FakeProvider::new(ProviderKind::Postcode, Script::AlwaysSucceed);
    let enricher =
        Enricher::new(vec![provider.clone() as Arc<dyn LookupProvider>]).with_pacing(0, 0);

    let items = vec![
        BatchItem::Request(request(51.5074, -0.1278)),
        BatchItem::Request(request(55.9533, -3.1883)),
    ];
    let cancel = AtomicBool::new(true);
    let records = enricher.process_batch(items, &cancel).await;

    assert_eq!(records.len(), 2);
    for record in &records {
        let error = record.row_error.as_deref().expect("cancelled annotation");
        assert!(error.contains("cancelled"), "unexpected annotation: {error}");
    }
    assert_eq!(provider.calls(), 0, "no lookups after cancellation");
}

#[tokio::test]
async fn record_retains_one_entry_per_registered_provider() {
    let a = FakeProvider::new(ProviderKind::Postcode, Script::AlwaysSucceed);
    let b = FakeProvider::new(ProviderKind::Address, Script::AlwaysFail(500));
    let c = FakeProvider::new(ProviderKind::Traffic, Script::AlwaysFail(429));
    let enricher = Enricher::new(vec![
        a.clone() as Arc<dyn LookupProvider>,
        b.clone() as Arc<dyn LookupProvider>,
        c.clone() as Arc<dyn LookupProvider>,
    ]);

    let record = enricher.process(&request(51.5074, -0.1278)).await;

    let statuses: BTreeMap<ProviderKind, bool> = record
        .providers
        .iter()
        .map(|(kind, outcome)| (*kind, outcome.is_success()))
        .collect();
    assert_eq!(statuses.len(), 3);
    assert!(statuses[&ProviderKind::Postcode]);
    assert!(!statuses[&ProviderKind::Address]);
    assert!(!statuses[&ProviderKind::Traffic]);

    // An unregistered provider has no entry at all.
    assert!(!record.providers.contains_key(&ProviderKind::Amenities));
}
