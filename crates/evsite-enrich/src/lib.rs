//! Best-effort multi-source site enrichment.
//!
//! Given a coordinate and a charger configuration, the pipeline consults
//! every registered external lookup provider — reverse geocoder, postcode
//! service, traffic service, amenity and road queries, charging-station
//! search — and merges whatever came back with the locally computed power
//! figure and grid reference into one [`SiteRecord`]. Any subset of
//! providers can fail without losing the others' data: failures are carried
//! in the record as typed reasons, never raised.
//!
//! The only fatal errors in a survey are input validation errors, and those
//! are ruled out before the pipeline runs: [`SiteRequest`] is built from
//! smart-constructed value types, so invalid coordinates or charger counts
//! never reach a provider.

mod cache;
mod classify;
mod error;
mod pacing;
mod pipeline;
pub mod providers;
mod record;
mod types;

pub use cache::{CacheKey, LookupCache, MemoryCache};
pub use classify::{classify_road, RoadClass};
pub use error::{AdapterError, FailureReason};
pub use pacing::AdaptivePacer;
pub use pipeline::{BatchItem, Enricher};
pub use providers::{default_providers, LookupProvider};
pub use record::{SiteRecord, SiteRequest};
pub use types::{
    AddressInfo, Amenity, AmenitySummary, ChargerAvailability, ChargingStation, CongestionLevel,
    LookupOutcome, PostcodeInfo, ProviderKind, ProviderPayload, RoadInfo, TrafficInfo,
};
