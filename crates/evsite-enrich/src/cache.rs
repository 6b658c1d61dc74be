//! Read-through cache for provider lookups.
//!
//! Keys round the coordinate to a configured number of decimal places, so
//! repeated surveys of effectively the same position within a session reuse
//! the earlier response instead of re-querying the provider. The cache is an
//! injectable collaborator: the pipeline takes any [`LookupCache`]
//! implementation, and tests swap in their own.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::types::{ProviderKind, ProviderPayload};

/// Cache key: provider category plus the coordinate scaled to a fixed
/// decimal precision. Two coordinates equal after rounding share an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: ProviderKind,
    lat_scaled: i64,
    lon_scaled: i64,
}

impl CacheKey {
    /// Builds a key from a coordinate rounded to `precision` decimal places.
    // Bounded inputs (|lat| <= 90, |lon| <= 180) and single-digit precision
    // keep the scaled values far inside i64 range.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn new(kind: ProviderKind, lat: f64, lon: f64, precision: u8) -> Self {
        let scale = 10f64.powi(i32::from(precision));
        Self {
            kind,
            lat_scaled: (lat * scale).round() as i64,
            lon_scaled: (lon * scale).round() as i64,
        }
    }
}

/// Session-scoped cache of successful lookups.
///
/// Entries are immutable once written — the key encodes the full input, so
/// nothing ever needs invalidation mid-session. Implementations must be safe
/// under concurrent access from the pipeline's fan-out.
pub trait LookupCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<ProviderPayload>;
    fn put(&self, key: CacheKey, payload: ProviderPayload);
}

/// In-process [`LookupCache`] backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, ProviderPayload>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LookupCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<ProviderPayload> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn put(&self, key: CacheKey, payload: ProviderPayload) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, payload);
    }
}
