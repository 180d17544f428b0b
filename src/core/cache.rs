//! Thread-safe response cache with named regions
//!
//! This module provides [`RegionCache`], the process-local [`Cache`] used by
//! the transaction service, and [`NoCache`], which turns caching off.
//!
//! # Design
//!
//! `RegionCache` keeps one `DashMap` per region inside an outer `DashMap`.
//! Single entries and whole lists live side by side in the same region under
//! disjoint keys ([`CacheKey::Id`] vs [`CacheKey::Operation`]), so evicting
//! the region clears both at once.
//!
//! # Coherence
//!
//! Entries live until they are replaced or their region is evicted. Every
//! eviction and every replacing `put` advances the region's epoch; fills after
//! a miss go through [`Cache::put_if_current`] and are dropped when the epoch
//! moved while the store was being read. There is
//! no cross-process invalidation: another process writing to the same store
//! is not observed until the region is evicted locally.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::traits::Cache;
use crate::types::{TransactionId, TransactionView};

/// Key of a cache entry within a region
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A single transaction, keyed by its id
    Id(TransactionId),

    /// The result of a parameterless operation, keyed by operation name
    Operation(&'static str),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Id(id) => write!(f, "{}", id),
            CacheKey::Operation(name) => f.write_str(name),
        }
    }
}

/// A cached response
#[derive(Debug, Clone, PartialEq)]
pub enum CachedEntry {
    One(TransactionView),
    Many(Vec<TransactionView>),
}

impl CachedEntry {
    /// The single view of a `One` entry
    pub fn into_one(self) -> Option<TransactionView> {
        match self {
            CachedEntry::One(view) => Some(view),
            CachedEntry::Many(_) => None,
        }
    }
}

/// Hit and miss counters of a [`RegionCache`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Thread-safe region cache
///
/// Concurrent reads and writes to different regions or keys do not block
/// each other; `DashMap` shards its locks internally.
#[derive(Debug, Default)]
pub struct RegionCache {
    /// Region name to the entries of that region
    regions: DashMap<String, DashMap<CacheKey, CachedEntry>>,
    /// Region name to its write epoch; outlives eviction of the region.
    /// Always locked before `regions`.
    epochs: DashMap<String, u64>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RegionCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held in a region
    pub fn len(&self, region: &str) -> usize {
        self.regions
            .get(region)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// Whether a region holds no entries
    pub fn is_empty(&self, region: &str) -> bool {
        self.len(region) == 0
    }

    /// Snapshot of the hit and miss counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Cache for RegionCache {
    fn get(&self, region: &str, key: &CacheKey) -> Option<CachedEntry> {
        // Clone so no shard lock outlives the call
        let entry = self
            .regions
            .get(region)
            .and_then(|entries| entries.get(key).map(|entry| entry.value().clone()));

        let counter = if entry.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);

        entry
    }

    fn put(&self, region: &str, key: CacheKey, value: CachedEntry) {
        let mut epoch = self.epochs.entry(region.to_string()).or_default();
        *epoch += 1;
        self.regions
            .entry(region.to_string())
            .or_default()
            .insert(key, value);
    }

    fn evict_region(&self, region: &str) {
        let mut epoch = self.epochs.entry(region.to_string()).or_default();
        *epoch += 1;
        self.regions.remove(region);
    }

    fn epoch(&self, region: &str) -> u64 {
        self.epochs.get(region).map(|epoch| *epoch).unwrap_or(0)
    }

    fn put_if_current(&self, region: &str, key: CacheKey, value: CachedEntry, epoch: u64) -> bool {
        // Held across the insert so no eviction can slip in between
        let current = self.epochs.entry(region.to_string()).or_default();
        if *current != epoch {
            return false;
        }
        self.regions
            .entry(region.to_string())
            .or_default()
            .insert(key, value);
        true
    }
}

/// Cache that never stores anything
///
/// Every read falls through to the repository. Useful when several processes
/// write to the same store and stale reads are not acceptable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl Cache for NoCache {
    fn get(&self, _region: &str, _key: &CacheKey) -> Option<CachedEntry> {
        None
    }

    fn put(&self, _region: &str, _key: CacheKey, _value: CachedEntry) {}

    fn evict_region(&self, _region: &str) {}

    fn epoch(&self, _region: &str) -> u64 {
        0
    }

    fn put_if_current(&self, _region: &str, _key: CacheKey, _value: CachedEntry, _epoch: u64) -> bool {
        false
    }
}
