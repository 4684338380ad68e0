//! Cache statistics

#![allow(clippy::cast_precision_loss)] // Statistics calculations intentionally accept precision loss

use std::fmt;

/// Cache statistics snapshot
///
/// Contains point-in-time statistics about cache usage over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::struct_field_names)] // Fields like resident_bytes follow common naming convention
pub struct CacheStats {
    /// Lookups served from the cache
    pub hit_count: u64,
    /// Lookups that found nothing
    pub miss_count: u64,
    /// Payloads retained for later parts
    pub store_count: u64,
    /// Payloads not retained because no later part needs them
    pub skipped_store_count: u64,
    /// Entries dropped once their last part was consumed
    pub eviction_count: u64,
    /// Entries currently held
    pub entry_count: usize,
    /// Bytes currently held
    pub resident_bytes: usize,
    /// Highest `resident_bytes` observed
    pub peak_resident_bytes: usize,
}

impl CacheStats {
    /// Create new empty cache statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of lookups
    #[inline]
    pub fn get_count(&self) -> u64 {
        self.hit_count + self.miss_count
    }

    /// Calculate hit rate (hits / total gets)
    #[inline]
    pub fn hit_rate(&self) -> f64 {
        let gets = self.get_count();
        if gets == 0 {
            0.0
        } else {
            self.hit_count as f64 / gets as f64
        }
    }

    pub(crate) fn record_get(&mut self, hit: bool) {
        if hit {
            self.hit_count += 1;
        } else {
            self.miss_count += 1;
        }
    }

    pub(crate) fn record_store(&mut self, size_bytes: usize) {
        self.store_count += 1;
        self.entry_count += 1;
        self.resident_bytes += size_bytes;
        self.peak_resident_bytes = self.peak_resident_bytes.max(self.resident_bytes);
    }

    pub(crate) fn record_skipped_store(&mut self) {
        self.skipped_store_count += 1;
    }

    pub(crate) fn record_eviction(&mut self, size_bytes: usize) {
        self.eviction_count += 1;
        self.entry_count = self.entry_count.saturating_sub(1);
        self.resident_bytes = self.resident_bytes.saturating_sub(size_bytes);
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hits, {} misses ({:.1}% hit rate), {} stored, {} evicted, peak {} bytes",
            self.hit_count,
            self.miss_count,
            self.hit_rate() * 100.0,
            self.store_count,
            self.eviction_count,
            self.peak_resident_bytes
        )
    }
}
