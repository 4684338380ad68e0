//! In-memory chunk payload cache

use std::collections::HashMap;

use bytes::Bytes;
use splice_formats::ChunkGuid;
use splice_formats::manifest::ManifestFile;

use crate::stats::CacheStats;
use crate::tracker::ReferenceTracker;

/// Decompressed chunk payloads kept only while later parts need them
///
/// Owned by a single install run; no interior locking.
#[derive(Debug, Default)]
pub struct ChunkCache {
    tracker: ReferenceTracker,
    entries: HashMap<ChunkGuid, Bytes>,
    stats: CacheStats,
}

impl ChunkCache {
    /// Create an empty cache over seeded reference counts
    pub fn new(tracker: ReferenceTracker) -> Self {
        Self {
            tracker,
            entries: HashMap::new(),
            stats: CacheStats::new(),
        }
    }

    /// Cached payload of `guid`, if any
    pub fn get(&mut self, guid: &ChunkGuid) -> Option<Bytes> {
        let hit = self.entries.get(guid).cloned();
        self.stats.record_get(hit.is_some());
        hit
    }

    /// Offer a freshly fetched payload
    ///
    /// The payload is kept only when more than one part (including the one
    /// about to be written) still needs it. Returns whether it was stored.
    pub fn put(&mut self, guid: ChunkGuid, payload: Bytes) -> bool {
        let remaining = self.tracker.remaining_uses(&guid);
        if remaining <= 1 {
            self.stats.record_skipped_store();
            return false;
        }

        tracing::debug!(
            "Caching chunk {} ({} bytes, {} uses left)",
            guid,
            payload.len(),
            remaining
        );
        self.stats.record_store(payload.len());
        if let Some(previous) = self.entries.insert(guid, payload) {
            self.stats.record_eviction(previous.len());
        }
        true
    }

    /// Record that one part of `guid` has been dealt with
    ///
    /// Evicts the payload once no part needs it any more.
    pub fn consume(&mut self, guid: &ChunkGuid) {
        if self.tracker.decrement(guid) == 0
            && let Some(payload) = self.entries.remove(guid)
        {
            tracing::debug!("Evicting chunk {} ({} bytes)", guid, payload.len());
            self.stats.record_eviction(payload.len());
        }
    }

    /// Consume every part of `file` without reading or storing payloads
    ///
    /// Used when a file is already valid on disk or has been abandoned.
    pub fn release_file(&mut self, file: &ManifestFile) {
        for part in &file.chunk_parts {
            self.consume(&part.guid);
        }
    }

    /// Release the parts of `file` from position `from` onwards
    pub fn release_remaining(&mut self, file: &ManifestFile, from: usize) {
        for part in file.chunk_parts.iter().skip(from) {
            self.consume(&part.guid);
        }
    }

    /// Parts of `guid` that still have to be consumed
    pub fn remaining_uses(&self, guid: &ChunkGuid) -> u32 {
        self.tracker.remaining_uses(guid)
    }

    /// Whether a payload for `guid` is resident, without touching statistics
    pub fn contains(&self, guid: &ChunkGuid) -> bool {
        self.entries.contains_key(guid)
    }

    /// Number of resident payloads
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no payload is resident
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reference counts backing the cache
    pub fn tracker(&self) -> &ReferenceTracker {
        &self.tracker
    }

    /// Statistics snapshot
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }
}
