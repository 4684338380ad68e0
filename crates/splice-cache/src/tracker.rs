//! Outstanding chunk part counts

use std::collections::HashMap;

use splice_formats::ChunkGuid;
use splice_formats::manifest::ManifestFile;

/// Number of not-yet-consumed chunk parts per chunk
///
/// Counts only ever go down after seeding.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTracker {
    counts: HashMap<ChunkGuid, u32>,
}

impl ReferenceTracker {
    /// Count every chunk part of the selected files
    ///
    /// Must be built from the final file selection, after any allow-list has
    /// been applied, and before the first part is consumed.
    pub fn seed<'a>(files: impl IntoIterator<Item = &'a ManifestFile>) -> Self {
        let mut counts: HashMap<ChunkGuid, u32> = HashMap::new();
        for file in files {
            for part in &file.chunk_parts {
                *counts.entry(part.guid).or_default() += 1;
            }
        }
        Self { counts }
    }

    /// Parts of `guid` that still have to be consumed
    pub fn remaining_uses(&self, guid: &ChunkGuid) -> u32 {
        self.counts.get(guid).copied().unwrap_or(0)
    }

    /// Record one consumed part and return the new count
    pub(crate) fn decrement(&mut self, guid: &ChunkGuid) -> u32 {
        match self.counts.get_mut(guid) {
            Some(count) if *count > 1 => {
                *count -= 1;
                *count
            }
            Some(_) => {
                self.counts.remove(guid);
                0
            }
            None => {
                tracing::warn!("Chunk {} consumed more often than referenced", guid);
                0
            }
        }
    }

    /// Number of chunks with outstanding parts
    pub fn pending_chunks(&self) -> usize {
        self.counts.len()
    }

    /// Total outstanding parts over all chunks
    pub fn pending_parts(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splice_formats::manifest::ChunkPart;

    fn file(name: &str, parts: &[ChunkGuid]) -> ManifestFile {
        ManifestFile {
            file_name: name.to_string(),
            expected_sha1: [0; 20],
            chunk_parts: parts.iter().map(|&g| ChunkPart::new(g, 0, 1)).collect(),
        }
    }

    #[test]
    fn test_seed_counts_every_part() {
        let g1 = ChunkGuid::from_words([1, 0, 0, 0]);
        let g2 = ChunkGuid::from_words([2, 0, 0, 0]);
        let files = [file("a", &[g1, g1, g2]), file("b", &[g1])];

        let tracker = ReferenceTracker::seed(&files);
        assert_eq!(tracker.remaining_uses(&g1), 3);
        assert_eq!(tracker.remaining_uses(&g2), 1);
        assert_eq!(tracker.pending_chunks(), 2);
        assert_eq!(tracker.pending_parts(), 4);
    }

    #[test]
    fn test_decrement_never_goes_negative() {
        let g = ChunkGuid::from_words([1, 0, 0, 0]);
        let mut tracker = ReferenceTracker::seed(&[file("a", &[g, g])]);

        assert_eq!(tracker.decrement(&g), 1);
        assert_eq!(tracker.decrement(&g), 0);
        assert_eq!(tracker.decrement(&g), 0);
        assert_eq!(tracker.remaining_uses(&g), 0);
        assert_eq!(tracker.pending_chunks(), 0);
    }

    #[test]
    fn test_unknown_guid() {
        let tracker = ReferenceTracker::default();
        assert_eq!(tracker.remaining_uses(&ChunkGuid::default()), 0);
    }
}
