//! Run summary

use splice_cache::CacheStats;

use crate::assembler::FileFailure;
use crate::verify::HashMismatch;

/// Outcome of one install run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Files accepted without downloading
    pub found_on_disk: usize,
    /// Files written from chunks
    pub downloaded: usize,
    /// Files abandoned during assembly
    pub failed: Vec<FileFailure>,
    /// Files that failed the post-install integrity check
    pub mismatches: Vec<HashMismatch>,
    /// Chunks downloaded
    pub chunks_fetched: u64,
    /// Decompressed chunk bytes downloaded
    pub bytes_fetched: u64,
    /// Chunk cache statistics at the end of the run
    pub cache: CacheStats,
}

impl RunSummary {
    /// Files the run looked at
    pub fn total_files(&self) -> usize {
        self.found_on_disk + self.downloaded + self.failed.len()
    }

    /// No file failed and none mismatched
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.mismatches.is_empty()
    }

    /// Emit the summary through `tracing`
    pub fn log(&self) {
        tracing::info!(
            "Processed {} files: {} up to date, {} installed, {} failed",
            self.total_files(),
            self.found_on_disk,
            self.downloaded,
            self.failed.len()
        );
        tracing::info!(
            "Fetched {} chunks ({} bytes); cache: {}",
            self.chunks_fetched,
            self.bytes_fetched,
            self.cache
        );

        for failure in &self.failed {
            tracing::error!("Failed: {}", failure);
        }
        for mismatch in &self.mismatches {
            tracing::error!("Mismatch: {}", mismatch);
        }
    }
}
