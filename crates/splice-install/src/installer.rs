//! Install pipeline
//!
//! One run selects the files to process, seeds reference counts over that
//! selection, assembles every file in manifest order and finally re-hashes
//! what was installed. Everything is awaited sequentially; the chunk cache is
//! owned by the run.

use splice_cache::{ChunkCache, ReferenceTracker};
use splice_formats::manifest::Manifest;
use splice_protocol::{
    CdnChunkFetcher, CdnClient, ChunkFetcher, HttpClient, RetryingFetcher, parse_base_urls,
};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

use crate::assembler::{FileAssembler, FileOutcome, destination};
use crate::config::InstallConfig;
use crate::error::{InstallError, Result};
use crate::summary::RunSummary;
use crate::verify::verify_files;

/// Fetcher used by the binary: random mirror per chunk, with retries
pub fn default_fetcher(
    config: &InstallConfig,
    http_client: HttpClient,
) -> Result<RetryingFetcher<CdnChunkFetcher>> {
    let bases = parse_base_urls(config.urls.as_slice())?;
    let fetcher = CdnChunkFetcher::new(CdnClient::new(http_client), bases)?;
    Ok(RetryingFetcher::new(fetcher, config.retry_policy()))
}

/// Installs manifests into the configured root
pub struct Installer<F> {
    config: InstallConfig,
    fetcher: F,
    cancel: CancellationToken,
}

impl<F: ChunkFetcher> Installer<F> {
    /// Create an installer
    pub fn new(config: InstallConfig, fetcher: F) -> Self {
        Self {
            config,
            fetcher,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops the run between files and between parts
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Active configuration
    pub fn config(&self) -> &InstallConfig {
        &self.config
    }

    /// The chunk fetcher
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Install the selected files of `manifest`
    ///
    /// Per-file failures and hash mismatches are collected in the summary.
    /// Only an unusable manifest or cancellation makes the run itself fail.
    pub async fn run(&self, manifest: &Manifest) -> Result<RunSummary> {
        let root = self.config.install_root();
        let files = manifest.select(self.config.file_filter());

        for file in &files {
            destination(root, &file.file_name)?;
        }

        let tracker = ReferenceTracker::seed(files.iter().copied());
        tracing::info!(
            "Installing {} {}: {} of {} files, {} chunks, {} parts",
            manifest.app_name(),
            manifest.build_version(),
            files.len(),
            manifest.files().len(),
            tracker.pending_chunks(),
            tracker.pending_parts()
        );

        let mut cache = ChunkCache::new(tracker);
        let mut summary = RunSummary::default();

        {
            let mut assembler =
                FileAssembler::new(manifest, &self.fetcher, &mut cache, root, &self.cancel);

            for file in &files {
                if self.cancel.is_cancelled() {
                    tracing::warn!("Install cancelled");
                    return Err(InstallError::Cancelled);
                }

                match assembler.assemble(file).await {
                    Ok(FileOutcome::OnDisk) => summary.found_on_disk += 1,
                    Ok(FileOutcome::Downloaded) => summary.downloaded += 1,
                    Ok(FileOutcome::Failed(failure)) => summary.failed.push(failure),
                    Err(e) => {
                        tracing::error!("Install aborted at {}: {}", file.file_name, e);
                        return Err(e);
                    }
                }
            }

            summary.chunks_fetched = assembler.chunks_fetched();
            summary.bytes_fetched = assembler.bytes_fetched();
        }

        if self.config.skip_check {
            tracing::info!("Skipping integrity check");
        } else {
            tracing::info!("Verifying installed files");
            let failed: HashSet<&str> = summary
                .failed
                .iter()
                .map(|f| f.file_name.as_str())
                .collect();
            let checked = files
                .iter()
                .copied()
                .filter(|f| !failed.contains(f.file_name.as_str()));
            summary.mismatches = verify_files(root, checked).await;
        }

        if cache.tracker().pending_parts() != 0 {
            tracing::warn!(
                "{} chunk parts left unconsumed",
                cache.tracker().pending_parts()
            );
        }
        summary.cache = cache.stats();

        Ok(summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fetcher_uses_configured_urls() {
        let config = InstallConfig::new(
            "files",
            "cache",
            ["http://a.example.com/CloudDir", "http://b.example.com/CloudDir"],
        );
        let fetcher = default_fetcher(&config, HttpClient::new().unwrap()).unwrap();
        assert_eq!(fetcher.inner().bases().len(), 2);
    }

    #[test]
    fn test_default_fetcher_without_urls() {
        let config = InstallConfig::new("files", "cache", Vec::<String>::new());
        assert!(matches!(
            default_fetcher(&config, HttpClient::new().unwrap()),
            Err(InstallError::Protocol(_))
        ));
    }
}
