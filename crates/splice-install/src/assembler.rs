//! Per-file assembly from chunk parts
//!
//! Each selected file goes through
//! `NotStarted -> (OnDiskValid | Downloading) -> Done | Failed`.
//! A failed file never aborts the run: its remaining parts are released so
//! reference counts stay exact, and the partial destination is removed.

use bytes::Bytes;
use splice_cache::ChunkCache;
use splice_formats::manifest::{Manifest, ManifestFile};
use splice_formats::{ChunkGuid, FormatError};
use splice_protocol::ChunkFetcher;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;

use crate::error::{InstallError, Result};
use crate::verify::{OnDisk, check_existing};

const WRITE_BUFFER_SIZE: usize = 256 * 1024;

/// Destination of a manifest file under the install root
///
/// Names are `/` separated and must stay below the root. A name must be in
/// normal form (no empty, `.` or `..` segments) so that two distinct names
/// never resolve to the same file.
pub fn destination(root: &Path, file_name: &str) -> Result<PathBuf> {
    let relative = Path::new(file_name);
    let normalized = relative
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
        .map(|parts| parts.join("/"));

    if normalized.as_deref() != Some(file_name) || file_name.is_empty() {
        return Err(FormatError::corrupt(format!(
            "file name '{file_name}' is not a normalized relative path"
        ))
        .into());
    }

    Ok(root.join(relative))
}

/// How a single file ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Already valid on disk; nothing fetched
    OnDisk,
    /// Written from chunks
    Downloaded,
    /// Abandoned
    Failed(FileFailure),
}

/// A file that could not be assembled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    /// Manifest file name
    pub file_name: String,
    /// Chunk being processed, if the failure happened on a part
    pub guid: Option<ChunkGuid>,
    /// Rendered cause
    pub reason: String,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.guid {
            Some(guid) => write!(f, "{} (chunk {}): {}", self.file_name, guid, self.reason),
            None => write!(f, "{}: {}", self.file_name, self.reason),
        }
    }
}

/// Failure while writing, with the first part that was not consumed
struct PartFailure {
    index: usize,
    guid: Option<ChunkGuid>,
    error: InstallError,
}

/// Writes files of one run, sharing a chunk cache between them
pub struct FileAssembler<'a, F> {
    manifest: &'a Manifest,
    fetcher: &'a F,
    cache: &'a mut ChunkCache,
    root: &'a Path,
    cancel: &'a CancellationToken,
    chunks_fetched: u64,
    bytes_fetched: u64,
}

impl<'a, F: ChunkFetcher> FileAssembler<'a, F> {
    /// Create an assembler over a seeded cache
    pub fn new(
        manifest: &'a Manifest,
        fetcher: &'a F,
        cache: &'a mut ChunkCache,
        root: &'a Path,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            manifest,
            fetcher,
            cache,
            root,
            cancel,
            chunks_fetched: 0,
            bytes_fetched: 0,
        }
    }

    /// Chunks downloaded so far
    pub fn chunks_fetched(&self) -> u64 {
        self.chunks_fetched
    }

    /// Decompressed bytes downloaded so far
    pub fn bytes_fetched(&self) -> u64 {
        self.bytes_fetched
    }

    /// Bring one file up to date
    ///
    /// Per-file problems come back as [`FileOutcome::Failed`]. An `Err` is
    /// returned only for conditions that end the run: unsafe names, chunks
    /// missing from the manifest and cancellation.
    pub async fn assemble(&mut self, file: &ManifestFile) -> Result<FileOutcome> {
        let path = destination(self.root, &file.file_name)?;

        match check_existing(&path, &file.expected_sha1).await {
            OnDisk::Valid => {
                tracing::debug!("{} is up to date", file.file_name);
                self.cache.release_file(file);
                return Ok(FileOutcome::OnDisk);
            }
            OnDisk::Missing => {}
            OnDisk::Stale(actual) => {
                tracing::info!(
                    "{} differs from manifest ({}), reinstalling",
                    file.file_name,
                    hex::encode(actual)
                );
            }
            OnDisk::Unreadable(e) => {
                tracing::warn!("Cannot read existing {}: {}, reinstalling", file.file_name, e);
            }
        }

        let Err(failure) = self.write_parts(file, &path).await else {
            tracing::debug!("Installed {} ({} bytes)", file.file_name, file.size());
            return Ok(FileOutcome::Downloaded);
        };

        self.cache.release_remaining(file, failure.index);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Cannot remove partial {}: {}", path.display(), e),
        }

        if failure.error.is_fatal() {
            return Err(failure.error);
        }

        let failure = FileFailure {
            file_name: file.file_name.clone(),
            guid: failure.guid,
            reason: failure.error.to_string(),
        };
        tracing::warn!("Failed to install {}", failure);
        Ok(FileOutcome::Failed(failure))
    }

    async fn write_parts(
        &mut self,
        file: &ManifestFile,
        path: &Path,
    ) -> std::result::Result<(), PartFailure> {
        let setup = |e: std::io::Error| PartFailure {
            index: 0,
            guid: None,
            error: e.into(),
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(setup)?;
        }
        let out = tokio::fs::File::create(path).await.map_err(setup)?;
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, out);

        for (index, part) in file.chunk_parts.iter().enumerate() {
            let fail = |error: InstallError| PartFailure {
                index,
                guid: Some(part.guid),
                error,
            };

            if self.cancel.is_cancelled() {
                return Err(fail(InstallError::Cancelled));
            }

            let payload = self.payload(part.guid).await.map_err(fail)?;
            let bytes = payload.get(part.range()).ok_or_else(|| {
                fail(InstallError::ChunkRange {
                    guid: part.guid,
                    offset: part.offset,
                    size: part.size,
                    payload_len: payload.len(),
                })
            })?;

            writer
                .write_all(bytes)
                .await
                .map_err(|e| fail(e.into()))?;
            self.cache.consume(&part.guid);
        }

        // Every part is consumed at this point
        writer.flush().await.map_err(|e| PartFailure {
            index: file.chunk_parts.len(),
            guid: None,
            error: e.into(),
        })
    }

    async fn payload(&mut self, guid: ChunkGuid) -> Result<Bytes> {
        if let Some(payload) = self.cache.get(&guid) {
            tracing::trace!("Cache hit for chunk {}", guid);
            return Ok(payload);
        }

        let chunk = self
            .manifest
            .chunk(&guid)
            .ok_or(InstallError::MissingChunk(guid))?;
        let payload = self.fetcher.fetch(chunk).await?;

        self.chunks_fetched += 1;
        self.bytes_fetched += payload.len() as u64;
        self.cache.put(guid, payload.clone());
        Ok(payload)
    }
}
