//! Chunk store client
//!
//! A chunk store is any HTTP(S) server exposing chunk blobs under
//! `{base}/ChunksV3/{group}/{hash}_{guid}.chunk`. Several mirrors can serve
//! the same store; [`CdnChunkFetcher`] spreads requests across them.

use async_trait::async_trait;
use bytes::Bytes;
use rand::{RngExt, rng};
use splice_formats::chunk::decode_chunk;
use splice_formats::manifest::ChunkInfo;
use url::Url;

use crate::error::{ProtocolError, Result};
use crate::fetcher::ChunkFetcher;
use crate::transport::HttpClient;

/// Parse and validate a chunk store base URL
pub fn parse_base_url(s: &str) -> Result<Url> {
    let trimmed = s.trim();
    let url = Url::parse(trimmed).map_err(|e| ProtocolError::InvalidUrl {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ProtocolError::InvalidUrl {
            url: trimmed.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

/// Parse a list of base URLs, rejecting an empty list
pub fn parse_base_urls<S: AsRef<str>>(urls: &[S]) -> Result<Vec<Url>> {
    let parsed = urls
        .iter()
        .map(|s| s.as_ref())
        .filter(|s| !s.trim().is_empty())
        .map(parse_base_url)
        .collect::<Result<Vec<_>>>()?;

    if parsed.is_empty() {
        return Err(ProtocolError::NoEndpoints);
    }
    Ok(parsed)
}

/// Join a store-relative path onto a base URL
///
/// The base is treated as a directory whether or not it ends in `/`.
pub fn join_path(base: &Url, path: &str) -> String {
    format!("{}/{}", base.as_str().trim_end_matches('/'), path)
}

/// Downloads and decodes chunk blobs from one store mirror at a time
#[derive(Debug, Clone)]
pub struct CdnClient {
    http_client: HttpClient,
}

impl CdnClient {
    /// Create a client over an existing transport
    pub fn new(http_client: HttpClient) -> Self {
        Self { http_client }
    }

    /// Full URL of a chunk under `base`
    pub fn chunk_url(base: &Url, chunk: &ChunkInfo) -> String {
        join_path(base, &chunk.path())
    }

    /// Fetch `chunk` from `base` and return its decompressed payload
    pub async fn fetch_chunk(&self, base: &Url, chunk: &ChunkInfo) -> Result<Bytes> {
        let url = Self::chunk_url(base, chunk);
        let raw = self.http_client.get_bytes(&url).await?;
        if !wire_size_matches(chunk, raw.len()) {
            tracing::warn!(
                "Chunk {} is {} bytes on wire, manifest lists {}",
                chunk.guid,
                raw.len(),
                chunk.file_size
            );
        }

        let decoded = decode_chunk(&raw).map_err(|source| ProtocolError::Chunk {
            guid: chunk.guid,
            source,
        })?;

        let received = decoded.header.guid();
        if received != chunk.guid {
            return Err(ProtocolError::GuidMismatch {
                requested: chunk.guid,
                received,
            });
        }

        tracing::debug!(
            "Fetched chunk {} from {} ({} bytes on wire, {} decoded)",
            chunk.guid,
            base,
            raw.len(),
            decoded.payload.len()
        );

        Ok(Bytes::from(decoded.payload))
    }
}

/// Whether a fetched blob has the size the manifest recorded
///
/// A recorded size of 0 means unknown.
fn wire_size_matches(chunk: &ChunkInfo, len: usize) -> bool {
    chunk.file_size == 0 || chunk.file_size == len as u64
}

/// [`ChunkFetcher`] choosing a mirror uniformly at random for every chunk
#[derive(Debug, Clone)]
pub struct CdnChunkFetcher {
    client: CdnClient,
    bases: Vec<Url>,
}

impl CdnChunkFetcher {
    /// Create a fetcher over at least one base URL
    pub fn new(client: CdnClient, bases: Vec<Url>) -> Result<Self> {
        if bases.is_empty() {
            return Err(ProtocolError::NoEndpoints);
        }
        Ok(Self { client, bases })
    }

    /// Configured mirrors
    pub fn bases(&self) -> &[Url] {
        &self.bases
    }

    fn pick_base(&self) -> &Url {
        &self.bases[rng().random_range(0..self.bases.len())]
    }
}

#[async_trait]
impl ChunkFetcher for CdnChunkFetcher {
    async fn fetch(&self, chunk: &ChunkInfo) -> Result<Bytes> {
        let base = self.pick_base();
        self.client.fetch_chunk(base, chunk).await
    }
}
