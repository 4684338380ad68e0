//! Shared fixtures: in-memory chunk store and manifest building helpers.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use async_trait::async_trait;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use splice_formats::ChunkGuid;
use splice_formats::chunk::{decode_chunk, encode_chunk};
use splice_formats::manifest::{ChunkInfo, Manifest, ManifestBuilder};
use splice_protocol::{ChunkFetcher, ProtocolError};
use std::collections::HashMap;
use std::sync::Mutex;

pub fn guid(n: u32) -> ChunkGuid {
    ChunkGuid::from_words([n, 0xA5A5_0000 | n, 0, n.rotate_left(16)])
}

pub fn sha1(data: &[u8]) -> [u8; 20] {
    Sha1::digest(data).into()
}

/// Chunk store serving encoded blobs and counting fetches per GUID
#[derive(Default)]
pub struct MemoryStore {
    blobs: HashMap<ChunkGuid, Vec<u8>>,
    fetches: Mutex<HashMap<ChunkGuid, u32>>,
}

impl MemoryStore {
    pub fn insert_raw(&mut self, guid: ChunkGuid, blob: Vec<u8>) {
        self.blobs.insert(guid, blob);
    }

    pub fn fetch_count(&self, guid: &ChunkGuid) -> u32 {
        self.fetches
            .lock()
            .expect("fetch counter poisoned")
            .get(guid)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_fetches(&self) -> u32 {
        self.fetches
            .lock()
            .expect("fetch counter poisoned")
            .values()
            .sum()
    }
}

#[async_trait]
impl ChunkFetcher for MemoryStore {
    async fn fetch(&self, chunk: &ChunkInfo) -> splice_protocol::Result<Bytes> {
        *self
            .fetches
            .lock()
            .expect("fetch counter poisoned")
            .entry(chunk.guid)
            .or_default() += 1;

        let blob = self.blobs.get(&chunk.guid).ok_or(ProtocolError::Timeout)?;
        let decoded = decode_chunk(blob).map_err(|source| ProtocolError::Chunk {
            guid: chunk.guid,
            source,
        })?;
        Ok(Bytes::from(decoded.payload))
    }
}

/// Builds a manifest and the matching chunk store together
pub struct Fixture {
    builder: ManifestBuilder,
    pub store: MemoryStore,
    payloads: HashMap<ChunkGuid, Vec<u8>>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            builder: ManifestBuilder::new("SpliceTest", "1.0.0-CL-1"),
            store: MemoryStore::default(),
            payloads: HashMap::new(),
        }
    }

    /// Add a chunk stored raw (`compress = false`) or zlib-compressed
    pub fn chunk(mut self, id: u32, payload: &[u8], compress: bool) -> Self {
        let g = guid(id);
        let blob = encode_chunk(g, payload, compress).expect("encode chunk");
        self.builder = self.builder.chunk(
            g,
            u64::from(id) * 0x1000_0001,
            sha1(payload),
            (id % 100) as u8,
            blob.len() as u64,
        );
        self.store.insert_raw(g, blob);
        self.payloads.insert(g, payload.to_vec());
        self
    }

    /// Replace the stored blob of a chunk
    pub fn corrupt_chunk(mut self, id: u32, blob: Vec<u8>) -> Self {
        self.store.insert_raw(guid(id), blob);
        self
    }

    /// Add a file assembled from `(chunk id, offset, size)` parts
    ///
    /// The expected hash is computed from the chunk payloads.
    pub fn file(self, name: &str, parts: &[(u32, u32, u32)]) -> Self {
        let mut content = Vec::new();
        for &(id, offset, size) in parts {
            let payload = &self.payloads[&guid(id)];
            let start = offset as usize;
            let end = (start + size as usize).min(payload.len());
            content.extend_from_slice(&payload[start.min(end)..end]);
        }
        self.file_with_hash(name, sha1(&content), parts)
    }

    /// Add a file with an explicit expected hash
    pub fn file_with_hash(mut self, name: &str, hash: [u8; 20], parts: &[(u32, u32, u32)]) -> Self {
        let parts: Vec<_> = parts
            .iter()
            .map(|&(id, offset, size)| (guid(id), offset, size))
            .collect();
        self.builder = self.builder.file(name, hash, &parts);
        self
    }

    pub fn manifest_json(&self) -> Vec<u8> {
        self.builder.to_json().expect("manifest json")
    }

    pub fn build(self) -> (Manifest, MemoryStore) {
        let manifest = Manifest::from_json(&self.manifest_json()).expect("manifest");
        (manifest, self.store)
    }
}
