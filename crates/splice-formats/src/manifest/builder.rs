//! Manifest construction
//!
//! Produces the JSON document a chunk store publishes. Used by tests and
//! tooling that stage fake builds.

use super::{RawChunkPart, RawFile, RawManifest};
use crate::error::Result;
use crate::guid::ChunkGuid;
use crate::packed;

/// Builder for JSON manifests
#[derive(Debug, Clone, Default)]
pub struct ManifestBuilder {
    raw: RawManifest,
}

impl ManifestBuilder {
    /// Start a manifest for an application build
    pub fn new(app_name: impl Into<String>, build_version: impl Into<String>) -> Self {
        Self {
            raw: RawManifest {
                app_name_string: app_name.into(),
                build_version_string: build_version.into(),
                ..RawManifest::default()
            },
        }
    }

    /// Register chunk metadata in all four chunk tables
    #[must_use]
    pub fn chunk(
        mut self,
        guid: ChunkGuid,
        hash: u64,
        sha1: [u8; 20],
        data_group: u8,
        file_size: u64,
    ) -> Self {
        self.raw
            .chunk_hash_list
            .insert(guid, packed::encode_uint64(hash));
        self.raw
            .chunk_sha_list
            .insert(guid, packed::encode_bytes(&sha1));
        self.raw
            .data_group_list
            .insert(guid, packed::encode_bytes(&[data_group]));
        self.raw
            .chunk_filesize_list
            .insert(guid, packed::encode_uint64(file_size));
        self
    }

    /// Append a file made of `(guid, offset, size)` parts
    #[must_use]
    pub fn file(
        mut self,
        file_name: impl Into<String>,
        sha1: [u8; 20],
        parts: &[(ChunkGuid, u32, u32)],
    ) -> Self {
        self.raw.file_manifest_list.push(RawFile {
            filename: file_name.into(),
            file_hash: packed::encode_bytes(&sha1),
            file_chunk_parts: parts
                .iter()
                .map(|&(guid, offset, size)| RawChunkPart {
                    guid,
                    offset: packed::encode_uint32(offset),
                    size: packed::encode_uint32(size),
                })
                .collect(),
        });
        self
    }

    /// Serialize to JSON bytes
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self.raw)?)
    }

    #[cfg(test)]
    pub(crate) fn into_raw(self) -> RawManifest {
        self.raw
    }
}
