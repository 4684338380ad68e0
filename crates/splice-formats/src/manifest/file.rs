//! Manifest file entries and chunk parts

use crate::guid::ChunkGuid;

/// Byte range of one chunk's decompressed payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPart {
    /// Chunk the bytes come from
    pub guid: ChunkGuid,
    /// Offset into the decompressed chunk payload
    pub offset: u32,
    /// Number of bytes to copy
    pub size: u32,
}

impl ChunkPart {
    /// Create a new chunk part
    pub const fn new(guid: ChunkGuid, offset: u32, size: u32) -> Self {
        Self { guid, offset, size }
    }

    /// Byte range inside the decompressed payload
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = self.offset as usize;
        start..start + self.size as usize
    }
}

/// A destination file and the ordered chunk parts that make it up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFile {
    /// Path relative to the install root, `/` separated
    pub file_name: String,
    /// SHA-1 of the complete file
    pub expected_sha1: [u8; 20],
    /// Parts in write order
    pub chunk_parts: Vec<ChunkPart>,
}

impl ManifestFile {
    /// Total size of the assembled file
    pub fn size(&self) -> u64 {
        self.chunk_parts.iter().map(|p| u64::from(p.size)).sum()
    }

    /// Expected SHA-1 as lowercase hex
    pub fn expected_sha1_hex(&self) -> String {
        hex::encode(self.expected_sha1)
    }
}
