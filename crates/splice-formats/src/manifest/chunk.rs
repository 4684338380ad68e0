//! Per-chunk metadata

use crate::guid::ChunkGuid;

/// Store directory holding version 3 chunk blobs
pub const CHUNKS_DIR: &str = "ChunksV3";

/// Metadata the manifest records for one chunk
///
/// No payload is attached; the bytes are fetched from the chunk store on
/// demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkInfo {
    /// Chunk identifier
    pub guid: ChunkGuid,
    /// Rolling hash, part of the store file name
    pub hash: u64,
    /// SHA-1 of the decompressed payload
    pub sha1: [u8; 20],
    /// Store shard the chunk lives in
    pub data_group: u8,
    /// Size of the chunk blob on the wire
    pub file_size: u64,
}

impl ChunkInfo {
    /// Store file name, e.g. `0123456789ABCDEF_<GUID>.chunk`
    pub fn file_name(&self) -> String {
        format!("{:016X}_{}.chunk", self.hash, self.guid)
    }

    /// Path relative to a chunk store base URL
    pub fn path(&self) -> String {
        format!("{CHUNKS_DIR}/{:02}/{}", self.data_group, self.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_path() {
        let info = ChunkInfo {
            guid: ChunkGuid::from_words([0xA, 0xB, 0xC, 0xD]),
            hash: 0x1234_5678_9ABC_DEF0,
            sha1: [0; 20],
            data_group: 7,
            file_size: 100,
        };

        assert_eq!(
            info.path(),
            "ChunksV3/07/123456789ABCDEF0_0000000A0000000B0000000C0000000D.chunk"
        );
    }
}
