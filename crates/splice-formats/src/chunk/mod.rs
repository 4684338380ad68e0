//! Chunk blob format
//!
//! A chunk blob is a [`ChunkHeader`] followed by the payload, either stored
//! verbatim or as a zlib stream. Decoding is a pure function of the blob:
//!
//! ```text
//! Fetched -> HeaderParsed -> Raw
//!                         -> Decompressed
//! ```
//!
//! Any failure along the way makes the chunk unusable.
//!
//! # Example
//!
//! ```
//! use splice_formats::ChunkGuid;
//! use splice_formats::chunk::{StoredAs, decode_chunk, encode_chunk};
//!
//! let guid = ChunkGuid::from_words([1, 2, 3, 4]);
//! let blob = encode_chunk(guid, b"HelloWorld", true).unwrap();
//!
//! let chunk = decode_chunk(&blob).unwrap();
//! assert_eq!(chunk.storage, StoredAs::Compressed);
//! assert_eq!(chunk.header.guid(), guid);
//! assert_eq!(chunk.payload, b"HelloWorld");
//! ```

mod compression;
mod header;

pub use compression::{MAX_DECOMPRESSION_SIZE, compress, decompress};
pub use header::{
    CHUNK_MAGIC, ChunkHeader, HASH_TYPE_SHA1, HEADER_SIZE_V1, HEADER_SIZE_V2, HEADER_SIZE_V3,
    StoredAs,
};

use sha1::{Digest, Sha1};

use crate::error::{FormatError, Result};
use crate::guid::ChunkGuid;

/// A chunk blob after header parsing and decompression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedChunk {
    /// Parsed header
    pub header: ChunkHeader,
    /// How the payload was stored
    pub storage: StoredAs,
    /// Uncompressed payload; chunk part offsets index into this
    pub payload: Vec<u8>,
}

/// Decode a complete chunk blob
pub fn decode_chunk(raw: &[u8]) -> Result<DecodedChunk> {
    let header = ChunkHeader::parse(raw)?;
    let storage = header.storage()?;

    let start = header.header_size as usize;
    let declared = header.compressed_size as usize;
    let available = raw.len() - start;
    if available < declared {
        return Err(FormatError::ChunkPayloadTruncated {
            declared,
            available,
        });
    }
    let stored = &raw[start..start + declared];

    let expected = header.uncompressed_size.map(|size| size as usize);
    let payload = match storage {
        StoredAs::Raw => stored.to_vec(),
        StoredAs::Compressed => decompress(stored, expected)?,
    };

    if let Some(expected) = expected
        && payload.len() != expected
    {
        return Err(FormatError::ChunkSizeMismatch {
            expected,
            actual: payload.len(),
        });
    }

    tracing::trace!(
        "Decoded chunk {} ({:?}, {} -> {} bytes)",
        header.guid(),
        storage,
        declared,
        payload.len()
    );

    Ok(DecodedChunk {
        header,
        storage,
        payload,
    })
}

/// Build a version 3 chunk blob around `payload`
pub fn encode_chunk(guid: ChunkGuid, payload: &[u8], compress_payload: bool) -> Result<Vec<u8>> {
    let (storage, stored) = if compress_payload {
        (StoredAs::Compressed, compress(payload)?)
    } else {
        (StoredAs::Raw, payload.to_vec())
    };

    let too_large = |len: usize| {
        FormatError::Decompression(format!("payload of {len} bytes does not fit a chunk"))
    };

    let header = ChunkHeader {
        version: 3,
        header_size: HEADER_SIZE_V3 as u32,
        compressed_size: u32::try_from(stored.len()).map_err(|_| too_large(stored.len()))?,
        guid: guid.words(),
        rolling_hash: 0,
        stored_as: storage.as_byte(),
        sha1: Some(Sha1::digest(payload).into()),
        hash_type: Some(HASH_TYPE_SHA1),
        uncompressed_size: Some(
            u32::try_from(payload.len()).map_err(|_| too_large(payload.len()))?,
        ),
    };

    let mut blob = header.build()?;
    blob.extend_from_slice(&stored);
    Ok(blob)
}
