//! Chunk blob header

use std::io::Cursor;

use binrw::{BinRead, BinWrite};

use crate::error::{FormatError, Result};
use crate::guid::ChunkGuid;

/// Magic number opening every chunk blob
pub const CHUNK_MAGIC: u32 = 0xB1FE_3AA2;

/// Encoded size of a version 1 header
pub const HEADER_SIZE_V1: usize = 41;
/// Encoded size of a version 2 header (adds SHA-1 and hash type)
pub const HEADER_SIZE_V2: usize = 62;
/// Encoded size of a version 3 header (adds uncompressed size)
pub const HEADER_SIZE_V3: usize = 66;

/// Hash type value meaning the `sha1` field is populated
pub const HASH_TYPE_SHA1: u8 = 0x02;

/// How a chunk payload is stored on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StoredAs {
    /// Payload follows the header verbatim
    Raw = 0,
    /// Payload is a zlib stream
    Compressed = 1,
}

impl StoredAs {
    /// Parse the `stored_as` header byte
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(Self::Raw),
            1 => Ok(Self::Compressed),
            other => Err(FormatError::UnknownChunkEncoding(other)),
        }
    }

    /// Header byte value
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Little-endian chunk header
///
/// Later versions append fields; older headers leave them as `None`.
/// `header_size` is authoritative for where the payload starts, so headers
/// from newer versions with extra trailing fields still decode.
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = 0xB1FE_3AA2_u32)]
pub struct ChunkHeader {
    /// Header layout version
    pub version: u32,
    /// Offset of the payload from the start of the blob
    pub header_size: u32,
    /// Size of the payload as stored
    pub compressed_size: u32,
    /// Chunk identifier words
    pub guid: [u32; 4],
    /// Rolling hash of the uncompressed payload
    pub rolling_hash: u64,
    /// Storage flags, see [`StoredAs`]
    pub stored_as: u8,
    /// SHA-1 of the uncompressed payload (version 2+)
    #[br(if(version >= 2))]
    pub sha1: Option<[u8; 20]>,
    /// Which hashes are populated (version 2+)
    #[br(if(version >= 2))]
    pub hash_type: Option<u8>,
    /// Size of the payload after decompression (version 3+)
    #[br(if(version >= 3))]
    pub uncompressed_size: Option<u32>,
}

impl ChunkHeader {
    /// Encoded size of the fields a header of `version` carries
    pub const fn encoded_size(version: u32) -> usize {
        match version {
            0 | 1 => HEADER_SIZE_V1,
            2 => HEADER_SIZE_V2,
            _ => HEADER_SIZE_V3,
        }
    }

    /// Parse the header at the start of a chunk blob
    pub fn parse(data: &[u8]) -> Result<Self> {
        let truncated = |needed| FormatError::ChunkHeaderTruncated {
            needed,
            available: data.len(),
        };

        if data.len() < 8 {
            return Err(truncated(HEADER_SIZE_V1));
        }

        let magic = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        if magic != CHUNK_MAGIC {
            return Err(FormatError::InvalidChunkMagic(magic));
        }

        let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        let needed = Self::encoded_size(version);
        if data.len() < needed {
            return Err(truncated(needed));
        }

        let header = Self::read(&mut Cursor::new(data))?;

        let header_size = header.header_size as usize;
        if header_size < needed {
            return Err(FormatError::ChunkHeaderTruncated {
                needed,
                available: header_size,
            });
        }
        if data.len() < header_size {
            return Err(truncated(header_size));
        }

        Ok(header)
    }

    /// Serialize the header
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(HEADER_SIZE_V3));
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Chunk identifier recorded in the header
    pub const fn guid(&self) -> ChunkGuid {
        ChunkGuid::from_words(self.guid)
    }

    /// Decoded storage mode
    pub fn storage(&self) -> Result<StoredAs> {
        StoredAs::from_byte(self.stored_as)
    }
}
