//! Chunk payload compression

use std::io::Read;

use flate2::Compression;
use flate2::read::{ZlibDecoder, ZlibEncoder};

use crate::error::{FormatError, Result};

/// Maximum allowed decompression size (64 MiB)
///
/// Chunks are about 1 MiB when uncompressed; anything far beyond that is
/// treated as a compression bomb.
pub const MAX_DECOMPRESSION_SIZE: usize = 64 * 1024 * 1024;

/// Compress a payload as a zlib stream
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(data, Compression::default());
    let mut compressed = Vec::new();
    encoder
        .read_to_end(&mut compressed)
        .map_err(|e| FormatError::Decompression(format!("zlib compression failed: {e}")))?;
    Ok(compressed)
}

/// Inflate a zlib stream
///
/// `size_hint` pre-sizes the output buffer when the header records the
/// uncompressed size.
pub fn decompress(data: &[u8], size_hint: Option<usize>) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut decompressed = Vec::with_capacity(size_hint.unwrap_or(0).min(MAX_DECOMPRESSION_SIZE));

    // Read in chunks to enforce size limit
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = decoder
            .read(&mut buffer)
            .map_err(|e| FormatError::Decompression(format!("zlib decompression failed: {e}")))?;

        if bytes_read == 0 {
            break;
        }

        if decompressed.len() + bytes_read > MAX_DECOMPRESSION_SIZE {
            return Err(FormatError::Decompression(format!(
                "decompressed size exceeds limit of {MAX_DECOMPRESSION_SIZE} bytes"
            )));
        }

        decompressed.extend_from_slice(&buffer[..bytes_read]);
    }

    Ok(decompressed)
}
