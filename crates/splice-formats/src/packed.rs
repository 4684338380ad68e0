//! Packed decimal encoding used by JSON manifests
//!
//! JSON manifests cannot carry raw bytes, so every byte is written as a
//! zero-padded three digit decimal group (`000` to `255`). Multi-byte values
//! are the concatenation of their groups with no separator, most significant
//! byte first.
//!
//! ```
//! use splice_formats::packed;
//!
//! assert_eq!(packed::decode_bytes("072105").unwrap(), b"Hi");
//! assert_eq!(packed::decode_uint32("000000001000").unwrap(), 256);
//! ```

use std::fmt::Write;

use crate::error::{FormatError, Result};

/// Characters per encoded byte
pub const GROUP_WIDTH: usize = 3;

/// Decode a packed string into its raw bytes
pub fn decode_bytes(s: &str) -> Result<Vec<u8>> {
    let raw = s.as_bytes();
    if raw.len() % GROUP_WIDTH != 0 {
        return Err(FormatError::corrupt(format!(
            "packed field length {} is not a multiple of {GROUP_WIDTH}",
            raw.len()
        )));
    }

    raw.chunks_exact(GROUP_WIDTH)
        .enumerate()
        .map(|(index, group)| decode_group(group, index))
        .collect()
}

fn decode_group(group: &[u8], index: usize) -> Result<u8> {
    let mut value: u16 = 0;
    for &c in group {
        if !c.is_ascii_digit() {
            return Err(FormatError::corrupt(format!(
                "packed group {index} contains non-digit byte 0x{c:02X}"
            )));
        }
        value = value * 10 + u16::from(c - b'0');
    }
    u8::try_from(value)
        .map_err(|_| FormatError::corrupt(format!("packed group {index} overflows a byte: {value}")))
}

/// Decode a packed field of exactly `N` bytes
pub fn decode_array<const N: usize>(s: &str) -> Result<[u8; N]> {
    let bytes = decode_bytes(s)?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| FormatError::corrupt(format!("packed field is {len} bytes, expected {N}")))
}

/// Decode a packed big-endian 32-bit unsigned integer (exactly four groups)
pub fn decode_uint32(s: &str) -> Result<u32> {
    decode_array::<4>(s).map(u32::from_be_bytes)
}

/// Decode a packed big-endian unsigned integer of one to eight groups
pub fn decode_uint64(s: &str) -> Result<u64> {
    let bytes = decode_bytes(s)?;
    if bytes.is_empty() || bytes.len() > 8 {
        return Err(FormatError::corrupt(format!(
            "packed integer is {} bytes, expected 1 to 8",
            bytes.len()
        )));
    }
    Ok(bytes
        .iter()
        .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte)))
}

/// Encode raw bytes into the packed form
pub fn encode_bytes(bytes: &[u8]) -> String {
    bytes.iter().fold(
        String::with_capacity(bytes.len() * GROUP_WIDTH),
        |mut out, byte| {
            let _ = write!(out, "{byte:03}");
            out
        },
    )
}

/// Encode a 32-bit integer as four big-endian groups
pub fn encode_uint32(value: u32) -> String {
    encode_bytes(&value.to_be_bytes())
}

/// Encode a 64-bit integer as eight big-endian groups
pub fn encode_uint64(value: u64) -> String {
    encode_bytes(&value.to_be_bytes())
}
