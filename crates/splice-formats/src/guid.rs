//! Chunk identifiers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FormatError;

/// 128-bit chunk identifier
///
/// Manifests spell it as 32 hex digits; chunk headers store it as four
/// little-endian `u32` words. Both forms map onto the same four words, so a
/// downloaded header can be checked against the GUID that was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ChunkGuid([u32; 4]);

impl ChunkGuid {
    /// Create from the four words of a chunk header
    pub const fn from_words(words: [u32; 4]) -> Self {
        Self(words)
    }

    /// The four words in header order
    pub const fn words(&self) -> [u32; 4] {
        self.0
    }
}

impl FromStr for ChunkGuid {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 || !s.bytes().all(|c| c.is_ascii_hexdigit()) {
            return Err(FormatError::corrupt(format!("invalid chunk GUID '{s}'")));
        }

        let mut words = [0u32; 4];
        for (i, word) in words.iter_mut().enumerate() {
            let digits = &s[i * 8..(i + 1) * 8];
            *word = u32::from_str_radix(digits, 16)
                .map_err(|_| FormatError::corrupt(format!("invalid chunk GUID '{s}'")))?;
        }
        Ok(Self(words))
    }
}

impl fmt::Display for ChunkGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a:08X}{b:08X}{c:08X}{d:08X}")
    }
}

impl Serialize for ChunkGuid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChunkGuid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
