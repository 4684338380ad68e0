//! Format error types

use thiserror::Error;

/// Errors raised while decoding manifests, catalogs and chunk blobs
#[derive(Debug, Error)]
pub enum FormatError {
    /// Manifest content cannot be used to reconstruct anything
    #[error("manifest corrupt: {0}")]
    ManifestCorrupt(String),

    /// Catalog shape is not one we know how to resolve
    #[error("unsupported catalog: {0}")]
    UnsupportedCatalog(String),

    /// JSON document could not be decoded
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Chunk blob is shorter than its header
    #[error("chunk header truncated: need {needed} bytes, got {available}")]
    ChunkHeaderTruncated {
        /// Bytes the header requires
        needed: usize,
        /// Bytes that were available
        available: usize,
    },

    /// Chunk blob does not start with the chunk magic
    #[error("invalid chunk magic: 0x{0:08X}")]
    InvalidChunkMagic(u32),

    /// Header declares a storage mode we cannot decode
    #[error("unknown chunk encoding (stored as {0})")]
    UnknownChunkEncoding(u8),

    /// Header declares more payload than the blob carries
    #[error("chunk payload truncated: header declares {declared} bytes, got {available}")]
    ChunkPayloadTruncated {
        /// Payload size declared by the header
        declared: usize,
        /// Payload bytes present after the header
        available: usize,
    },

    /// Decompressed payload does not match the size recorded in the header
    #[error("chunk size mismatch: header declares {expected} bytes, decoded {actual}")]
    ChunkSizeMismatch {
        /// Uncompressed size recorded in the header
        expected: usize,
        /// Bytes actually produced
        actual: usize,
    },

    /// Compression or decompression failed
    #[error("decompression failed: {0}")]
    Decompression(String),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    Binary(#[from] binrw::Error),
}

impl FormatError {
    /// Build a [`FormatError::ManifestCorrupt`] from anything printable
    pub fn corrupt(reason: impl Into<String>) -> Self {
        Self::ManifestCorrupt(reason.into())
    }

    /// Whether this error invalidates the whole manifest rather than one chunk
    pub fn is_manifest_error(&self) -> bool {
        matches!(
            self,
            Self::ManifestCorrupt(_) | Self::UnsupportedCatalog(_) | Self::Json(_)
        )
    }
}

/// Result type for format operations
pub type Result<T> = std::result::Result<T, FormatError>;
