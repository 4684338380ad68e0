//! Error types for the installer.
//!
//! All errors use thiserror for consistent error handling across the codebase.

use splice_formats::{ChunkGuid, FormatError};
use splice_protocol::ProtocolError;
use thiserror::Error;

/// Installer errors.
///
/// Only some of these end a run; see [`InstallError::is_fatal`]. The rest are
/// scoped to the file being assembled and end up in the run summary.
#[derive(Debug, Error)]
pub enum InstallError {
    /// Manifest or catalog document cannot be used
    #[error("Manifest error: {0}")]
    Manifest(#[from] FormatError),

    /// Download or chunk decode failure
    #[error("{0}")]
    Protocol(#[from] ProtocolError),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Chunk part reaches past the end of the decoded payload
    #[error(
        "Chunk part {offset}+{size} of {guid} is outside its {payload_len} byte payload"
    )]
    ChunkRange {
        /// Chunk the part refers to
        guid: ChunkGuid,
        /// Part offset
        offset: u32,
        /// Part size
        size: u32,
        /// Decoded payload length
        payload_len: usize,
    },

    /// Part refers to a chunk the manifest has no metadata for
    #[error("No metadata for chunk {0}")]
    MissingChunk(ChunkGuid),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Neither a manifest nor a catalog could be located
    #[error("No manifest source: pass --manifest, --manifest-file or --catalog-url")]
    NoManifestSource,

    /// Catalog shape is not supported
    #[error("Unsupported catalog: {0}")]
    UnsupportedCatalog(String),

    /// Run was cancelled
    #[error("Cancelled")]
    Cancelled,
}

impl InstallError {
    /// Whether this error aborts the whole run rather than one file
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Manifest(e) => e.is_manifest_error(),
            Self::MissingChunk(_)
            | Self::Config(_)
            | Self::NoManifestSource
            | Self::UnsupportedCatalog(_)
            | Self::Cancelled => true,
            Self::Protocol(_) | Self::Io(_) | Self::ChunkRange { .. } => false,
        }
    }

    /// Surface unsupported catalogs under their own variant
    pub(crate) fn catalog(self) -> Self {
        match self {
            Self::Manifest(FormatError::UnsupportedCatalog(reason))
            | Self::Protocol(ProtocolError::Format(FormatError::UnsupportedCatalog(reason))) => {
                Self::UnsupportedCatalog(reason)
            }
            other => other,
        }
    }
}

/// Result type for installer operations
pub type Result<T> = std::result::Result<T, InstallError>;
