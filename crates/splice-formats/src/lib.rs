//! Manifest, catalog and chunk wire formats for splice
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // Format-specific terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
#![allow(clippy::derive_partial_eq_without_eq)] // Binary format structs
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! This crate provides symmetric (parser and builder) implementations of the
//! formats a splice installation consumes:
//!
//! # Supported Formats
//!
//! - **Packed encoding**: the text-safe decimal encoding used for raw bytes and
//!   integers inside JSON manifests
//! - **Manifest**: files, their ordered chunk parts and the per-chunk metadata
//!   tables (hash, SHA-1, data group, wire size)
//! - **Catalog**: the build index that points at a manifest
//! - **Chunk**: the binary header prefixing every chunk blob and its optional
//!   zlib-compressed payload
//!
//! # Design Principles
//!
//! - **Symmetric Operations**: every format can be parsed and built
//! - **Fail Early**: packed manifest fields are decoded when the manifest is
//!   built, so a corrupt manifest never reaches the installer
//! - **Type Safety**: chunk identifiers are a dedicated [`ChunkGuid`] type

#![warn(missing_docs)]

/// Catalog document mapping a build to its manifest location
pub mod catalog;
pub mod chunk;
mod error;
mod guid;
/// Manifest object model: files, chunk parts and chunk metadata
///
/// See the [`manifest`] module for parsing and builder documentation.
pub mod manifest;
pub mod packed;

pub use error::{FormatError, Result};
pub use guid::ChunkGuid;
