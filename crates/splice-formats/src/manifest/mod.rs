//! Manifest object model
//!
//! A manifest describes every file of a build as an ordered list of chunk
//! parts, plus four tables keyed by chunk GUID (hash, SHA-1, data group and
//! wire size). The JSON form stores every binary value with the
//! [packed](crate::packed) encoding; all of it is decoded when the manifest is
//! built so that a corrupt manifest fails before any download starts.
//!
//! # Example
//!
//! ```
//! use splice_formats::ChunkGuid;
//! use splice_formats::manifest::{Manifest, ManifestBuilder};
//!
//! let guid = ChunkGuid::from_words([1, 2, 3, 4]);
//! let json = ManifestBuilder::new("App", "1.0")
//!     .chunk(guid, 42, [0; 20], 1, 10)
//!     .file("a.txt", [0; 20], &[(guid, 0, 5), (guid, 5, 5)])
//!     .to_json()
//!     .unwrap();
//!
//! let manifest = Manifest::from_json(&json).unwrap();
//! assert_eq!(manifest.files().len(), 1);
//! assert_eq!(manifest.chunk(&guid).unwrap().hash, 42);
//! ```

mod builder;
mod chunk;
mod file;

pub use builder::ManifestBuilder;
pub use chunk::{CHUNKS_DIR, ChunkInfo};
pub use file::{ChunkPart, ManifestFile};

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{FormatError, Result};
use crate::guid::ChunkGuid;
use crate::packed;

/// JSON manifest document as transported
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RawManifest {
    #[serde(default)]
    pub app_name_string: String,
    #[serde(default)]
    pub build_version_string: String,
    #[serde(default)]
    pub file_manifest_list: Vec<RawFile>,
    #[serde(default)]
    pub chunk_hash_list: BTreeMap<ChunkGuid, String>,
    #[serde(default)]
    pub chunk_sha_list: BTreeMap<ChunkGuid, String>,
    #[serde(default)]
    pub data_group_list: BTreeMap<ChunkGuid, String>,
    #[serde(default)]
    pub chunk_filesize_list: BTreeMap<ChunkGuid, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RawFile {
    pub filename: String,
    pub file_hash: String,
    #[serde(default)]
    pub file_chunk_parts: Vec<RawChunkPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RawChunkPart {
    pub guid: ChunkGuid,
    pub offset: String,
    pub size: String,
}

/// Decoded manifest
///
/// Built once per run and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Manifest {
    app_name: String,
    build_version: String,
    files: Vec<ManifestFile>,
    file_index: HashMap<String, usize>,
    chunks: HashMap<ChunkGuid, ChunkInfo>,
}

impl Manifest {
    /// Decode a JSON manifest
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let raw: RawManifest = serde_json::from_slice(data)?;
        Self::from_raw(raw)
    }

    pub(crate) fn from_raw(mut raw: RawManifest) -> Result<Self> {
        let raw_files = std::mem::take(&mut raw.file_manifest_list);
        let mut files = Vec::with_capacity(raw_files.len());
        let mut file_index = HashMap::with_capacity(raw_files.len());
        let mut chunks = HashMap::new();

        for raw_file in raw_files {
            if file_index.contains_key(&raw_file.filename) {
                return Err(FormatError::corrupt(format!(
                    "duplicate file entry '{}'",
                    raw_file.filename
                )));
            }

            let expected_sha1 = packed::decode_array::<20>(&raw_file.file_hash).map_err(|e| {
                FormatError::corrupt(format!("file '{}' hash: {e}", raw_file.filename))
            })?;

            let mut chunk_parts = Vec::with_capacity(raw_file.file_chunk_parts.len());
            for part in &raw_file.file_chunk_parts {
                let offset = packed::decode_uint32(&part.offset).map_err(|e| {
                    FormatError::corrupt(format!("file '{}' part offset: {e}", raw_file.filename))
                })?;
                let size = packed::decode_uint32(&part.size).map_err(|e| {
                    FormatError::corrupt(format!("file '{}' part size: {e}", raw_file.filename))
                })?;

                if !chunks.contains_key(&part.guid) {
                    let info = chunk_info(&raw, part.guid, &raw_file.filename)?;
                    chunks.insert(part.guid, info);
                }

                chunk_parts.push(ChunkPart::new(part.guid, offset, size));
            }

            file_index.insert(raw_file.filename.clone(), files.len());
            files.push(ManifestFile {
                file_name: raw_file.filename,
                expected_sha1,
                chunk_parts,
            });
        }

        Ok(Self {
            app_name: raw.app_name_string,
            build_version: raw.build_version_string,
            files,
            file_index,
            chunks,
        })
    }

    /// Application name
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Build version string
    pub fn build_version(&self) -> &str {
        &self.build_version
    }

    /// All files in manifest order
    pub fn files(&self) -> &[ManifestFile] {
        &self.files
    }

    /// Look up a file by its exact name
    pub fn file(&self, name: &str) -> Option<&ManifestFile> {
        self.file_index.get(name).map(|&i| &self.files[i])
    }

    /// Metadata of a referenced chunk
    pub fn chunk(&self, guid: &ChunkGuid) -> Option<&ChunkInfo> {
        self.chunks.get(guid)
    }

    /// Number of distinct chunks referenced by the manifest
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Files to process after applying an optional allow-list
    ///
    /// Names are matched exactly and case-sensitively. The result keeps
    /// manifest order regardless of the order of the allow-list.
    pub fn select(&self, filter: Option<&[String]>) -> Vec<&ManifestFile> {
        let Some(names) = filter else {
            return self.files.iter().collect();
        };

        let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();
        for name in &wanted {
            if !self.file_index.contains_key(*name) {
                tracing::warn!("Filtered file {} is not in the manifest", name);
            }
        }

        self.files
            .iter()
            .filter(|f| wanted.contains(f.file_name.as_str()))
            .collect()
    }
}

fn chunk_info(raw: &RawManifest, guid: ChunkGuid, file_name: &str) -> Result<ChunkInfo> {
    let hash = lookup(&raw.chunk_hash_list, guid, "ChunkHashList", file_name)?;
    let sha1 = lookup(&raw.chunk_sha_list, guid, "ChunkShaList", file_name)?;
    let data_group = lookup(&raw.data_group_list, guid, "DataGroupList", file_name)?;
    let file_size = lookup(&raw.chunk_filesize_list, guid, "ChunkFilesizeList", file_name)?;

    let data_group = packed::decode_uint64(data_group)?;
    let data_group = u8::try_from(data_group).map_err(|_| {
        FormatError::corrupt(format!("chunk {guid} data group {data_group} out of range"))
    })?;

    Ok(ChunkInfo {
        guid,
        hash: packed::decode_uint64(hash)?,
        sha1: packed::decode_array::<20>(sha1)?,
        data_group,
        file_size: packed::decode_uint64(file_size)?,
    })
}

fn lookup<'a>(
    table: &'a BTreeMap<ChunkGuid, String>,
    guid: ChunkGuid,
    table_name: &str,
    file_name: &str,
) -> Result<&'a str> {
    table.get(&guid).map(String::as_str).ok_or_else(|| {
        FormatError::corrupt(format!(
            "chunk {guid} used by '{file_name}' has no {table_name} entry"
        ))
    })
}
