//! File integrity checks
//!
//! Used twice per run: before assembly, to accept files that are already
//! correct on disk, and after assembly, to report files whose content does
//! not match the manifest.

use sha1::{Digest, Sha1};
use splice_formats::manifest::ManifestFile;
use std::fmt;
use std::io;
use std::path::Path;
use tokio::io::AsyncReadExt;

use crate::assembler::destination;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Stream a file through SHA-1
pub async fn sha1_file(path: &Path) -> io::Result<[u8; 20]> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha1::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hasher.finalize().into())
}

/// State of a destination before assembly
#[derive(Debug)]
pub enum OnDisk {
    /// Nothing there yet
    Missing,
    /// Content matches the manifest
    Valid,
    /// Content differs; holds the actual digest
    Stale([u8; 20]),
    /// Present but could not be read
    Unreadable(io::Error),
}

/// Compare an existing destination with its expected digest
pub async fn check_existing(path: &Path, expected: &[u8; 20]) -> OnDisk {
    match sha1_file(path).await {
        Ok(actual) if &actual == expected => OnDisk::Valid,
        Ok(actual) => OnDisk::Stale(actual),
        Err(e) if e.kind() == io::ErrorKind::NotFound => OnDisk::Missing,
        Err(e) => OnDisk::Unreadable(e),
    }
}

/// Installed file whose content does not match the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashMismatch {
    /// Manifest file name
    pub file_name: String,
    /// Expected SHA-1, hex
    pub expected: String,
    /// Actual SHA-1, hex; `None` when the file could not be read
    pub actual: Option<String>,
}

impl fmt::Display for HashMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.actual {
            Some(actual) => write!(
                f,
                "{}: expected {}, got {}",
                self.file_name, self.expected, actual
            ),
            None => write!(
                f,
                "{}: expected {}, file unreadable",
                self.file_name, self.expected
            ),
        }
    }
}

/// Re-hash installed files and collect every mismatch
///
/// Never fails and never touches the files.
pub async fn verify_files<'a>(
    root: &Path,
    files: impl IntoIterator<Item = &'a ManifestFile>,
) -> Vec<HashMismatch> {
    let mut mismatches = Vec::new();

    for file in files {
        let actual = match destination(root, &file.file_name) {
            Ok(path) => sha1_file(&path).await,
            Err(e) => Err(io::Error::new(io::ErrorKind::InvalidInput, e.to_string())),
        };

        let actual = match actual {
            Ok(digest) if digest == file.expected_sha1 => continue,
            Ok(digest) => Some(hex::encode(digest)),
            Err(e) => {
                tracing::debug!("Cannot read {}: {}", file.file_name, e);
                None
            }
        };

        let mismatch = HashMismatch {
            file_name: file.file_name.clone(),
            expected: file.expected_sha1_hex(),
            actual,
        };
        tracing::warn!("Hash mismatch: {}", mismatch);
        mismatches.push(mismatch);
    }

    mismatches
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn digest(data: &[u8]) -> [u8; 20] {
        Sha1::digest(data).into()
    }

    fn manifest_file(name: &str, data: &[u8]) -> ManifestFile {
        ManifestFile {
            file_name: name.to_string(),
            expected_sha1: digest(data),
            chunk_parts: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_sha1_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        tokio::fs::write(&path, b"HelloWorld").await.unwrap();

        assert_eq!(
            hex::encode(sha1_file(&path).await.unwrap()),
            "db8ac1c259eb89d4a131b253bacfca5f319d54f2"
        );
    }

    #[tokio::test]
    async fn test_check_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");

        assert!(matches!(
            check_existing(&path, &digest(b"HelloWorld")).await,
            OnDisk::Missing
        ));

        tokio::fs::write(&path, b"HelloWorld").await.unwrap();
        assert!(matches!(
            check_existing(&path, &digest(b"HelloWorld")).await,
            OnDisk::Valid
        ));
        assert!(matches!(
            check_existing(&path, &digest(b"Other")).await,
            OnDisk::Stale(actual) if actual == digest(b"HelloWorld")
        ));
    }

    #[tokio::test]
    async fn test_verify_files_reports_mismatches() {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("good"), b"good").await.unwrap();
        tokio::fs::write(dir.path().join("bad"), b"tampered").await.unwrap();

        let files = [
            manifest_file("good", b"good"),
            manifest_file("bad", b"bad"),
            manifest_file("gone", b"gone"),
        ];
        let mismatches = verify_files(dir.path(), &files).await;

        assert_eq!(mismatches.len(), 2);
        assert_eq!(mismatches[0].file_name, "bad");
        assert_eq!(mismatches[0].expected, hex::encode(digest(b"bad")));
        assert_eq!(
            mismatches[0].actual.as_deref(),
            Some(hex::encode(digest(b"tampered")).as_str())
        );
        assert_eq!(mismatches[1].file_name, "gone");
        assert!(mismatches[1].actual.is_none());
    }
}
