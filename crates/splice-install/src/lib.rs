//! # splice-install
//!
//! Rebuilds an application's file set from a chunked build manifest.
//!
//! Every file in a manifest is an ordered list of byte ranges taken from
//! content-addressed chunks. Chunks shared between files are downloaded once:
//! a reference count per chunk, seeded over the selected files, decides how
//! long a decoded payload stays in memory. Files that already match their
//! expected SHA-1 are left alone, and everything written is re-hashed at the
//! end of the run.
//!
//! ## Example
//!
//! ```no_run
//! use splice_install::{InstallConfig, Installer, ManifestStore, default_fetcher};
//! use splice_protocol::{HttpClient, ManifestClient};
//!
//! # async fn example() -> splice_install::Result<()> {
//! let config = InstallConfig::new("files", "cache", ["http://cdn.example.com/CloudDir"]);
//! let http = HttpClient::with_config(&config.http_config())?;
//!
//! let store = ManifestStore::new(ManifestClient::new(http.clone(), config.retry_policy()));
//! let manifest = store.load(&config).await?;
//!
//! let installer = Installer::new(config.clone(), default_fetcher(&config, http)?);
//! let summary = installer.run(&manifest).await?;
//! summary.log();
//! # Ok(())
//! # }
//! ```

#![allow(clippy::missing_errors_doc)]

pub mod assembler;
pub mod config;
pub mod error;
pub mod installer;
pub mod store;
pub mod summary;
pub mod verify;

pub use assembler::{FileAssembler, FileFailure, FileOutcome, destination};
pub use config::{InstallConfig, LogFormat};
pub use error::{InstallError, Result};
pub use installer::{Installer, default_fetcher};
pub use store::ManifestStore;
pub use summary::RunSummary;
pub use verify::{HashMismatch, OnDisk, check_existing, sha1_file, verify_files};
