//! Install configuration management.
//!
//! Configuration is an explicit value handed to the installer. The binary
//! loads it from CLI arguments and environment variables; library users and
//! tests build it with [`InstallConfig::new`].
//!
//! # Configuration Sources
//!
//! - CLI arguments (`--install-dir`, `--url`, `--files`, etc.)
//! - Environment variables (`SPLICE_INSTALL_DIR`, `SPLICE_URLS`, etc.)
//! - Default values
//!
//! # Example
//!
//! ```no_run
//! use splice_install::InstallConfig;
//!
//! let config = InstallConfig::from_args();
//! config.validate().expect("Invalid configuration");
//!
//! println!("Installing into {}", config.install_dir.display());
//! ```

use clap::{Parser, ValueEnum};
use splice_protocol::{HttpConfig, RetryPolicy};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{InstallError, Result};

/// File name of the cached manifest inside the cache directory
pub const MANIFEST_CACHE_FILE: &str = "manifest.json";
/// File name of the cached catalog inside the cache directory
pub const CATALOG_CACHE_FILE: &str = "catalog.json";

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Install configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "splice",
    about = "Install an application build from a chunked manifest",
    version
)]
pub struct InstallConfig {
    /// Directory files are installed into
    #[arg(long, env = "SPLICE_INSTALL_DIR", default_value = "files")]
    pub install_dir: PathBuf,

    /// Directory holding the cached catalog and manifest
    #[arg(long = "cache", env = "SPLICE_CACHE_DIR", default_value = "cache")]
    pub cache_dir: PathBuf,

    /// Chunk store base URLs, comma-separated; one is picked per chunk
    #[arg(long = "url", env = "SPLICE_URLS", value_delimiter = ',')]
    pub urls: Vec<String>,

    /// Download a specific manifest by id from the first base URL
    #[arg(long = "manifest", env = "SPLICE_MANIFEST")]
    pub manifest_id: Option<String>,

    /// Load the manifest from a local file
    #[arg(long, env = "SPLICE_MANIFEST_FILE")]
    pub manifest_file: Option<PathBuf>,

    /// Catalog URL used when no manifest is given or cached
    #[arg(long, env = "SPLICE_CATALOG_URL")]
    pub catalog_url: Option<String>,

    /// Only install these files (exact names, comma-separated)
    #[arg(long, env = "SPLICE_FILES", value_delimiter = ',')]
    pub files: Option<Vec<String>>,

    /// Skip the integrity check after installing
    #[arg(long = "skipcheck", env = "SPLICE_SKIP_CHECK")]
    pub skip_check: bool,

    /// Retries per chunk for transient download failures
    #[arg(long, env = "SPLICE_MAX_RETRIES", default_value_t = 3)]
    pub retries: u32,

    /// HTTP request timeout in seconds
    #[arg(long, env = "SPLICE_TIMEOUT", default_value_t = 60)]
    pub timeout: u64,

    /// Log output format
    #[arg(long, env = "SPLICE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl InstallConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Configuration with defaults for everything but the directories and URLs
    pub fn new(
        install_dir: impl Into<PathBuf>,
        cache_dir: impl Into<PathBuf>,
        urls: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            install_dir: install_dir.into(),
            cache_dir: cache_dir.into(),
            urls: urls.into_iter().map(Into::into).collect(),
            manifest_id: None,
            manifest_file: None,
            catalog_url: None,
            files: None,
            skip_check: false,
            retries: 3,
            timeout: 60,
            log_format: LogFormat::Text,
        }
    }

    /// Restrict the run to the named files
    #[must_use]
    pub fn with_files(mut self, files: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.files = Some(files.into_iter().map(Into::into).collect());
        self
    }

    /// Exact-name allow-list, if any
    pub fn file_filter(&self) -> Option<&[String]> {
        self.files.as_deref()
    }

    /// Retry policy for chunk and document downloads
    ///
    /// Backoff settings come from the `SPLICE_*` retry variables; the retry
    /// count comes from `--retries`.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_env().with_max_attempts(self.retries)
    }

    /// HTTP transport settings
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig::default().with_timeout(Duration::from_secs(self.timeout))
    }

    /// Path of the cached manifest
    pub fn manifest_cache_path(&self) -> PathBuf {
        self.cache_dir.join(MANIFEST_CACHE_FILE)
    }

    /// Path of the cached catalog
    pub fn catalog_cache_path(&self) -> PathBuf {
        self.cache_dir.join(CATALOG_CACHE_FILE)
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::Config`] if:
    /// - No chunk store base URL is configured
    /// - A base URL does not parse as http(s)
    /// - The manifest file does not exist
    /// - The request timeout is zero
    pub fn validate(&self) -> Result<()> {
        splice_protocol::parse_base_urls(self.urls.as_slice())
            .map_err(|e| InstallError::Config(e.to_string()))?;

        if let Some(path) = &self.manifest_file
            && !path.exists()
        {
            return Err(InstallError::Config(format!(
                "manifest file not found: {}",
                path.display()
            )));
        }

        if self.timeout == 0 {
            return Err(InstallError::Config(
                "timeout must be at least one second".to_string(),
            ));
        }

        if let Some(files) = &self.files
            && files.iter().all(|f| f.trim().is_empty())
        {
            return Err(InstallError::Config("--files is empty".to_string()));
        }

        Ok(())
    }

    /// Install root
    pub fn install_root(&self) -> &Path {
        &self.install_dir
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let config = InstallConfig::try_parse_from([
            "splice",
            "--install-dir",
            "/tmp/out",
            "--url",
            "http://a.example.com,http://b.example.com",
            "--files",
            "a.txt,b.bin",
            "--skipcheck",
            "--retries",
            "0",
        ])
        .unwrap();

        assert_eq!(config.install_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.cache_dir, PathBuf::from("cache"));
        assert_eq!(config.urls, vec!["http://a.example.com", "http://b.example.com"]);
        assert_eq!(
            config.file_filter(),
            Some(&["a.txt".to_string(), "b.bin".to_string()][..])
        );
        assert!(config.skip_check);
        assert_eq!(config.retry_policy().max_attempts, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_urls() {
        let config = InstallConfig::new("files", "cache", Vec::<String>::new());
        assert!(matches!(config.validate(), Err(InstallError::Config(_))));

        let config = InstallConfig::new("files", "cache", ["ftp://example.com"]);
        assert!(matches!(config.validate(), Err(InstallError::Config(_))));
    }

    #[test]
    fn test_validate_manifest_file() {
        let mut config = InstallConfig::new("files", "cache", ["http://example.com"]);
        config.manifest_file = Some(PathBuf::from("/definitely/not/here.json"));
        assert!(matches!(config.validate(), Err(InstallError::Config(_))));
    }

    #[test]
    fn test_cache_paths() {
        let config = InstallConfig::new("files", "/var/cache/splice", ["http://example.com"]);
        assert_eq!(
            config.manifest_cache_path(),
            PathBuf::from("/var/cache/splice/manifest.json")
        );
        assert_eq!(
            config.catalog_cache_path(),
            PathBuf::from("/var/cache/splice/catalog.json")
        );
    }
}
