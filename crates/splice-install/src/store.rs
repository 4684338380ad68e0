//! Manifest loading and on-disk caching of catalog and manifest documents
//!
//! Sources are tried in this order:
//!
//! 1. `--manifest <id>`: `{first base URL}/{id}.manifest`, not cached
//! 2. `--manifest-file <path>`
//! 3. `manifest.json` in the cache directory
//! 4. the catalog (`catalog.json` in the cache directory, else fetched from
//!    `--catalog-url` and cached), then the manifest it points at, cached as
//!    `manifest.json`

use splice_formats::catalog::Catalog;
use splice_formats::manifest::Manifest;
use splice_protocol::{ManifestClient, ProtocolError, parse_base_urls};
use std::io;
use std::path::Path;

use crate::config::InstallConfig;
use crate::error::{InstallError, Result};

/// Locates the manifest for a run
#[derive(Debug, Clone)]
pub struct ManifestStore {
    client: ManifestClient,
}

impl ManifestStore {
    /// Create a store that downloads through `client`
    pub fn new(client: ManifestClient) -> Self {
        Self { client }
    }

    /// Load the manifest selected by `config`
    pub async fn load(&self, config: &InstallConfig) -> Result<Manifest> {
        if let Some(id) = &config.manifest_id {
            let bases = parse_base_urls(config.urls.as_slice())?;
            let base = bases
                .first()
                .ok_or(InstallError::Protocol(ProtocolError::NoEndpoints))?;
            let url = ManifestClient::manifest_id_url(base, id);
            let (manifest, _) = self.client.fetch_manifest(&url).await?;
            return Ok(manifest);
        }

        if let Some(path) = &config.manifest_file {
            tracing::info!("Loading manifest from {}", path.display());
            let raw = tokio::fs::read(path).await?;
            return Ok(Manifest::from_json(&raw)?);
        }

        let manifest_path = config.manifest_cache_path();
        if let Some(raw) = read_cached(&manifest_path).await? {
            tracing::info!("Using cached manifest {}", manifest_path.display());
            return Ok(Manifest::from_json(&raw)?);
        }

        let catalog = self.catalog(config).await?;
        if let Ok(element) = catalog.element() {
            tracing::info!(
                "Catalog lists {} {} ({})",
                element.app_name,
                element.build_version,
                element.label_name
            );
        }

        let url = ManifestClient::manifest_url(&catalog)
            .map_err(|e| InstallError::from(e).catalog())?;
        let (manifest, raw) = self.client.fetch_manifest(url.as_str()).await?;
        write_cached(&manifest_path, &raw).await?;

        Ok(manifest)
    }

    async fn catalog(&self, config: &InstallConfig) -> Result<Catalog> {
        let catalog_path = config.catalog_cache_path();
        if let Some(raw) = read_cached(&catalog_path).await? {
            tracing::info!("Using cached catalog {}", catalog_path.display());
            return Catalog::from_json(&raw).map_err(|e| InstallError::from(e).catalog());
        }

        let Some(url) = &config.catalog_url else {
            return Err(InstallError::NoManifestSource);
        };

        let (catalog, raw) = self
            .client
            .fetch_catalog(url)
            .await
            .map_err(|e| InstallError::from(e).catalog())?;
        write_cached(&catalog_path, &raw).await?;

        Ok(catalog)
    }
}

async fn read_cached(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_cached(path: &Path, raw: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, raw).await?;
    tracing::debug!("Cached {} bytes at {}", raw.len(), path.display());
    Ok(())
}
