//! Catalog and manifest download

use bytes::Bytes;
use splice_formats::catalog::Catalog;
use splice_formats::manifest::Manifest;
use url::Url;

use crate::cdn::join_path;
use crate::error::{ProtocolError, Result};
use crate::retry::RetryPolicy;
use crate::transport::HttpClient;

/// Fetches catalog and manifest documents over HTTP
///
/// Both the decoded document and the raw bytes are returned so callers can
/// cache exactly what was served.
#[derive(Debug, Clone)]
pub struct ManifestClient {
    http_client: HttpClient,
    retry_policy: RetryPolicy,
}

impl ManifestClient {
    /// Create a client over an existing transport
    pub fn new(http_client: HttpClient, retry_policy: RetryPolicy) -> Self {
        Self {
            http_client,
            retry_policy,
        }
    }

    async fn download(&self, url: &str) -> Result<Bytes> {
        self.retry_policy
            .execute(|| self.http_client.get_bytes(url))
            .await
    }

    /// Download and decode a catalog
    pub async fn fetch_catalog(&self, url: &str) -> Result<(Catalog, Bytes)> {
        tracing::info!("Fetching catalog from {}", url);
        let raw = self.download(url).await?;
        let catalog = Catalog::from_json(&raw)?;
        Ok((catalog, raw))
    }

    /// Download and decode a manifest
    pub async fn fetch_manifest(&self, url: &str) -> Result<(Manifest, Bytes)> {
        tracing::info!("Fetching manifest from {}", url);
        let raw = self.download(url).await?;
        let manifest = Manifest::from_json(&raw)?;
        Ok((manifest, raw))
    }

    /// URL of the manifest a catalog points at
    ///
    /// The first manifest location wins; its query parameters are appended in
    /// catalog order.
    pub fn manifest_url(catalog: &Catalog) -> Result<Url> {
        let location = catalog.manifest_location()?;
        let mut url = Url::parse(&location.uri).map_err(|e| ProtocolError::InvalidUrl {
            url: location.uri.clone(),
            reason: e.to_string(),
        })?;

        if !location.query_params.is_empty() {
            let mut query = url.query_pairs_mut();
            for param in &location.query_params {
                query.append_pair(&param.name, &param.value);
            }
        }
        Ok(url)
    }

    /// URL of a manifest identified by id under a chunk store base
    pub fn manifest_id_url(base: &Url, id: &str) -> String {
        join_path(base, &format!("{id}.manifest"))
    }
}
