//! HTTP transport shared by the chunk store and manifest clients

use bytes::Bytes;
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ProtocolError, Result};

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("splice/", env!("CARGO_PKG_VERSION"));

/// Install the process-wide rustls crypto provider
///
/// reqwest is built without a bundled provider; the first client created
/// installs `ring`. Later calls are no-ops.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// HTTP transport client with connection pooling
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a client with the default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        install_crypto_provider();

        let mut builder = ClientBuilder::new()
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .tcp_nodelay(true)
            .tcp_keepalive(config.tcp_keepalive)
            // Chunk stores are commonly plain HTTP mirrors
            .https_only(false)
            .redirect(reqwest::redirect::Policy::limited(3))
            .user_agent(config.user_agent.clone());

        // Compression configuration
        if config.enable_compression {
            builder = builder.gzip(true).brotli(true).deflate(true);
        }

        let client = builder.build()?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// GET `url` and return the body of a 2xx response
    pub async fn get_bytes(&self, url: &str) -> Result<Bytes> {
        tracing::trace!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ProtocolError::from_reqwest)?;

        let status = response.status();
        if status.is_success() {
            response.bytes().await.map_err(ProtocolError::from_reqwest)
        } else if status.is_server_error() {
            Err(ProtocolError::ServerError(status))
        } else {
            Err(ProtocolError::HttpStatus(status))
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Request timeout, covering the whole body
    pub timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// TCP keep-alive duration
    pub tcp_keepalive: Option<Duration>,

    /// Enable transfer compression (gzip, brotli, deflate)
    pub enable_compression: bool,

    /// `User-Agent` header value
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_idle_timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 10,
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            tcp_keepalive: Some(Duration::from_secs(60)),
            enable_compression: true,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl HttpConfig {
    /// Default configuration with a different request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_bytes_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"body".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();

        let body = client.get_bytes(&format!("{}/ok", server.uri())).await.unwrap();
        assert_eq!(&body[..], b"body");

        let err = client
            .get_bytes(&format!("{}/broken", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::ServerError(s) if s.as_u16() == 503));

        let err = client
            .get_bytes(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::HttpStatus(s) if s.as_u16() == 404));
    }

    #[tokio::test]
    async fn test_timeout_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let config = HttpConfig::default().with_timeout(Duration::from_millis(50));
        let client = HttpClient::with_config(&config).unwrap();

        let err = client.get_bytes(&server.uri()).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Timeout));
        assert!(err.should_retry());
    }
}
