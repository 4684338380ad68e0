//! # splice-protocol - chunk store and manifest network layer
//!
//! Network side of a splice install:
//!
//! 1. **Chunk delivery** ([`CdnClient`], [`CdnChunkFetcher`]): downloads chunk
//!    blobs from one of several mirrors, decodes them and checks that the
//!    store returned the chunk that was asked for
//! 2. **Resilience** ([`RetryPolicy`], [`RetryingFetcher`]): exponential
//!    backoff with jitter for transient failures (timeouts, 5xx, 429)
//! 3. **Documents** ([`ManifestClient`]): catalog and manifest download
//!
//! Everything that consumes chunks is written against the [`ChunkFetcher`]
//! trait, so tests and alternative stores can replace the HTTP client.
//!
//! ## Example
//!
//! ```rust,no_run
//! use splice_protocol::{
//!     CdnChunkFetcher, CdnClient, ChunkFetcher, HttpClient, RetryPolicy, RetryingFetcher,
//!     parse_base_urls,
//! };
//!
//! # async fn example(chunk: splice_formats::manifest::ChunkInfo) -> splice_protocol::Result<()> {
//! let bases = parse_base_urls(&["http://cdn1.example.com/CloudDir", "http://cdn2.example.com/CloudDir"])?;
//! let fetcher = RetryingFetcher::new(
//!     CdnChunkFetcher::new(CdnClient::new(HttpClient::new()?), bases)?,
//!     RetryPolicy::from_env(),
//! );
//!
//! let payload = fetcher.fetch(&chunk).await?;
//! println!("{} bytes", payload.len());
//! # Ok(())
//! # }
//! ```

#![allow(clippy::missing_errors_doc)]

pub mod cdn;
pub mod error;
pub mod fetcher;
pub mod manifest;
pub mod retry;
pub mod transport;

pub use cdn::{CdnChunkFetcher, CdnClient, parse_base_url, parse_base_urls};
pub use error::{ProtocolError, Result};
pub use fetcher::{ChunkFetcher, RetryingFetcher};
pub use manifest::ManifestClient;
pub use retry::RetryPolicy;
pub use transport::{HttpClient, HttpConfig};
