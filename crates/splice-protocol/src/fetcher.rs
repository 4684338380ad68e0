//! Chunk fetcher abstraction

use async_trait::async_trait;
use bytes::Bytes;
use splice_formats::manifest::ChunkInfo;
use std::sync::Arc;

use crate::error::Result;
use crate::retry::RetryPolicy;

/// Source of decompressed chunk payloads
///
/// Implementations decide where a chunk is fetched from. A returned payload
/// has already been decoded and checked to belong to the requested chunk.
#[async_trait]
pub trait ChunkFetcher: Send + Sync {
    /// Fetch and decode one chunk
    async fn fetch(&self, chunk: &ChunkInfo) -> Result<Bytes>;
}

#[async_trait]
impl<F: ChunkFetcher + ?Sized> ChunkFetcher for Arc<F> {
    async fn fetch(&self, chunk: &ChunkInfo) -> Result<Bytes> {
        (**self).fetch(chunk).await
    }
}

#[async_trait]
impl<F: ChunkFetcher + ?Sized> ChunkFetcher for Box<F> {
    async fn fetch(&self, chunk: &ChunkInfo) -> Result<Bytes> {
        (**self).fetch(chunk).await
    }
}

/// Retries transient failures of another fetcher
#[derive(Debug, Clone)]
pub struct RetryingFetcher<F> {
    inner: F,
    policy: RetryPolicy,
}

impl<F: ChunkFetcher> RetryingFetcher<F> {
    /// Wrap `inner` with `policy`
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The wrapped fetcher
    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: ChunkFetcher> ChunkFetcher for RetryingFetcher<F> {
    async fn fetch(&self, chunk: &ChunkInfo) -> Result<Bytes> {
        self.policy.execute(|| self.inner.fetch(chunk)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use splice_formats::ChunkGuid;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Fails with `error` for the first `failures` calls
    struct Flaky {
        calls: AtomicU32,
        failures: u32,
        error: fn() -> ProtocolError,
    }

    #[async_trait]
    impl ChunkFetcher for Flaky {
        async fn fetch(&self, _chunk: &ChunkInfo) -> Result<Bytes> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err((self.error)())
            } else {
                Ok(Bytes::from_static(b"payload"))
            }
        }
    }

    fn chunk() -> ChunkInfo {
        ChunkInfo {
            guid: ChunkGuid::from_words([1, 2, 3, 4]),
            hash: 1,
            sha1: [0; 20],
            data_group: 0,
            file_size: 7,
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
            multiplier: 2.0,
            jitter: false,
        }
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let fetcher = RetryingFetcher::new(
            Flaky {
                calls: AtomicU32::new(0),
                failures: 2,
                error: || ProtocolError::Timeout,
            },
            policy(3),
        );

        assert_eq!(&fetcher.fetch(&chunk()).await.unwrap()[..], b"payload");
        assert_eq!(fetcher.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_failures() {
        let fetcher = RetryingFetcher::new(
            Flaky {
                calls: AtomicU32::new(0),
                failures: 1,
                error: || ProtocolError::NoEndpoints,
            },
            policy(3),
        );

        assert!(fetcher.fetch(&chunk()).await.is_err());
        assert_eq!(fetcher.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shared_fetcher() {
        let shared = Arc::new(Flaky {
            calls: AtomicU32::new(0),
            failures: 0,
            error: || ProtocolError::Timeout,
        });
        let fetcher = RetryingFetcher::new(Arc::clone(&shared), RetryPolicy::none());

        fetcher.fetch(&chunk()).await.unwrap();
        assert_eq!(shared.calls.load(Ordering::SeqCst), 1);
    }
}
