//! Deadline wrapper for origin fetchers.

use async_trait::async_trait;
use bridge_traits::error::BridgeError;
use bridge_traits::origin::{Fetched, OriginFetcher};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Wraps an [`OriginFetcher`] and fails any fetch that exceeds `timeout`.
///
/// The core has no cancellation path, so the deadline is imposed here at the
/// collaborator boundary. A timed-out fetch fails with
/// [`BridgeError::Timeout`], which the consumer can downcast from the stored
/// origin error.
pub struct TimeoutFetcher<T>
where
    T: Send + 'static,
{
    inner: Arc<dyn OriginFetcher<T>>,
    timeout: Duration,
}

impl<T> TimeoutFetcher<T>
where
    T: Send + 'static,
{
    pub fn new(inner: Arc<dyn OriginFetcher<T>>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn with_deadline<F>(&self, operation: &str, fetch: F) -> anyhow::Result<Fetched<T>>
    where
        F: Future<Output = anyhow::Result<Fetched<T>>> + Send,
    {
        match tokio::time::timeout(self.timeout, fetch).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation = operation, timeout = ?self.timeout, "Origin fetch timed out");
                Err(BridgeError::Timeout(self.timeout).into())
            }
        }
    }
}

#[async_trait]
impl<T> OriginFetcher<T> for TimeoutFetcher<T>
where
    T: Send + 'static,
{
    async fn fetch(&self) -> anyhow::Result<Fetched<T>> {
        self.with_deadline("fetch", self.inner.fetch()).await
    }

    async fn fetch_next(&self, request_key: String) -> anyhow::Result<Fetched<T>> {
        self.with_deadline("fetch_next", self.inner.fetch_next(request_key))
            .await
    }

    async fn fetch_prev(&self, request_key: String) -> anyhow::Result<Fetched<T>> {
        self.with_deadline("fetch_prev", self.inner.fetch_prev(request_key))
            .await
    }
}
