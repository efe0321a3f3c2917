//! Origin fetcher abstraction.

use async_trait::async_trait;

/// Result of one origin fetch.
///
/// Directional fetches only populate the cursor of their own direction; the
/// other one is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched<T> {
    pub data: T,
    pub next_key: Option<String>,
    pub prev_key: Option<String>,
}

impl<T> Fetched<T> {
    /// A page with no cursors in either direction.
    pub fn new(data: T) -> Self {
        Self {
            data,
            next_key: None,
            prev_key: None,
        }
    }

    pub fn with_next_key(mut self, next_key: impl Into<Option<String>>) -> Self {
        self.next_key = next_key.into();
        self
    }

    pub fn with_prev_key(mut self, prev_key: impl Into<Option<String>>) -> Self {
        self.prev_key = prev_key.into();
        self
    }
}

/// Access to the origin of one key's data.
///
/// Failures are returned as-is and stored verbatim in the error states the
/// consumer observes. A fetch is the only operation the orchestrator expects to
/// suspend for a meaningful amount of time.
#[async_trait]
pub trait OriginFetcher<T>: Send + Sync
where
    T: Send + 'static,
{
    /// Fetch the current content.
    async fn fetch(&self) -> anyhow::Result<Fetched<T>>;

    /// Fetch the page after the cached content.
    async fn fetch_next(&self, request_key: String) -> anyhow::Result<Fetched<T>>;

    /// Fetch the page before the cached content.
    async fn fetch_prev(&self, request_key: String) -> anyhow::Result<Fetched<T>>;
}
