//! Cache store abstraction.

use async_trait::async_trait;

/// Cached content of one key.
///
/// `save_next` and `save_prev` encode the merge policy: appended pages go after
/// the existing content, prepended pages before it. The orchestrator only calls
/// them when cached content exists.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::cache::CacheStore;
///
/// async fn reset(cache: &dyn CacheStore<Vec<Post>>) {
///     cache.save(None).await;
/// }
/// ```
#[async_trait]
pub trait CacheStore<T>: Send + Sync
where
    T: Send + 'static,
{
    /// Load cached content, `None` if absent.
    async fn load(&self) -> Option<T>;

    /// Replace cached content. `None` discards it.
    async fn save(&self, data: Option<T>);

    /// Merge an appended page after `cached` and persist the result.
    async fn save_next(&self, cached: T, fetched: T);

    /// Merge a prepended page before `cached` and persist the result.
    async fn save_prev(&self, cached: T, fetched: T);
}
