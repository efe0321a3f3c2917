//! In-memory cache storage.

use async_trait::async_trait;
use bridge_traits::cache::CacheStore;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

type MergeFn<T> = Arc<dyn Fn(T, T) -> T + Send + Sync>;

/// In-memory [`CacheStore`] with a caller-supplied merge policy.
///
/// `append` receives `(cached, fetched)` and must place the fetched page after
/// the cached content; `prepend` receives the same arguments and must place it
/// before.
pub struct InMemoryCacheStore<T> {
    content: RwLock<Option<T>>,
    append: MergeFn<T>,
    prepend: MergeFn<T>,
}

impl<T> InMemoryCacheStore<T> {
    pub fn new<A, P>(append: A, prepend: P) -> Self
    where
        A: Fn(T, T) -> T + Send + Sync + 'static,
        P: Fn(T, T) -> T + Send + Sync + 'static,
    {
        Self {
            content: RwLock::new(None),
            append: Arc::new(append),
            prepend: Arc::new(prepend),
        }
    }

    /// Cache whose merges replace the cached content with the fetched page.
    pub fn replacing() -> Self {
        Self::new(|_, fetched| fetched, |_, fetched| fetched)
    }

    /// Start with `content` already cached.
    pub fn with_content(self, content: T) -> Self {
        Self {
            content: RwLock::new(Some(content)),
            ..self
        }
    }
}

impl<U> InMemoryCacheStore<Vec<U>> {
    /// Cache of a list where appended pages go to the end and prepended pages
    /// to the front.
    pub fn concatenating() -> Self {
        Self::new(
            |mut cached, fetched| {
                cached.extend(fetched);
                cached
            },
            |cached, mut fetched| {
                fetched.extend(cached);
                fetched
            },
        )
    }
}

impl<T> fmt::Debug for InMemoryCacheStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryCacheStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl<T> CacheStore<T> for InMemoryCacheStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn load(&self) -> Option<T> {
        self.content.read().await.clone()
    }

    async fn save(&self, data: Option<T>) {
        debug!(present = data.is_some(), "Saved cache content");
        *self.content.write().await = data;
    }

    async fn save_next(&self, cached: T, fetched: T) {
        let merged = (self.append)(cached, fetched);
        *self.content.write().await = Some(merged);
        debug!("Appended page to cache content");
    }

    async fn save_prev(&self, cached: T, fetched: T) {
        let merged = (self.prepend)(cached, fetched);
        *self.content.write().await = Some(merged);
        debug!("Prepended page to cache content");
    }
}
