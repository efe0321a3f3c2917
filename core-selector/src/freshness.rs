//! Freshness predicates deciding whether cached content must be refetched.

use bridge_traits::clock::Clock;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// `need_refresh(cached) -> bool` supplied by the integration.
///
/// The predicate must be pure: it is evaluated every time the selector
/// checks whether the cache is still usable.
pub struct NeedRefresh<T> {
    predicate: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> NeedRefresh<T>
where
    T: 'static,
{
    pub fn from_fn<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Cached content is always usable.
    pub fn never() -> Self {
        Self::from_fn(|_| false)
    }

    /// Cached content is never usable; every validate fetches.
    pub fn always() -> Self {
        Self::from_fn(|_| true)
    }

    /// Content is stale once `clock` is more than `max_age` past the
    /// timestamp extracted by `timestamp_of`.
    ///
    /// A `max_age` too large to represent never expires.
    pub fn older_than<F>(max_age: Duration, clock: Arc<dyn Clock>, timestamp_of: F) -> Self
    where
        F: Fn(&T) -> DateTime<Utc> + Send + Sync + 'static,
    {
        let max_age = chrono::Duration::from_std(max_age).ok();
        Self::from_fn(move |cached| match max_age {
            Some(max_age) => clock.now() - timestamp_of(cached) > max_age,
            None => false,
        })
    }
}

impl<T> NeedRefresh<T> {
    pub fn needs_refresh(&self, cached: &T) -> bool {
        (self.predicate)(cached)
    }
}

impl<T> Clone for NeedRefresh<T> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<T> fmt::Debug for NeedRefresh<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NeedRefresh").finish_non_exhaustive()
    }
}
