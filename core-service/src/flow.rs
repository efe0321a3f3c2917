//! Consumer-facing handle on one cached entity.

use core_selector::DataSelector;
use core_state::{DataState, LoadingState, StateError};
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use std::fmt;
use tracing::{debug, instrument};

/// Where [`StoreFlow::require_data`] may take its content from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GettingFrom {
    /// Only valid cached content; never fetches.
    Cache,
    /// Always fetch from the origin, discarding the cache first.
    Origin,
    /// Valid cached content, or fetch if it is absent or stale.
    #[default]
    Both,
}

/// Observable, fetchable view of the entity stored under one key.
///
/// Operations other than [`require_data`](Self::require_data) never fail:
/// their outcome is stored in the entity's state and delivered through
/// [`publish`](Self::publish).
pub struct StoreFlow<T> {
    selector: DataSelector<T>,
}

impl<T> StoreFlow<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(selector: DataSelector<T>) -> Self {
        Self { selector }
    }

    pub fn key(&self) -> &str {
        self.selector.key()
    }

    /// Current persisted state.
    pub fn state(&self) -> DataState {
        self.selector.state_store().load()
    }

    /// Live projection of the entity.
    ///
    /// Starts a validation (or a refresh that keeps the cache when
    /// `force_refresh` is set) when first polled, then emits the projection of
    /// every state change together with the cache content at that moment.
    pub fn publish(&self, force_refresh: bool) -> BoxStream<'static, LoadingState<T>> {
        let states = self.selector.state_store().observe();

        let starter = self.selector.clone();
        let start = stream::once(async move {
            if force_refresh {
                starter.refresh_async(false).await;
            } else {
                starter.validate_async().await;
            }
        })
        .filter_map(|()| future::ready(None::<DataState>));

        let reader = self.selector.clone();
        start
            .chain(states)
            .then(move |state| {
                let reader = reader.clone();
                async move {
                    let content = reader.load_cache().await;
                    state.to_loading_state(content)
                }
            })
            .boxed()
    }

    /// Content from `from`, or `None` where [`require_data`](Self::require_data)
    /// would fail.
    pub async fn get_data(&self, from: GettingFrom) -> Option<T> {
        self.require_data(from).await.ok()
    }

    /// Content from `from`.
    ///
    /// Waits for an in-flight full fetch to settle before reading. A stored
    /// error is returned for every source, including [`GettingFrom::Cache`].
    ///
    /// # Errors
    ///
    /// Returns the stored cause when the fetch failed, or
    /// [`StateError::NoSuchElement`] when there is no content to return.
    #[instrument(skip(self), fields(key = %self.key()))]
    pub async fn require_data(&self, from: GettingFrom) -> Result<T, StateError> {
        match from {
            GettingFrom::Cache => {}
            GettingFrom::Origin => self.selector.refresh(true).await,
            GettingFrom::Both => self.selector.validate().await,
        }

        let content = match self.settled_state().await {
            DataState::Error(cause) => return Err(cause),
            DataState::Fixed { .. } | DataState::Loading if from == GettingFrom::Cache => {
                self.selector.load_valid_cache_or_none().await
            }
            DataState::Fixed { .. } | DataState::Loading => self.selector.load_cache().await,
        };
        content.ok_or(StateError::NoSuchElement)
    }

    async fn settled_state(&self) -> DataState {
        let mut states = self
            .selector
            .state_store()
            .observe()
            .filter(|state| future::ready(!state.is_loading()));

        match states.next().await {
            Some(state) => state,
            None => {
                debug!("State stream closed while waiting for a settled state");
                self.state()
            }
        }
    }

    pub async fn validate(&self) {
        self.selector.validate().await;
    }

    pub async fn validate_async(&self) {
        self.selector.validate_async().await;
    }

    pub async fn refresh(&self, clear_cache_before_fetching: bool) {
        self.selector.refresh(clear_cache_before_fetching).await;
    }

    pub async fn refresh_async(&self, clear_cache_before_fetching: bool) {
        self.selector.refresh_async(clear_cache_before_fetching).await;
    }

    pub async fn request_next_data(&self, continue_when_error: bool) {
        self.selector.request_next_data(continue_when_error).await;
    }

    pub async fn request_prev_data(&self, continue_when_error: bool) {
        self.selector.request_prev_data(continue_when_error).await;
    }

    pub async fn request_next_data_async(&self, continue_when_error: bool) {
        self.selector
            .request_next_data_async(continue_when_error)
            .await;
    }

    pub async fn request_prev_data_async(&self, continue_when_error: bool) {
        self.selector
            .request_prev_data_async(continue_when_error)
            .await;
    }

    /// Overwrite the content. Each cursor that is `None` or empty marks its
    /// direction exhausted.
    pub async fn update(
        &self,
        new_data: Option<T>,
        next_key: Option<String>,
        prev_key: Option<String>,
    ) {
        self.selector.update(new_data, next_key, prev_key).await;
    }

    /// Overwrite the content, keeping the known cursors.
    pub async fn update_content(&self, new_data: Option<T>) {
        self.selector.update_content(new_data).await;
    }

    pub async fn clear(&self) {
        self.selector.clear().await;
    }
}

impl<T> Clone for StoreFlow<T> {
    fn clone(&self) -> Self {
        Self {
            selector: self.selector.clone(),
        }
    }
}

impl<T> fmt::Debug for StoreFlow<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreFlow")
            .field("selector", &self.selector)
            .finish()
    }
}
