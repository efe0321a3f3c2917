//! # Data Selector
//!
//! Drives the cache-or-fetch state machine of one key.
//!
//! ## Overview
//!
//! The `DataSelector` reads the persisted [`DataState`], decides whether an
//! origin fetch is needed, moves the state to its loading form, runs the fetch
//! and writes the outcome back to the cache store and the state store.
//!
//! Every operation is split in two phases:
//! 1. A *transition* that reads the state, decides, and writes the loading
//!    state. It runs under the per-key transition gate and never suspends on
//!    the origin.
//! 2. The *fetch*, which runs outside the gate and re-acquires it to write the
//!    result.
//!
//! The `*_async` variants run phase 1 before returning and dispatch phase 2 as
//! a detached task.
//!
//! ## Failure Handling
//!
//! No operation returns an error. Origin failures and rejected paging requests
//! are stored in the state and observed through the state store.

use crate::freshness::NeedRefresh;
use bridge_traits::cache::CacheStore;
use bridge_traits::origin::{Fetched, OriginFetcher};
use bridge_traits::state::StateStore;
use core_runtime::events::{CoreEvent, EventBus, FetchKind};
use core_state::{AdditionalDataState, DataState, StateError};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn, Instrument};

/// Paging direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Next,
    Prev,
}

impl Direction {
    fn kind(self) -> FetchKind {
        match self {
            Direction::Next => FetchKind::Next,
            Direction::Prev => FetchKind::Prev,
        }
    }

    /// This direction's sub-state of `state`.
    fn sub_state(self, state: &DataState) -> AdditionalDataState {
        match self {
            Direction::Next => state.next_data_state(),
            Direction::Prev => state.prev_data_state(),
        }
    }

    /// The opposite direction's sub-state of `state`.
    fn other_sub_state(self, state: &DataState) -> AdditionalDataState {
        match self {
            Direction::Next => state.prev_data_state(),
            Direction::Prev => state.next_data_state(),
        }
    }

    /// Rebuild a `Fixed` state from this direction's and the other
    /// direction's sub-states.
    fn assemble(self, own: AdditionalDataState, other: AdditionalDataState) -> DataState {
        match self {
            Direction::Next => DataState::fixed(own, other),
            Direction::Prev => DataState::fixed(other, own),
        }
    }

    fn cursor<T>(self, fetched: &mut Fetched<T>) -> Option<String> {
        match self {
            Direction::Next => fetched.next_key.take(),
            Direction::Prev => fetched.prev_key.take(),
        }
    }
}

/// Work decided by a transition, to be run outside the transition gate.
enum PendingFetch {
    Refresh,
    Additional {
        direction: Direction,
        request_key: String,
    },
}

/// Cache-or-fetch orchestrator for the entity stored under one key.
///
/// Cloning is cheap and yields a handle on the same stores and gate.
pub struct DataSelector<T> {
    key: String,
    state_store: Arc<dyn StateStore>,
    cache_store: Arc<dyn CacheStore<T>>,
    origin: Arc<dyn OriginFetcher<T>>,
    need_refresh: NeedRefresh<T>,
    event_bus: Option<EventBus>,
    transition: Arc<Mutex<()>>,
}

impl<T> DataSelector<T>
where
    T: Send + Sync + 'static,
{
    /// Create a selector with its own transition gate and no event bus.
    pub fn new(
        key: impl Into<String>,
        state_store: Arc<dyn StateStore>,
        cache_store: Arc<dyn CacheStore<T>>,
        origin: Arc<dyn OriginFetcher<T>>,
        need_refresh: NeedRefresh<T>,
    ) -> Self {
        Self {
            key: key.into(),
            state_store,
            cache_store,
            origin,
            need_refresh,
            event_bus: None,
            transition: Arc::new(Mutex::new(())),
        }
    }

    /// Publish transitions on `event_bus`.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Serialize transitions with every other selector sharing `gate`.
    ///
    /// All selectors writing the same state store must share one gate.
    pub fn with_transition_gate(mut self, gate: Arc<Mutex<()>>) -> Self {
        self.transition = gate;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state_store(&self) -> &Arc<dyn StateStore> {
        &self.state_store
    }

    /// Cached content, regardless of freshness.
    ///
    /// Projections read through this: once the state has settled, the cache
    /// holds what the last fetch or update produced, and staleness is only
    /// acted on by [`validate`](Self::validate). Use
    /// [`load_valid_cache_or_none`](Self::load_valid_cache_or_none) to decide
    /// whether a fetch is needed.
    pub async fn load_cache(&self) -> Option<T> {
        self.cache_store.load().await
    }

    /// Cached content, or `None` if absent or stale.
    pub async fn load_valid_cache_or_none(&self) -> Option<T> {
        self.cache_store
            .load()
            .await
            .filter(|cached| !self.need_refresh.needs_refresh(cached))
    }

    /// Refresh if the cache is absent or stale, or if the last full fetch
    /// failed. Waits for the fetch to complete.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn validate(&self) {
        if let Some(pending) = self.begin_validate().await {
            self.run(pending).await;
        }
    }

    /// Same as [`validate`](Self::validate) but returns once the state is
    /// `Loading`, leaving the fetch to a detached task.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn validate_async(&self) {
        if let Some(pending) = self.begin_validate().await {
            self.dispatch(pending);
        }
    }

    /// Refresh unconditionally unless a full fetch is already in flight.
    /// Waits for the fetch to complete.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn refresh(&self, clear_cache_before_fetching: bool) {
        if let Some(pending) = self.begin_refresh(clear_cache_before_fetching).await {
            self.run(pending).await;
        }
    }

    /// Same as [`refresh`](Self::refresh) but returns once the state is
    /// `Loading`.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn refresh_async(&self, clear_cache_before_fetching: bool) {
        if let Some(pending) = self.begin_refresh(clear_cache_before_fetching).await {
            self.dispatch(pending);
        }
    }

    /// Fetch the page after the cached content and append it.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn request_next_data(&self, continue_when_error: bool) {
        if let Some(pending) = self
            .begin_additional(Direction::Next, continue_when_error)
            .await
        {
            self.run(pending).await;
        }
    }

    /// Fetch the page before the cached content and prepend it.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn request_prev_data(&self, continue_when_error: bool) {
        if let Some(pending) = self
            .begin_additional(Direction::Prev, continue_when_error)
            .await
        {
            self.run(pending).await;
        }
    }

    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn request_next_data_async(&self, continue_when_error: bool) {
        if let Some(pending) = self
            .begin_additional(Direction::Next, continue_when_error)
            .await
        {
            self.dispatch(pending);
        }
    }

    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn request_prev_data_async(&self, continue_when_error: bool) {
        if let Some(pending) = self
            .begin_additional(Direction::Prev, continue_when_error)
            .await
        {
            self.dispatch(pending);
        }
    }

    /// Overwrite the cached content and settle the state with the given
    /// cursors. A missing or empty cursor marks its direction exhausted.
    #[instrument(skip(self, new_data), fields(key = %self.key))]
    pub async fn update(
        &self,
        new_data: Option<T>,
        next_key: Option<String>,
        prev_key: Option<String>,
    ) {
        let _transition = self.transition.lock().await;

        self.cache_store.save(new_data).await;
        self.state_store.save(DataState::fixed(
            AdditionalDataState::from_request_key(next_key),
            AdditionalDataState::from_request_key(prev_key),
        ));

        debug!("Cache overwritten by update");
        self.emit(CoreEvent::CacheUpdated {
            key: self.key.clone(),
        });
    }

    /// Overwrite the cached content and settle the state, keeping the cursor
    /// known for each direction.
    #[instrument(skip(self, new_data), fields(key = %self.key))]
    pub async fn update_content(&self, new_data: Option<T>) {
        let _transition = self.transition.lock().await;

        let state = self.state_store.load();
        self.cache_store.save(new_data).await;
        self.state_store.save(DataState::fixed(
            state.next_data_state().settled(),
            state.prev_data_state().settled(),
        ));

        debug!("Cache overwritten by update, cursors kept");
        self.emit(CoreEvent::CacheUpdated {
            key: self.key.clone(),
        });
    }

    /// Discard the cached content and reset the state.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn clear(&self) {
        let _transition = self.transition.lock().await;

        self.cache_store.save(None).await;
        self.state_store.save(DataState::default());

        info!("Cleared cache and state");
        self.emit(CoreEvent::Cleared {
            key: self.key.clone(),
        });
    }

    async fn begin_validate(&self) -> Option<PendingFetch> {
        let _transition = self.transition.lock().await;

        match self.state_store.load() {
            DataState::Fixed { .. } => {
                if self.load_valid_cache_or_none().await.is_some() {
                    debug!("Cache is valid, skipping fetch");
                    return None;
                }
            }
            DataState::Loading => {
                debug!("Full fetch already in flight");
                return None;
            }
            DataState::Error(_) => {}
        }

        Some(self.start_refresh(true).await)
    }

    async fn begin_refresh(&self, clear_cache_before_fetching: bool) -> Option<PendingFetch> {
        let _transition = self.transition.lock().await;

        if self.state_store.load().is_loading() {
            debug!("Full fetch already in flight");
            return None;
        }

        Some(self.start_refresh(clear_cache_before_fetching).await)
    }

    /// Must be called with the transition gate held.
    async fn start_refresh(&self, clear_cache_before_fetching: bool) -> PendingFetch {
        if clear_cache_before_fetching {
            self.cache_store.save(None).await;
        }
        self.state_store.save(DataState::Loading);

        debug!(clear_cache_before_fetching, "State moved to Loading");
        self.emit(CoreEvent::FetchStarted {
            key: self.key.clone(),
            kind: FetchKind::Refresh,
        });

        PendingFetch::Refresh
    }

    async fn begin_additional(
        &self,
        direction: Direction,
        continue_when_error: bool,
    ) -> Option<PendingFetch> {
        let _transition = self.transition.lock().await;

        let state = self.state_store.load();
        let request_key = match &state {
            DataState::Loading => {
                debug!(?direction, "Full fetch in flight, ignoring paging request");
                return None;
            }
            DataState::Error(_) => {
                if continue_when_error {
                    self.reject(direction, StateError::AdditionalRequestOnErrorState);
                }
                return None;
            }
            DataState::Fixed { .. } => match direction.sub_state(&state) {
                AdditionalDataState::Fixed { request_key } => request_key,
                AdditionalDataState::Error { request_key, .. } if continue_when_error => {
                    request_key
                }
                AdditionalDataState::Error { .. }
                | AdditionalDataState::FixedWithNoMoreData
                | AdditionalDataState::Loading { .. } => {
                    debug!(?direction, "Direction is not requestable");
                    return None;
                }
            },
        };

        if self.cache_store.load().await.is_none() {
            self.reject(direction, StateError::AdditionalRequestOnNull);
            return None;
        }

        self.state_store.save(direction.assemble(
            AdditionalDataState::Loading {
                request_key: request_key.clone(),
            },
            direction.other_sub_state(&state),
        ));

        debug!(?direction, request_key = %request_key, "Direction moved to Loading");
        self.emit(CoreEvent::FetchStarted {
            key: self.key.clone(),
            kind: direction.kind(),
        });

        Some(PendingFetch::Additional {
            direction,
            request_key,
        })
    }

    /// Must be called with the transition gate held.
    fn reject(&self, direction: Direction, cause: StateError) {
        warn!(?direction, %cause, "Rejected paging request");
        self.emit(CoreEvent::AdditionalRequestRejected {
            key: self.key.clone(),
            kind: direction.kind(),
            reason: cause.to_string(),
        });
        self.state_store.save(DataState::Error(cause));
    }

    fn dispatch(&self, pending: PendingFetch) {
        let selector = self.clone();
        tokio::spawn(
            async move {
                selector.run(pending).await;
            }
            .in_current_span(),
        );
    }

    async fn run(&self, pending: PendingFetch) {
        match pending {
            PendingFetch::Refresh => self.run_refresh().await,
            PendingFetch::Additional {
                direction,
                request_key,
            } => self.run_additional(direction, request_key).await,
        }
    }

    async fn run_refresh(&self) {
        let result = self.origin.fetch().await;
        let _transition = self.transition.lock().await;

        match result {
            Ok(fetched) => {
                self.cache_store.save(Some(fetched.data)).await;
                self.state_store.save(DataState::fixed(
                    AdditionalDataState::from_request_key(fetched.next_key),
                    AdditionalDataState::from_request_key(fetched.prev_key),
                ));

                info!("Refreshed from origin");
                self.emit(CoreEvent::FetchSucceeded {
                    key: self.key.clone(),
                    kind: FetchKind::Refresh,
                });
            }
            Err(error) => {
                let message = error.to_string();
                warn!(error = %message, "Refresh from origin failed");

                self.cache_store.save(None).await;
                self.state_store
                    .save(DataState::Error(StateError::origin(error)));

                self.emit(CoreEvent::FetchFailed {
                    key: self.key.clone(),
                    kind: FetchKind::Refresh,
                    message,
                });
            }
        }
    }

    async fn run_additional(&self, direction: Direction, request_key: String) {
        let result = match direction {
            Direction::Next => self.origin.fetch_next(request_key.clone()).await,
            Direction::Prev => self.origin.fetch_prev(request_key.clone()).await,
        };
        let _transition = self.transition.lock().await;

        // A clear, update or refresh that ran meanwhile owns the state now.
        // Outside of `Fixed` both directions read as exhausted.
        let current = self.state_store.load();
        let still_requested = matches!(
            direction.sub_state(&current),
            AdditionalDataState::Loading { request_key: ref pending } if *pending == request_key
        );
        let base = match self.cache_store.load().await {
            Some(base) if still_requested => base,
            _ => {
                info!(?direction, request_key = %request_key, "Dropping superseded page fetch");
                self.emit(CoreEvent::FetchDiscarded {
                    key: self.key.clone(),
                    kind: direction.kind(),
                });
                return;
            }
        };

        match result {
            Ok(mut fetched) => {
                let cursor = direction.cursor(&mut fetched);
                match direction {
                    Direction::Next => self.cache_store.save_next(base, fetched.data).await,
                    Direction::Prev => self.cache_store.save_prev(base, fetched.data).await,
                }

                self.state_store.save(direction.assemble(
                    AdditionalDataState::from_request_key(cursor),
                    direction.other_sub_state(&current),
                ));

                info!(?direction, "Fetched additional page from origin");
                self.emit(CoreEvent::FetchSucceeded {
                    key: self.key.clone(),
                    kind: direction.kind(),
                });
            }
            Err(error) => {
                let message = error.to_string();
                warn!(?direction, error = %message, "Additional fetch from origin failed");

                self.state_store.save(direction.assemble(
                    AdditionalDataState::Error {
                        request_key,
                        cause: StateError::origin(error),
                    },
                    direction.other_sub_state(&current),
                ));

                self.emit(CoreEvent::FetchFailed {
                    key: self.key.clone(),
                    kind: direction.kind(),
                    message,
                });
            }
        }
    }

    fn emit(&self, event: CoreEvent) {
        if let Some(event_bus) = &self.event_bus {
            event_bus.emit(event).ok();
        }
    }
}

impl<T> Clone for DataSelector<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            state_store: Arc::clone(&self.state_store),
            cache_store: Arc::clone(&self.cache_store),
            origin: Arc::clone(&self.origin),
            need_refresh: self.need_refresh.clone(),
            event_bus: self.event_bus.clone(),
            transition: Arc::clone(&self.transition),
        }
    }
}

impl<T> fmt::Debug for DataSelector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSelector")
            .field("key", &self.key)
            .field("state", &self.state_store.load())
            .finish_non_exhaustive()
    }
}
