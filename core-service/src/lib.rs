//! Core service façade and bootstrap helpers.
//!
//! This crate wires the configuration, logging, event bus and per-key state
//! stores into [`StoreFlow`] handles a host application consumes. Hosts supply
//! a cache store and an origin fetcher per entity; everything else is owned by
//! the [`CoreService`].
//!
//! ```rust,ignore
//! use core_service::{CoreConfig, CoreService, GettingFrom, NeedRefresh};
//!
//! let core = CoreService::bootstrap(CoreConfig::default())?;
//! let timeline = core.store_flow("timeline", cache, origin, NeedRefresh::never());
//!
//! let mut states = timeline.publish(false);
//! let posts = timeline.require_data(GettingFrom::Both).await?;
//! ```

pub mod error;
pub mod flow;

pub use error::{CoreError, Result};
pub use flow::{GettingFrom, StoreFlow};

pub use bridge_traits::{CacheStore, Fetched, OriginFetcher};
pub use core_runtime::config::CoreConfig;
pub use core_runtime::events::{CoreEvent, EventStream, FetchKind};
pub use core_selector::NeedRefresh;
pub use core_state::{
    combine, combine_all, zip_all, AdditionalDataState, AdditionalLoadingState, DataState,
    LoadingState, StateError,
};

use bridge_memory::{StateRegistry, TimeoutFetcher};
use bridge_traits::clock::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use core_runtime::events::EventBus;
use core_runtime::logging::init_logging;
use core_selector::DataSelector;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

type TransitionGate = Arc<tokio::sync::Mutex<()>>;

/// Primary façade exposed to host applications.
///
/// Every [`StoreFlow`] created for the same key shares one state store and one
/// transition gate, so their transitions are serialized.
#[derive(Clone)]
pub struct CoreService {
    config: Arc<CoreConfig>,
    event_bus: EventBus,
    states: Arc<StateRegistry>,
    gates: Arc<Mutex<HashMap<String, TransitionGate>>>,
    clock: Arc<dyn Clock>,
}

impl CoreService {
    /// Create a service without touching the global logging setup.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Runtime`] if `config` is invalid.
    pub fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            event_bus: EventBus::new(config.event_buffer_size),
            config: Arc::new(config),
            states: Arc::new(StateRegistry::new()),
            gates: Arc::new(Mutex::new(HashMap::new())),
            clock: Arc::new(SystemClock),
        })
    }

    /// Validate `config`, install the global logging subscriber, and create
    /// the service.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Runtime`] if `config` is invalid and
    /// [`CoreError::InitializationFailed`] if logging cannot be installed.
    pub fn bootstrap(config: CoreConfig) -> Result<Self> {
        config.validate()?;
        init_logging(config.logging.clone())
            .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;

        let service = Self::new(config)?;
        info!(config = ?service.config, "Core service bootstrapped");
        Ok(service)
    }

    /// Replace the time source used by [`max_age_policy`](Self::max_age_policy).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Stream of every event published by this service's flows.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }

    /// Keys that have been touched by a flow.
    pub fn keys(&self) -> Vec<String> {
        self.states.keys()
    }

    /// Build the flow of the entity stored under `key`.
    ///
    /// When a fetch timeout is configured, `origin` is wrapped so a fetch that
    /// outlives it fails with `BridgeError::Timeout`.
    pub fn store_flow<T>(
        &self,
        key: impl Into<String>,
        cache: Arc<dyn CacheStore<T>>,
        origin: Arc<dyn OriginFetcher<T>>,
        need_refresh: NeedRefresh<T>,
    ) -> StoreFlow<T>
    where
        T: Send + Sync + 'static,
    {
        let key = key.into();

        let origin: Arc<dyn OriginFetcher<T>> = match self.config.fetch_timeout {
            Some(timeout) => Arc::new(TimeoutFetcher::new(origin, timeout)),
            None => origin,
        };

        let selector = DataSelector::new(
            key.clone(),
            self.states.store(&key),
            cache,
            origin,
            need_refresh,
        )
        .with_event_bus(self.event_bus.clone())
        .with_transition_gate(self.gate(&key));

        debug!(key = %key, "Created store flow");
        StoreFlow::new(selector)
    }

    /// Freshness predicate expiring content older than the configured
    /// `default_max_age`. Content never expires when no max age is set.
    pub fn max_age_policy<T, F>(&self, timestamp_of: F) -> NeedRefresh<T>
    where
        T: 'static,
        F: Fn(&T) -> DateTime<Utc> + Send + Sync + 'static,
    {
        match self.config.default_max_age {
            Some(max_age) => NeedRefresh::older_than(max_age, Arc::clone(&self.clock), timestamp_of),
            None => NeedRefresh::never(),
        }
    }

    fn gate(&self, key: &str) -> TransitionGate {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(gates.entry(key.to_string()).or_default())
    }
}

impl fmt::Debug for CoreService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreService")
            .field("config", &self.config)
            .field("event_bus", &self.event_bus)
            .finish_non_exhaustive()
    }
}
