//! Watch-backed state storage.

use bridge_traits::state::StateStore;
use core_state::DataState;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;
use tracing::debug;

/// In-memory [`StateStore`] for a single key.
///
/// Every save replaces the value held by a `watch` channel, so observers see
/// the latest state even if they lag behind.
pub struct InMemoryStateStore {
    sender: watch::Sender<DataState>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::with_state(DataState::default())
    }

    pub fn with_state(state: DataState) -> Self {
        let (sender, _) = watch::channel(state);
        Self { sender }
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for InMemoryStateStore {
    fn load(&self) -> DataState {
        self.sender.borrow().clone()
    }

    fn save(&self, state: DataState) {
        self.sender.send_replace(state);
    }

    fn observe(&self) -> BoxStream<'static, DataState> {
        let receiver = self.sender.subscribe();
        stream::unfold((receiver, true), |(mut receiver, first)| async move {
            if !first && receiver.changed().await.is_err() {
                return None;
            }
            let state = receiver.borrow_and_update().clone();
            Some((state, (receiver, false)))
        })
        .boxed()
    }
}

/// Per-key map of state stores.
///
/// Hands out the same store for the same key, so every consumer of a key reads
/// and writes one `DataState`.
#[derive(Default)]
pub struct StateRegistry {
    stores: RwLock<HashMap<String, Arc<InMemoryStateStore>>>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The store for `key`, created with the initial state on first use.
    pub fn store(&self, key: &str) -> Arc<InMemoryStateStore> {
        if let Some(store) = self
            .stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return Arc::clone(store);
        }

        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(stores.entry(key.to_string()).or_insert_with(|| {
            debug!(key = key, "Created state store");
            Arc::new(InMemoryStateStore::new())
        }))
    }

    pub fn keys(&self) -> Vec<String> {
        self.stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}
