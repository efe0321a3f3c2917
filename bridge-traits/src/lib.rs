//! # Collaborator Bridge Traits
//!
//! Contracts the cache-or-fetch coordinator consumes but never implements.
//!
//! ## Overview
//!
//! The orchestrator in `core-selector` only talks to the outside world through
//! the traits defined here. Each host integration supplies an implementation
//! per logical entity (key):
//!
//! ### Data
//! - [`StateStore`](state::StateStore) - Get/set the single [`DataState`](core_state::DataState) of a key and observe its changes
//! - [`CacheStore`](cache::CacheStore) - Load/save cached content, including append/prepend merges
//! - [`OriginFetcher`](origin::OriginFetcher) - Fetch the current, next, or previous page from the origin
//!
//! ### Utilities
//! - [`Clock`](clock::Clock) - Time source for freshness checks and deterministic testing
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Serialization
//!
//! The orchestrator performs read-modify-write sequences across the
//! `StateStore` boundary. Integrations must serialize all state access for a
//! given key (see `core_service::CoreService`, which shares one store and one
//! transition gate per key).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across spawned fetch tasks.
//!
//! ## Examples
//!
//! ### Implementing OriginFetcher
//!
//! ```ignore
//! use async_trait::async_trait;
//! use bridge_traits::origin::{Fetched, OriginFetcher};
//!
//! struct FeedFetcher {
//!     client: FeedClient,
//! }
//!
//! #[async_trait]
//! impl OriginFetcher<Vec<Post>> for FeedFetcher {
//!     async fn fetch(&self) -> anyhow::Result<Fetched<Vec<Post>>> {
//!         let page = self.client.first_page().await?;
//!         Ok(Fetched::new(page.posts).with_next_key(page.cursor))
//!     }
//!
//!     async fn fetch_next(&self, request_key: String) -> anyhow::Result<Fetched<Vec<Post>>> {
//!         let page = self.client.page(&request_key).await?;
//!         Ok(Fetched::new(page.posts).with_next_key(page.cursor))
//!     }
//!
//!     async fn fetch_prev(&self, _request_key: String) -> anyhow::Result<Fetched<Vec<Post>>> {
//!         anyhow::bail!("feed only pages forward")
//!     }
//! }
//! ```

pub mod cache;
pub mod clock;
pub mod error;
pub mod log;
pub mod origin;
pub mod state;

pub use error::BridgeError;

pub use cache::CacheStore;
pub use origin::{Fetched, OriginFetcher};
pub use state::StateStore;
pub use clock::{Clock, SystemClock};
pub use log::{LogEntry, LogLevel, LoggerSink};
