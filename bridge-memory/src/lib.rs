//! # In-Memory Bridge Implementations
//!
//! Default in-process implementations of the collaborator bridges.
//!
//! ## Overview
//!
//! - `StateStore` backed by a `tokio::sync::watch` channel, so every save is
//!   observable by `publish` streams
//! - `StateRegistry` holding one state store per logical key
//! - `CacheStore` holding content in memory with pluggable append/prepend merge
//! - `TimeoutFetcher` imposing a deadline on an `OriginFetcher` at the
//!   collaborator boundary
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_memory::{InMemoryCacheStore, StateRegistry};
//!
//! let registry = StateRegistry::new();
//! let state_store = registry.store("timeline");
//! let cache_store = InMemoryCacheStore::<Vec<Post>>::concatenating();
//! ```

mod cache;
mod fetcher;
mod state;

pub use cache::InMemoryCacheStore;
pub use fetcher::TimeoutFetcher;
pub use state::{InMemoryStateStore, StateRegistry};
