//! # Data Selector
//!
//! The cache-or-fetch orchestrator of one key.
//!
//! [`DataSelector`] validates cached content against a [`NeedRefresh`]
//! predicate, drives full and paged origin fetches, and reconciles their
//! results into the key's state store and cache store.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_selector::{DataSelector, NeedRefresh};
//!
//! let selector = DataSelector::new(
//!     "timeline",
//!     state_store,
//!     cache_store,
//!     origin,
//!     NeedRefresh::never(),
//! )
//! .with_event_bus(event_bus);
//!
//! selector.validate().await;
//! selector.request_next_data(false).await;
//! ```

pub mod freshness;
pub mod selector;

pub use freshness::NeedRefresh;
pub use selector::DataSelector;
