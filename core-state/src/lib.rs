//! # State Model & Algebra
//!
//! Immutable state types shared by every layer of the cache-or-fetch
//! coordinator, plus the pure functions that turn them into the value a
//! consumer renders.
//!
//! ## Overview
//!
//! - [`DataState`] / [`AdditionalDataState`]: the persisted, per-key fetch and
//!   pagination status. Only the orchestrator writes them.
//! - [`LoadingState`] / [`AdditionalLoadingState`]: the derived projection a
//!   consumer observes. Never persisted.
//! - [`combine`]: positional merge (`zip`) of projections and its stream
//!   counterpart for screens backed by several cached entities.

pub mod combine;
pub mod data_state;
pub mod error;
pub mod loading_state;

pub use combine::{combine, combine_all, zip_all};
pub use data_state::{AdditionalDataState, DataState};
pub use error::{Result, StateError};
pub use loading_state::{AdditionalLoadingState, LoadingState};
