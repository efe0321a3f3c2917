//! Workspace facade crate.
//!
//! Re-exports the public surface of `core-service` so host applications can
//! depend on `storeflow-workspace` alone instead of wiring each crate.

pub use core_service::*;
