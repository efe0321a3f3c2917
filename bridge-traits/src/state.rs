//! State store abstraction.

use core_state::DataState;
use futures::stream::BoxStream;

/// Persistence of the single [`DataState`] of one key.
///
/// Loads and saves are assumed fast and never fail from the orchestrator's
/// point of view. Implementations own the per-key storage; the core is always
/// handed the store of exactly one key.
pub trait StateStore: Send + Sync {
    /// Current state. A key that was never written yields
    /// [`DataState::default`].
    fn load(&self) -> DataState;

    /// Replace the current state and notify observers.
    fn save(&self, state: DataState);

    /// Stream of states, starting with the current one when first polled and
    /// followed by every later change. Intermediate states may be coalesced.
    fn observe(&self) -> BoxStream<'static, DataState>;
}
