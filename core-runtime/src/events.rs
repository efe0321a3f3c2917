//! # Event Bus System
//!
//! Broadcasts the state transitions of every cached entity using
//! `tokio::sync::broadcast`, so hosts can observe fetch activity without
//! wiring into each selector.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **CoreEvent**: Typed events describing fetches, cache writes and clears
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     emit      ┌───────────┐
//! │ DataSelector ├──────────────>│           │     subscribe    ┌────────────┐
//! │  ("feed")    │               │ EventBus  ├─────────────────>│ Subscriber │
//! └──────────────┘               │ (broadcast│                  └────────────┘
//! ┌──────────────┐     emit      │  channel) │     subscribe    ┌────────────┐
//! │ DataSelector ├──────────────>│           ├─────────────────>│ Subscriber │
//! │  ("profile") │               └───────────┘                  └────────────┘
//! └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, EventStream, FetchKind};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut feed_events = EventStream::new(event_bus.subscribe()).for_key("feed");
//!
//! event_bus
//!     .emit(CoreEvent::FetchStarted {
//!         key: "feed".to_string(),
//!         kind: FetchKind::Refresh,
//!     })
//!     .ok();
//!
//! let event = feed_events.recv().await.unwrap();
//! assert_eq!(event.key(), "feed");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   The subscriber can keep receiving newer events.
//! - **`RecvError::Closed`**: All senders have been dropped. Treat this as shutdown.
//!
//! Emission is best-effort: a bus without subscribers rejects the event and
//! publishers ignore that result.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that fall further behind receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Which origin operation a fetch event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchKind {
    /// Full reload of the primary data
    Refresh,
    /// Page after the cached content
    Next,
    /// Page before the cached content
    Prev,
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchKind::Refresh => write!(f, "refresh"),
            FetchKind::Next => write!(f, "next"),
            FetchKind::Prev => write!(f, "prev"),
        }
    }
}

/// Event published by a selector for the entity stored under `key`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// An origin fetch was started
    FetchStarted { key: String, kind: FetchKind },
    /// An origin fetch completed and its result was written to the cache
    FetchSucceeded { key: String, kind: FetchKind },
    /// An origin fetch failed; `message` is the rendered origin error
    FetchFailed {
        key: String,
        kind: FetchKind,
        message: String,
    },
    /// An origin fetch completed after its request was superseded by a
    /// clear, update or refresh; the result was dropped
    FetchDiscarded { key: String, kind: FetchKind },
    /// A paging request was refused because the primary data was not loaded
    AdditionalRequestRejected {
        key: String,
        kind: FetchKind,
        reason: String,
    },
    /// The cache was overwritten by a local update
    CacheUpdated { key: String },
    /// Cache and state were reset
    Cleared { key: String },
}

impl CoreEvent {
    /// The entity key this event belongs to.
    pub fn key(&self) -> &str {
        match self {
            CoreEvent::FetchStarted { key, .. }
            | CoreEvent::FetchSucceeded { key, .. }
            | CoreEvent::FetchFailed { key, .. }
            | CoreEvent::FetchDiscarded { key, .. }
            | CoreEvent::AdditionalRequestRejected { key, .. }
            | CoreEvent::CacheUpdated { key }
            | CoreEvent::Cleared { key } => key,
        }
    }

    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::FetchStarted { .. } => "Origin fetch started",
            CoreEvent::FetchSucceeded { .. } => "Origin fetch completed",
            CoreEvent::FetchFailed { .. } => "Origin fetch failed",
            CoreEvent::FetchDiscarded { .. } => "Superseded origin fetch discarded",
            CoreEvent::AdditionalRequestRejected { .. } => "Paging request rejected",
            CoreEvent::CacheUpdated { .. } => "Cache content updated locally",
            CoreEvent::Cleared { .. } => "Cache and state cleared",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::FetchFailed { .. } => EventSeverity::Error,
            CoreEvent::AdditionalRequestRejected { .. } => EventSeverity::Warning,
            CoreEvent::FetchSucceeded { .. }
            | CoreEvent::FetchDiscarded { .. }
            | CoreEvent::Cleared { .. } => EventSeverity::Info,
            CoreEvent::FetchStarted { .. } | CoreEvent::CacheUpdated { .. } => {
                EventSeverity::Debug
            }
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. `CoreConfig` validation rejects a zero
    /// buffer before it reaches this point.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{EventBus, EventSeverity, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let failures = EventStream::new(event_bus.subscribe())
///     .filter(|event| event.severity() >= EventSeverity::Warning);
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only yield events matching `predicate`. Replaces any previous filter.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Only yield events for the entity stored under `key`.
    pub fn for_key(self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.filter(move |event| event.key() == key)
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive a matching event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
