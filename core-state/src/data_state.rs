//! Persisted fetch and pagination state.
//!
//! There is exactly one live [`DataState`] per logical key. The directional
//! sub-states only exist inside [`DataState::Fixed`], and the `next` and `prev`
//! directions progress independently of each other.

use crate::error::StateError;
use crate::loading_state::{AdditionalLoadingState, LoadingState};

/// Top-level state of a cached entity.
#[derive(Debug, Clone, PartialEq)]
pub enum DataState {
    /// Settled. The cache may or may not hold content.
    Fixed {
        next_data_state: AdditionalDataState,
        prev_data_state: AdditionalDataState,
    },
    /// A full (non-paginated) fetch is in flight.
    Loading,
    /// The last full fetch failed and no cache is assumed valid.
    Error(StateError),
}

impl Default for DataState {
    /// Initial state: settled with both directions exhausted.
    fn default() -> Self {
        Self::fixed(
            AdditionalDataState::FixedWithNoMoreData,
            AdditionalDataState::FixedWithNoMoreData,
        )
    }
}

impl DataState {
    pub fn fixed(next_data_state: AdditionalDataState, prev_data_state: AdditionalDataState) -> Self {
        Self::Fixed {
            next_data_state,
            prev_data_state,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The `next` direction, or `FixedWithNoMoreData` outside of `Fixed`.
    pub fn next_data_state(&self) -> AdditionalDataState {
        match self {
            Self::Fixed {
                next_data_state, ..
            } => next_data_state.clone(),
            Self::Loading | Self::Error(_) => AdditionalDataState::FixedWithNoMoreData,
        }
    }

    /// The `prev` direction, or `FixedWithNoMoreData` outside of `Fixed`.
    pub fn prev_data_state(&self) -> AdditionalDataState {
        match self {
            Self::Fixed {
                prev_data_state, ..
            } => prev_data_state.clone(),
            Self::Loading | Self::Error(_) => AdditionalDataState::FixedWithNoMoreData,
        }
    }

    /// Project this state and the current cache content into the value a
    /// consumer renders.
    ///
    /// A direction can request further data whenever a request key is known
    /// for it, regardless of whether that direction is currently loading or
    /// failed.
    pub fn to_loading_state<T>(&self, content: Option<T>) -> LoadingState<T> {
        let can_next = self.next_data_state().request_key().is_some();
        let can_prev = self.prev_data_state().request_key().is_some();
        self.to_loading_state_with(content, can_next, can_prev)
    }

    /// Same as [`to_loading_state`](Self::to_loading_state) with explicit
    /// "can request" flags.
    pub fn to_loading_state_with<T>(
        &self,
        content: Option<T>,
        can_next_request: bool,
        can_prev_request: bool,
    ) -> LoadingState<T> {
        match self {
            Self::Fixed {
                next_data_state,
                prev_data_state,
            } => match content {
                Some(content) => LoadingState::Completed {
                    content,
                    appending: next_data_state.to_loading_state(can_next_request),
                    prepending: prev_data_state.to_loading_state(can_prev_request),
                },
                None => LoadingState::Loading(None),
            },
            Self::Loading => LoadingState::Loading(content),
            Self::Error(cause) => LoadingState::Error(cause.clone()),
        }
    }
}

/// Pagination state of one direction (`next` or `prev`).
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalDataState {
    /// More data may exist; `request_key` is the cursor for the next fetch.
    Fixed { request_key: String },
    /// Direction exhausted.
    FixedWithNoMoreData,
    /// A directional fetch is in flight for `request_key`.
    Loading { request_key: String },
    /// The last directional fetch failed; the key is kept for a retry.
    Error {
        request_key: String,
        cause: StateError,
    },
}

impl AdditionalDataState {
    /// Settled state for a cursor returned by the origin. A missing or empty
    /// cursor means the direction is exhausted.
    pub fn from_request_key(request_key: Option<String>) -> Self {
        match request_key {
            Some(request_key) if !request_key.is_empty() => Self::Fixed { request_key },
            _ => Self::FixedWithNoMoreData,
        }
    }

    pub fn request_key(&self) -> Option<&str> {
        match self {
            Self::Fixed { request_key }
            | Self::Loading { request_key }
            | Self::Error { request_key, .. } => Some(request_key),
            Self::FixedWithNoMoreData => None,
        }
    }

    /// Drop any in-flight or failed status while keeping the known cursor.
    pub fn settled(&self) -> Self {
        Self::from_request_key(self.request_key().map(str::to_owned))
    }

    pub fn to_loading_state(&self, can_request_additional_data: bool) -> AdditionalLoadingState {
        match self {
            Self::Fixed { .. } | Self::FixedWithNoMoreData => AdditionalLoadingState::Fixed {
                can_request_additional_data,
            },
            Self::Loading { .. } => AdditionalLoadingState::Loading,
            Self::Error { cause, .. } => AdditionalLoadingState::Error(cause.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(k: &str) -> AdditionalDataState {
        AdditionalDataState::Fixed {
            request_key: k.to_string(),
        }
    }

    #[test]
    fn test_default_is_settled_and_exhausted() {
        let state = DataState::default();
        assert_eq!(
            state,
            DataState::fixed(
                AdditionalDataState::FixedWithNoMoreData,
                AdditionalDataState::FixedWithNoMoreData
            )
        );
        assert!(!state.is_loading());
    }

    #[test]
    fn test_from_request_key() {
        assert_eq!(AdditionalDataState::from_request_key(Some("K2".into())), key("K2"));
        assert_eq!(
            AdditionalDataState::from_request_key(Some(String::new())),
            AdditionalDataState::FixedWithNoMoreData
        );
        assert_eq!(
            AdditionalDataState::from_request_key(None),
            AdditionalDataState::FixedWithNoMoreData
        );
    }

    #[test]
    fn test_settled_keeps_cursor() {
        let loading = AdditionalDataState::Loading {
            request_key: "K".into(),
        };
        let failed = AdditionalDataState::Error {
            request_key: "K".into(),
            cause: StateError::NoSuchElement,
        };

        assert_eq!(loading.settled(), key("K"));
        assert_eq!(failed.settled(), key("K"));
        assert_eq!(
            AdditionalDataState::FixedWithNoMoreData.settled(),
            AdditionalDataState::FixedWithNoMoreData
        );
    }

    #[test]
    fn test_directions_outside_fixed() {
        assert_eq!(
            DataState::Loading.next_data_state(),
            AdditionalDataState::FixedWithNoMoreData
        );
        assert_eq!(
            DataState::Error(StateError::NoSuchElement).prev_data_state(),
            AdditionalDataState::FixedWithNoMoreData
        );
    }

    #[test]
    fn test_fixed_with_content_completes() {
        let cause = StateError::origin(anyhow::anyhow!("page failed"));
        let state = DataState::fixed(
            AdditionalDataState::Loading {
                request_key: "N".into(),
            },
            AdditionalDataState::Error {
                request_key: "P".into(),
                cause: cause.clone(),
            },
        );

        assert_eq!(
            state.to_loading_state(Some(vec![1])),
            LoadingState::Completed {
                content: vec![1],
                appending: AdditionalLoadingState::Loading,
                prepending: AdditionalLoadingState::Error(cause),
            }
        );
    }

    #[test]
    fn test_can_request_follows_known_key() {
        let state = DataState::fixed(key("N"), AdditionalDataState::FixedWithNoMoreData);

        assert_eq!(
            state.to_loading_state(Some("a")),
            LoadingState::Completed {
                content: "a",
                appending: AdditionalLoadingState::Fixed {
                    can_request_additional_data: true
                },
                prepending: AdditionalLoadingState::Fixed {
                    can_request_additional_data: false
                },
            }
        );
    }

    #[test]
    fn test_fixed_without_content_degrades_to_loading() {
        let state = DataState::default();
        assert_eq!(state.to_loading_state::<i32>(None), LoadingState::Loading(None));
    }

    #[test]
    fn test_loading_carries_current_content() {
        assert_eq!(
            DataState::Loading.to_loading_state(Some(5)),
            LoadingState::Loading(Some(5))
        );
        assert_eq!(
            DataState::Loading.to_loading_state::<i32>(None),
            LoadingState::Loading(None)
        );
    }

    #[test]
    fn test_error_hides_content() {
        let cause = StateError::origin(anyhow::anyhow!("offline"));
        let state = DataState::Error(cause.clone());

        assert_eq!(state.to_loading_state(Some(5)), LoadingState::Error(cause));
    }
}
