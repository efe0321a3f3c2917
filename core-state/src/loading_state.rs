//! Client-facing projections of [`DataState`](crate::DataState).

use crate::error::StateError;

/// The value a consumer observes for one cached entity.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadingState<T> {
    /// A fetch is in progress. Carries the current cache content, if any.
    Loading(Option<T>),
    /// Settled with content, plus the state of each pagination direction.
    Completed {
        content: T,
        appending: AdditionalLoadingState,
        prepending: AdditionalLoadingState,
    },
    /// The last full fetch failed.
    Error(StateError),
}

impl<T> LoadingState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading(_))
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn content(&self) -> Option<&T> {
        match self {
            Self::Loading(content) => content.as_ref(),
            Self::Completed { content, .. } => Some(content),
            Self::Error(_) => None,
        }
    }

    pub fn into_content(self) -> Option<T> {
        match self {
            Self::Loading(content) => content,
            Self::Completed { content, .. } => Some(content),
            Self::Error(_) => None,
        }
    }

    pub fn map_content<U>(self, f: impl FnOnce(T) -> U) -> LoadingState<U> {
        match self {
            Self::Loading(content) => LoadingState::Loading(content.map(f)),
            Self::Completed {
                content,
                appending,
                prepending,
            } => LoadingState::Completed {
                content: f(content),
                appending,
                prepending,
            },
            Self::Error(cause) => LoadingState::Error(cause),
        }
    }

    /// Exhaustive dispatch over the three variants.
    pub fn fold<R>(
        self,
        on_loading: impl FnOnce(Option<T>) -> R,
        on_completed: impl FnOnce(T, AdditionalLoadingState, AdditionalLoadingState) -> R,
        on_error: impl FnOnce(StateError) -> R,
    ) -> R {
        match self {
            Self::Loading(content) => on_loading(content),
            Self::Completed {
                content,
                appending,
                prepending,
            } => on_completed(content, appending, prepending),
            Self::Error(cause) => on_error(cause),
        }
    }

    /// Merge two projections positionally.
    ///
    /// Precedence is `Error > Loading > Completed`. On a double error the left
    /// cause wins. A `Loading` result only carries combined content when both
    /// sides have content.
    pub fn zip<U, R>(self, other: LoadingState<U>, f: impl FnOnce(T, U) -> R) -> LoadingState<R> {
        match (self, other) {
            (Self::Error(cause), _) | (_, LoadingState::Error(cause)) => LoadingState::Error(cause),
            (
                Self::Completed {
                    content: left,
                    appending: left_appending,
                    prepending: left_prepending,
                },
                LoadingState::Completed {
                    content: right,
                    appending: right_appending,
                    prepending: right_prepending,
                },
            ) => LoadingState::Completed {
                content: f(left, right),
                appending: left_appending.zip(right_appending),
                prepending: left_prepending.zip(right_prepending),
            },
            (left, right) => {
                let content = match (left.into_content(), right.into_content()) {
                    (Some(left), Some(right)) => Some(f(left, right)),
                    _ => None,
                };
                LoadingState::Loading(content)
            }
        }
    }
}

/// Projection of one pagination direction.
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalLoadingState {
    Fixed { can_request_additional_data: bool },
    Loading,
    Error(StateError),
}

impl AdditionalLoadingState {
    pub fn fold<R>(
        self,
        on_fixed: impl FnOnce(bool) -> R,
        on_loading: impl FnOnce() -> R,
        on_error: impl FnOnce(StateError) -> R,
    ) -> R {
        match self {
            Self::Fixed {
                can_request_additional_data,
            } => on_fixed(can_request_additional_data),
            Self::Loading => on_loading(),
            Self::Error(cause) => on_error(cause),
        }
    }

    /// Same precedence as [`LoadingState::zip`]. Two `Fixed` sides can request
    /// more data if either one can.
    pub fn zip(self, other: AdditionalLoadingState) -> AdditionalLoadingState {
        match (self, other) {
            (Self::Error(cause), _) | (_, Self::Error(cause)) => Self::Error(cause),
            (Self::Loading, _) | (_, Self::Loading) => Self::Loading,
            (
                Self::Fixed {
                    can_request_additional_data: left,
                },
                Self::Fixed {
                    can_request_additional_data: right,
                },
            ) => Self::Fixed {
                can_request_additional_data: left || right,
            },
        }
    }
}
