use std::sync::Arc;
use thiserror::Error;

/// Cause stored inside error states and surfaced to consumers.
///
/// Origin failures are kept verbatim behind an `Arc` so the same error can sit
/// in the persisted state and in every projection derived from it. Two
/// `Origin` causes are equal only when they are the same stored error.
#[derive(Error, Debug, Clone)]
pub enum StateError {
    #[error("{0}")]
    Origin(Arc<anyhow::Error>),

    #[error("Additional data was requested but there is no cached data to extend")]
    AdditionalRequestOnNull,

    #[error("Additional data was requested while the data state is an error")]
    AdditionalRequestOnErrorState,

    #[error("No data is available")]
    NoSuchElement,
}

impl StateError {
    /// Wrap an origin failure.
    pub fn origin(error: anyhow::Error) -> Self {
        Self::Origin(Arc::new(error))
    }

    /// The underlying origin error, if this cause came from the origin.
    pub fn origin_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Origin(error) => Some(error.as_ref()),
            _ => None,
        }
    }
}

impl PartialEq for StateError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Origin(a), Self::Origin(b)) => Arc::ptr_eq(a, b),
            (Self::AdditionalRequestOnNull, Self::AdditionalRequestOnNull) => true,
            (Self::AdditionalRequestOnErrorState, Self::AdditionalRequestOnErrorState) => true,
            (Self::NoSuchElement, Self::NoSuchElement) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, StateError>;
