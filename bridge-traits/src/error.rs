use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Origin fetch timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
