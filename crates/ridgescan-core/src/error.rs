use thiserror::Error;

use crate::status::StatusCode;

#[derive(Error, Debug)]
pub enum Error {
    // Lifecycle errors
    #[error("Object disposed")]
    Disposed,

    #[error("Capture engine initialization failed: {0}")]
    Initialization(StatusCode),

    // State errors
    #[error("{operation} is not allowed in state '{current}' (requires {expected})")]
    InvalidState {
        operation: String,
        current: String,
        expected: String,
    },

    // Validation errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Runtime errors
    #[error("Worker thread spawn failed: {0}")]
    WorkerSpawn(String),
}

impl Error {
    /// Shorthand for [`Error::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// Shorthand for [`Error::InvalidState`].
    pub fn invalid_state(
        operation: impl Into<String>,
        current: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Error::InvalidState {
            operation: operation.into(),
            current: current.into(),
            expected: expected.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
