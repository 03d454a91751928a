//! Runtime error types.

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use switchboard_core::{ApiError, TransportError};

/// Errors that can occur while building or running a bot instance.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The transport could not be set up.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A platform API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The initialization `getMe` call did not finish in time.
    #[error("bot initialization timed out after {0:?}")]
    InitTimeout(Duration),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
