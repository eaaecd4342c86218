//! Error types for the health service.

use std::io;

use thiserror::Error;

/// Errors raised while starting the health service.
#[derive(Debug, Error)]
pub enum HealthError {
    /// The listener could not bind the configured address.
    #[error("failed to bind health listener")]
    Bind {
        /// Address that was requested.
        address: String,
        /// Source IO error.
        source: io::Error,
    },
    /// The process is already shutting down.
    #[error("shutdown already requested")]
    ShutdownRequested,
}

/// Result alias for health service operations.
pub type HealthResult<T> = Result<T, HealthError>;
