//! Runner error types.

use std::io;
use thiserror::Error;

/// Result type for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur during a run.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// IO error (ledger, lock, outbox, etc.).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A state file could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Another run holds the lock.
    #[error("Another run is in progress (lock file exists: {path})")]
    AlreadyRunning { path: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Delivery failed.
    #[error("Delivery via {channel} failed: {message}")]
    Delivery { channel: String, message: String },
}

impl RunnerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an already running error.
    pub fn already_running(path: impl Into<String>) -> Self {
        Self::AlreadyRunning { path: path.into() }
    }

    /// Creates a delivery error.
    pub fn delivery(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Delivery {
            channel: channel.into(),
            message: message.into(),
        }
    }
}
