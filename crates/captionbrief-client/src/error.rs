//! Client error types.

use thiserror::Error;

use captionbrief_runner::RunnerError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A run could not complete.
    #[error("run failed: {0}")]
    Runner(#[from] RunnerError),

    /// Output could not be encoded.
    #[error("encoding error: {0}")]
    Encode(String),
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err.to_string())
    }
}
