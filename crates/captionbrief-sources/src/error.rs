//! Error types for post sources.
//!
//! Every failure carries a [`SourceErrorCode`], and every code maps to one
//! [`FailureClass`]. The fetch stage only looks at the class: no-data
//! results are routine, anything else marks the run as partially failed.

use std::fmt;
use thiserror::Error;

/// How a failure affects a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// The account has nothing to offer (unknown, private with no data).
    NoData,
    /// Worth retrying on the next run.
    Transient,
    /// Will not resolve without intervention.
    Permanent,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoData => "no_data",
            Self::Transient => "transient",
            Self::Permanent => "permanent",
        }
    }

    /// Returns true if this class should be reported as a partial failure.
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::NoData)
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The category of a source error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceErrorCode {
    /// The account does not exist or has no data at this source.
    AccountNotFound,
    /// Credentials are missing, invalid or expired.
    AuthenticationFailed,
    /// Credentials are valid but lack access to the account.
    AuthorizationFailed,
    /// The source throttled us.
    RateLimited,
    /// Connection failure, timeout, DNS resolution.
    NetworkError,
    /// The remote side failed (5xx).
    ServerError,
    /// Data could not be parsed.
    InvalidResponse,
    /// The source itself is misconfigured.
    ConfigurationError,
    /// Unexpected local failure.
    InternalError,
}

impl SourceErrorCode {
    /// Returns the failure class of this code.
    pub fn class(&self) -> FailureClass {
        match self {
            Self::AccountNotFound => FailureClass::NoData,
            Self::RateLimited | Self::NetworkError | Self::ServerError => FailureClass::Transient,
            Self::AuthenticationFailed
            | Self::AuthorizationFailed
            | Self::InvalidResponse
            | Self::ConfigurationError
            | Self::InternalError => FailureClass::Permanent,
        }
    }

    /// Returns true if this error is transient.
    pub fn is_retryable(&self) -> bool {
        self.class() == FailureClass::Transient
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccountNotFound => "account_not_found",
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::RateLimited => "rate_limited",
            Self::NetworkError => "network_error",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for SourceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised by a [`PostSource`](crate::PostSource).
#[derive(Debug, Error)]
pub struct SourceError {
    code: SourceErrorCode,
    message: String,
    /// Name of the source that raised the error (e.g. `json-export`).
    source_name: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SourceError {
    pub fn new(code: SourceErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source_name: None,
            source: None,
        }
    }

    pub fn account_not_found(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::AccountNotFound, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::AuthenticationFailed, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::AuthorizationFailed, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::RateLimited, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::NetworkError, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::ServerError, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::InvalidResponse, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::ConfigurationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::InternalError, message)
    }

    /// Sets the name of the source that raised the error.
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Attaches the underlying error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> SourceErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    pub fn class(&self) -> FailureClass {
        self.code.class()
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.source_name {
            write!(f, "[{name}] ")?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert_eq!(SourceErrorCode::AccountNotFound.class(), FailureClass::NoData);
        for code in [
            SourceErrorCode::RateLimited,
            SourceErrorCode::NetworkError,
            SourceErrorCode::ServerError,
        ] {
            assert_eq!(code.class(), FailureClass::Transient, "{code}");
            assert!(code.is_retryable());
        }
        for code in [
            SourceErrorCode::AuthenticationFailed,
            SourceErrorCode::AuthorizationFailed,
            SourceErrorCode::ConfigurationError,
        ] {
            assert_eq!(code.class(), FailureClass::Permanent, "{code}");
            assert!(!code.is_retryable());
        }
    }

    #[test]
    fn no_data_is_not_a_failure() {
        assert!(!FailureClass::NoData.is_failure());
        assert!(FailureClass::Transient.is_failure());
        assert!(FailureClass::Permanent.is_failure());
    }

    #[test]
    fn display_includes_source_name() {
        let err = SourceError::rate_limited("slow down").with_source_name("json-export");
        let display = err.to_string();
        assert!(display.contains("[json-export]"));
        assert!(display.contains("rate_limited"));
        assert!(display.contains("slow down"));
        assert_eq!(err.source_name(), Some("json-export"));
    }

    #[test]
    fn with_source() {
        use std::error::Error;
        let err = SourceError::internal("read failed").with_source(std::io::Error::other("disk"));
        assert!(err.source().is_some());
        assert_eq!(err.message(), "read failed");
    }
}
