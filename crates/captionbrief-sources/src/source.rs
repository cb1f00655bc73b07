//! PostSource trait definition.
//!
//! A [`PostSource`] hands back the raw records for one account, newest
//! first. Sources do not know about the ledger or the lookback window
//! beyond the hints in [`FetchOptions`]; the fetch stage enforces both.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};

use crate::error::{SourceError, SourceResult};
use crate::record::RawPostRecord;

/// Default lookback window in days.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;

/// Options for fetching posts.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Posts older than `now - lookback` are ignored.
    pub lookback: Duration,
    /// Maximum number of posts emitted per account.
    pub max_posts_per_account: Option<usize>,
    /// Pause between two accounts.
    pub account_delay: StdDuration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            lookback: Duration::days(DEFAULT_LOOKBACK_DAYS),
            max_posts_per_account: None,
            account_delay: StdDuration::ZERO,
        }
    }
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_lookback(mut self, lookback: Duration) -> Self {
        self.lookback = lookback;
        self
    }

    #[must_use]
    pub fn with_max_posts_per_account(mut self, max: usize) -> Self {
        self.max_posts_per_account = Some(max);
        self
    }

    #[must_use]
    pub fn with_account_delay(mut self, delay: StdDuration) -> Self {
        self.account_delay = delay;
        self
    }

    /// Returns the oldest instant still inside the lookback window.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.lookback
    }
}

/// A boxed future for async trait methods.
///
/// Boxing keeps the trait object-safe so the runner can hold a
/// `Box<dyn PostSource>` picked at startup.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A backend that returns the recent posts of an account.
///
/// # Implementation Notes
///
/// - Records must come back newest first
/// - A missing or unknown account is [`SourceErrorCode::AccountNotFound`](crate::SourceErrorCode::AccountNotFound),
///   not an empty list, so the run can log it
/// - Individual malformed records are fine; they are validated and skipped
///   one by one
pub trait PostSource: Send + Sync {
    /// Returns the name of this source (e.g. `json-export`).
    fn name(&self) -> &str;

    /// Fetches the raw records of one account.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` when the account cannot be read at all.
    fn fetch_posts<'a>(
        &'a self,
        account: &'a str,
        options: &'a FetchOptions,
    ) -> BoxFuture<'a, SourceResult<Vec<RawPostRecord>>>;
}

/// A source that always fails with the same error.
///
/// Used when the configured source cannot be built, and in tests.
#[derive(Debug)]
pub struct ErrorSource {
    name: String,
    error: SourceError,
}

impl ErrorSource {
    pub fn new(name: impl Into<String>, error: SourceError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

impl PostSource for ErrorSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_posts<'a>(
        &'a self,
        _account: &'a str,
        _options: &'a FetchOptions,
    ) -> BoxFuture<'a, SourceResult<Vec<RawPostRecord>>> {
        let error =
            SourceError::new(self.error.code(), self.error.message()).with_source_name(&self.name);
        Box::pin(async move { Err(error) })
    }
}

/// An in-memory source keyed by account.
///
/// Accounts without an entry answer with `AccountNotFound`; accounts
/// registered through [`MemorySource::with_failure`] answer with that error.
#[derive(Debug, Default)]
pub struct MemorySource {
    posts: HashMap<String, Vec<RawPostRecord>>,
    failures: HashMap<String, SourceError>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the records of an account. Order is kept as given.
    #[must_use]
    pub fn with_account(mut self, account: impl Into<String>, records: Vec<RawPostRecord>) -> Self {
        self.posts.insert(account.into(), records);
        self
    }

    /// Makes every fetch of `account` fail with `error`.
    #[must_use]
    pub fn with_failure(mut self, account: impl Into<String>, error: SourceError) -> Self {
        self.failures.insert(account.into(), error);
        self
    }
}

impl PostSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch_posts<'a>(
        &'a self,
        account: &'a str,
        _options: &'a FetchOptions,
    ) -> BoxFuture<'a, SourceResult<Vec<RawPostRecord>>> {
        let result = if let Some(error) = self.failures.get(account) {
            Err(SourceError::new(error.code(), error.message()).with_source_name(self.name()))
        } else {
            self.posts.get(account).cloned().ok_or_else(|| {
                SourceError::account_not_found(format!("no posts for @{account}"))
                    .with_source_name(self.name())
            })
        };
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceErrorCode;

    #[test]
    fn fetch_options_defaults() {
        let options = FetchOptions::new();
        assert_eq!(options.lookback, Duration::days(7));
        assert_eq!(options.max_posts_per_account, None);
        assert_eq!(options.account_delay, StdDuration::ZERO);
    }

    #[test]
    fn fetch_options_builder() {
        let options = FetchOptions::new()
            .with_lookback(Duration::days(2))
            .with_max_posts_per_account(5)
            .with_account_delay(StdDuration::from_millis(250));
        assert_eq!(options.lookback, Duration::days(2));
        assert_eq!(options.max_posts_per_account, Some(5));
        assert_eq!(options.account_delay, StdDuration::from_millis(250));
    }

    #[test]
    fn cutoff() {
        let now = DateTime::parse_from_rfc3339("2026-10-16T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let cutoff = FetchOptions::new().cutoff(now);
        assert_eq!(cutoff.to_rfc3339(), "2026-10-09T12:00:00+00:00");
    }

    #[tokio::test]
    async fn error_source_fails() {
        let source = ErrorSource::new("broken", SourceError::network("unreachable"));
        let err = source
            .fetch_posts("engsoc", &FetchOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), SourceErrorCode::NetworkError);
        assert_eq!(err.source_name(), Some("broken"));
    }

    #[tokio::test]
    async fn memory_source() {
        let record = RawPostRecord::new("ABC", "2026-10-15T10:00:00Z");
        let source = MemorySource::new()
            .with_account("engsoc", vec![record])
            .with_failure("careers", SourceError::rate_limited("429"));
        let options = FetchOptions::default();

        assert_eq!(source.fetch_posts("engsoc", &options).await.unwrap().len(), 1);
        assert_eq!(
            source.fetch_posts("careers", &options).await.unwrap_err().code(),
            SourceErrorCode::RateLimited
        );
        assert_eq!(
            source.fetch_posts("nobody", &options).await.unwrap_err().code(),
            SourceErrorCode::AccountNotFound
        );
    }
}
