//! The fetch stage.
//!
//! Walks the tracked accounts one after the other, validates what the
//! source returns and consults the [`SeenLedger`] before emitting anything.
//! A post is marked seen the moment it is emitted, so a shortcode listed
//! under two accounts only appears once per run.

use chrono::{DateTime, Utc};

use captionbrief_core::{RawPost, SeenLedger};

use crate::error::FailureClass;
use crate::source::{FetchOptions, PostSource};

/// Why an account produced nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountFailure {
    pub class: FailureClass,
    pub message: String,
}

/// What happened with one account.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountOutcome {
    pub account: String,
    /// Posts handed to the analyzer.
    pub emitted: usize,
    /// Posts skipped because the ledger already had them.
    pub already_seen: usize,
    /// Records that failed validation.
    pub rejected: usize,
    pub failure: Option<AccountFailure>,
}

impl AccountOutcome {
    fn new(account: &str) -> Self {
        Self {
            account: account.to_string(),
            ..Self::default()
        }
    }
}

/// Result of a fetch stage.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    /// New posts, grouped by account in account order, newest first within
    /// an account.
    pub posts: Vec<RawPost>,
    pub outcomes: Vec<AccountOutcome>,
}

impl FetchReport {
    /// Returns true if any account failed with a transient or permanent
    /// error. Accounts with no data do not count.
    pub fn partial_failure(&self) -> bool {
        self.outcomes
            .iter()
            .filter_map(|o| o.failure.as_ref())
            .any(|f| f.class.is_failure())
    }

    /// Total number of records rejected by validation.
    pub fn rejected_records(&self) -> usize {
        self.outcomes.iter().map(|o| o.rejected).sum()
    }

    /// Accounts that failed in a way that counts as a partial failure.
    pub fn failed_accounts(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| o.failure.as_ref().is_some_and(|f| f.class.is_failure()))
            .map(|o| o.account.as_str())
    }
}

/// Fetches the posts of every account that are inside the lookback window
/// and not yet in `ledger`.
///
/// Records are expected newest first; the first valid record older than
/// the cutoff ends the account. Invalid records are skipped and counted.
/// Source errors are logged and recorded in the report, never returned.
pub async fn collect_new_posts(
    source: &dyn PostSource,
    accounts: &[String],
    ledger: &mut SeenLedger,
    options: &FetchOptions,
    now: DateTime<Utc>,
) -> FetchReport {
    let cutoff = options.cutoff(now);
    let mut report = FetchReport::default();

    for (index, account) in accounts.iter().enumerate() {
        if index > 0 && !options.account_delay.is_zero() {
            tokio::time::sleep(options.account_delay).await;
        }

        let mut outcome = AccountOutcome::new(account);
        let records = match source.fetch_posts(account, options).await {
            Ok(records) => records,
            Err(e) => {
                let class = e.class();
                if class.is_failure() {
                    tracing::warn!(account = %account, class = %class, error = %e, "fetch failed");
                } else {
                    tracing::info!(account = %account, error = %e, "no data for account");
                }
                outcome.failure = Some(AccountFailure {
                    class,
                    message: e.to_string(),
                });
                report.outcomes.push(outcome);
                continue;
            }
        };

        for record in records {
            let post = match record.validate(account) {
                Ok(post) => post,
                Err(e) => {
                    tracing::warn!(account = %account, error = %e, "skipping record");
                    outcome.rejected += 1;
                    continue;
                }
            };
            if post.taken_at < cutoff {
                break;
            }
            if options
                .max_posts_per_account
                .is_some_and(|max| outcome.emitted >= max)
            {
                break;
            }
            if !ledger.mark_seen(post.shortcode.clone()) {
                outcome.already_seen += 1;
                continue;
            }
            outcome.emitted += 1;
            report.posts.push(post);
        }

        tracing::debug!(
            account = %account,
            emitted = outcome.emitted,
            already_seen = outcome.already_seen,
            rejected = outcome.rejected,
            "account fetched"
        );
        report.outcomes.push(outcome);
    }

    tracing::info!(
        source = source.name(),
        accounts = accounts.len(),
        count = report.posts.len(),
        "fetch stage complete"
    );
    report
}
