//! One complete run: fetch, analyze, assemble, encode, persist, deliver.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use captionbrief_core::digest::sort_items;
use captionbrief_core::{
    Analyzer, CalendarEncoder, DEFAULT_TIMEZONE, Digest, DigestOptions, InviteParties, assemble,
    combined_filename, local_now,
};
use captionbrief_sources::{FetchOptions, PostSource, collect_new_posts};

use crate::delivery::{Attachment, Delivery, DeliveryPayload, Invite};
use crate::error::RunnerResult;
use crate::ledger_store::{LedgerStore, write_json_atomic};
use crate::lock::RunLock;

/// File name of the run record inside the data directory.
pub const LAST_RUN_FILE_NAME: &str = "last_run.json";

/// Settings of a run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Tracked accounts, in digest order.
    pub accounts: Vec<String>,
    /// Holds the run lock and `last_run.json`.
    pub data_dir: PathBuf,
    pub timezone: Tz,
    pub fetch: FetchOptions,
    /// Title, calendar link and hosting settings. The date, zone and
    /// partial-failure flag are filled in by the run.
    pub digest: DigestOptions,
    /// Summary length passed to the analyzer.
    pub summary_chars: Option<usize>,
    /// When set, per-event files are invites between these parties instead
    /// of published events.
    pub invites: Option<InviteParties>,
    /// Skip ledger persistence and delivery.
    pub dry_run: bool,
}

impl RunConfig {
    pub fn new(accounts: Vec<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            accounts,
            data_dir: data_dir.into(),
            timezone: DEFAULT_TIMEZONE,
            fetch: FetchOptions::default(),
            digest: DigestOptions::default(),
            summary_chars: None,
            invites: None,
            dry_run: false,
        }
    }

    #[must_use]
    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    #[must_use]
    pub fn with_fetch(mut self, fetch: FetchOptions) -> Self {
        self.fetch = fetch;
        self
    }

    #[must_use]
    pub fn with_digest(mut self, digest: DigestOptions) -> Self {
        self.digest = digest;
        self
    }

    #[must_use]
    pub fn with_summary_chars(mut self, chars: usize) -> Self {
        self.summary_chars = Some(chars);
        self
    }

    #[must_use]
    pub fn with_invites(mut self, parties: InviteParties) -> Self {
        self.invites = Some(parties);
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn analyzer(&self) -> Analyzer {
        match self.summary_chars {
            Some(chars) => Analyzer::new().with_summary_chars(chars),
            None => Analyzer::new(),
        }
    }
}

/// Record of the last completed run, stored as `last_run.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastRun {
    pub finished_at: DateTime<Utc>,
    pub generated_on: NaiveDate,
    pub new_posts: usize,
    pub scheduled: usize,
    pub partial_failure: bool,
    pub failed_accounts: Vec<String>,
}

impl LastRun {
    /// Reads the run record from the data directory, if any.
    pub fn load(data_dir: &Path) -> RunnerResult<Option<Self>> {
        let path = data_dir.join(LAST_RUN_FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

/// What a run did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub generated_on: NaiveDate,
    /// Posts that passed the ledger.
    pub new_posts: usize,
    /// Items with a calendar window.
    pub scheduled: usize,
    pub rejected_records: usize,
    pub partial_failure: bool,
    pub failed_accounts: Vec<String>,
    pub ledger_saved: bool,
    /// Channels that accepted the digest.
    pub delivered: Vec<String>,
    /// Channels that failed, with the reason.
    pub delivery_failures: Vec<(String, String)>,
    pub digest: Digest,
    pub payload: DeliveryPayload,
    pub dry_run: bool,
}

/// Runs the whole pipeline once.
///
/// The run lock is held from before the ledger is loaded until the end.
/// Ledger persistence and delivery failures are logged and reported in the
/// summary; they do not fail the run.
///
/// # Errors
///
/// Fails if the lock cannot be taken or the ledger cannot be loaded.
pub async fn run_once(
    config: &RunConfig,
    source: &dyn PostSource,
    store: &dyn LedgerStore,
    deliveries: &[Box<dyn Delivery>],
    now: DateTime<Utc>,
) -> RunnerResult<RunSummary> {
    let _lock = RunLock::acquire_in(&config.data_dir)?;
    let mut ledger = store.load()?;
    let before = ledger.len();

    let report = collect_new_posts(source, &config.accounts, &mut ledger, &config.fetch, now).await;
    let partial_failure = report.partial_failure();
    let rejected_records = report.rejected_records();
    let failed_accounts: Vec<String> = report.failed_accounts().map(str::to_string).collect();

    let local = local_now(now, &config.timezone);
    let generated_on = local.date();
    let mut items = config.analyzer().analyze_all(report.posts, local);
    sort_items(&mut items);
    let new_posts = items.len();
    let scheduled = items.iter().filter(|item| item.is_scheduled()).count();

    let options = config
        .digest
        .clone()
        .with_generated_on(generated_on)
        .with_partial_failure(partial_failure)
        .with_timezone(config.timezone);
    let digest = assemble(&items, &options);

    let encoder = CalendarEncoder::new(config.timezone);
    let mut attachments = Vec::new();
    let combined = encoder.encode_at(&items, now);
    if !combined.is_empty() {
        attachments.push(Attachment::calendar(
            combined_filename(generated_on),
            combined.to_bytes(),
        ));
    }
    let per_event = match &config.invites {
        Some(parties) => encoder.encode_invites_at(&items, parties, now),
        None => encoder.encode_each_at(&items, now),
    };
    let invites = per_event
        .into_iter()
        .map(|(id, document)| Invite {
            filename: format!("{id}.ics"),
            bytes: document.to_bytes(),
        })
        .collect();

    let payload = DeliveryPayload {
        subject: options.heading(),
        html_body: digest.html.clone(),
        text_body: digest.text.clone(),
        attachments,
        invites,
    };

    let mut summary = RunSummary {
        generated_on,
        new_posts,
        scheduled,
        rejected_records,
        partial_failure,
        failed_accounts,
        ledger_saved: false,
        delivered: Vec::new(),
        delivery_failures: Vec::new(),
        digest,
        payload,
        dry_run: config.dry_run,
    };

    if config.dry_run {
        info!(new_posts, scheduled, "dry run, skipping ledger and delivery");
        return Ok(summary);
    }

    match store.save(&ledger) {
        Ok(()) => summary.ledger_saved = true,
        Err(e) => error!(error = %e, "failed to save ledger"),
    }
    let last_run = LastRun {
        finished_at: now,
        generated_on,
        new_posts,
        scheduled,
        partial_failure,
        failed_accounts: summary.failed_accounts.clone(),
    };
    if let Err(e) = write_json_atomic(&config.data_dir.join(LAST_RUN_FILE_NAME), &last_run) {
        warn!(error = %e, "failed to write run record");
    }

    for delivery in deliveries {
        match delivery.deliver(&summary.payload).await {
            Ok(()) => summary.delivered.push(delivery.name().to_string()),
            Err(e) => {
                error!(channel = delivery.name(), error = %e, "delivery failed");
                summary
                    .delivery_failures
                    .push((delivery.name().to_string(), e.to_string()));
            }
        }
    }

    info!(
        new_posts,
        scheduled,
        seen = ledger.len(),
        newly_seen = ledger.len().saturating_sub(before),
        partial_failure,
        delivered = summary.delivered.len(),
        "run complete"
    );
    Ok(summary)
}
