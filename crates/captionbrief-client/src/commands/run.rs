//! The `run` command.

use chrono::Utc;
use tracing::{info, warn};

use captionbrief_runner::{
    Delivery, JsonLedgerStore, NotionDelivery, OutboxDelivery, RunSummary, SmtpDelivery, run_once,
};
use captionbrief_sources::{JsonExportSource, read_accounts};

use crate::config::CaptionConfig;
use crate::error::{ClientError, ClientResult};

/// Builds the configured delivery channels.
pub fn deliveries(config: &CaptionConfig) -> ClientResult<Vec<Box<dyn Delivery>>> {
    let mut deliveries: Vec<Box<dyn Delivery>> = Vec::new();
    if let Some(outbox) = &config.outbox {
        deliveries.push(Box::new(OutboxDelivery::new(&outbox.dir)));
    }
    if let Some(email) = &config.email {
        deliveries.push(Box::new(SmtpDelivery::new(&email.resolve()?)?));
    }
    if let Some(notion) = &config.notion {
        deliveries.push(Box::new(NotionDelivery::new(notion.resolve()?)?));
    }
    Ok(deliveries)
}

/// Runs the pipeline once.
pub async fn run(config: &CaptionConfig, dry_run: bool) -> ClientResult<()> {
    let accounts_file = config.accounts_file();
    let accounts = read_accounts(&accounts_file).map_err(|e| {
        ClientError::Config(format!(
            "failed to read account list {}: {e}",
            accounts_file.display()
        ))
    })?;
    if accounts.is_empty() {
        warn!(path = %accounts_file.display(), "account list is empty");
    }

    let run_config = config.run_config(accounts, dry_run)?;
    let source = JsonExportSource::new(config.export_dir());
    let store = JsonLedgerStore::in_dir(&run_config.data_dir);
    let deliveries = if dry_run { Vec::new() } else { deliveries(config)? };
    if !dry_run && deliveries.is_empty() {
        warn!("no delivery configured, printing the digest");
    }

    let summary = run_once(&run_config, &source, &store, &deliveries, Utc::now()).await?;
    info!(new_posts = summary.new_posts, "run finished");

    if dry_run || deliveries.is_empty() {
        print!("{}", summary.digest.text);
    }
    report(&summary);
    Ok(())
}

fn report(summary: &RunSummary) {
    eprintln!(
        "{} new post(s), {} scheduled, {} record(s) skipped",
        summary.new_posts, summary.scheduled, summary.rejected_records
    );
    if summary.partial_failure {
        eprintln!("failed accounts: {}", summary.failed_accounts.join(", "));
    }
    if !summary.dry_run && !summary.ledger_saved {
        eprintln!("warning: the ledger was not saved; these posts will be reported again");
    }
    for (channel, reason) in &summary.delivery_failures {
        eprintln!("warning: delivery via {channel} failed: {reason}");
    }
}
