//! Run orchestration for captionbrief.
//!
//! This crate ties the pieces together for one scheduled run:
//! - A PID-file run lock so runs never overlap
//! - Loading and saving the seen ledger
//! - Assembling the digest and calendar files
//! - Delivering them to the outbox directory, by email and to Notion
//!
//! # Example
//!
//! ```rust,no_run
//! use captionbrief_runner::{JsonLedgerStore, OutboxDelivery, RunConfig, run_once};
//! use captionbrief_sources::JsonExportSource;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::new(vec!["engsoc".into()], "data");
//!     let source = JsonExportSource::new("exports");
//!     let store = JsonLedgerStore::in_dir(&config.data_dir);
//!     let deliveries: Vec<Box<dyn captionbrief_runner::Delivery>> =
//!         vec![Box::new(OutboxDelivery::new("dist"))];
//!     let summary = run_once(&config, &source, &store, &deliveries, chrono::Utc::now()).await?;
//!     println!("{} new posts", summary.new_posts);
//!     Ok(())
//! }
//! ```

mod delivery;
mod error;
mod ledger_store;
mod lock;
mod notion;
mod pipeline;
mod smtp;

pub use delivery::{
    Attachment, CALENDAR_MIME, Delivery, DeliveryPayload, Invite, OUTBOX_EVENTS_DIR,
    OUTBOX_HTML_FILE, OUTBOX_TEXT_FILE, OutboxDelivery,
};
pub use error::{RunnerError, RunnerResult};
pub use ledger_store::{JsonLedgerStore, LEDGER_FILE_NAME, LedgerStore, MemoryLedgerStore};
pub use lock::{LOCK_FILE_NAME, RunLock};
pub use notion::{NOTION_PAGES_URL, NOTION_VERSION, NotionDelivery, NotionSettings};
pub use pipeline::{LAST_RUN_FILE_NAME, LastRun, RunConfig, RunSummary, run_once};
pub use smtp::{IMPLICIT_TLS_PORT, SmtpDelivery, SmtpSettings};
