//! Post sources for captionbrief.
//!
//! This crate defines the [`PostSource`] trait, validates raw records at the
//! boundary and runs the fetch stage that consults the seen ledger.
//!
//! Shipped sources:
//! - [`JsonExportSource`]: per-account JSON exports produced by an external scraper
//! - [`MemorySource`]: in-memory records, for tests and dry runs

pub mod accounts;
pub mod error;
pub mod fetch;
pub mod json_export;
pub mod record;
pub mod source;

pub use accounts::{parse_accounts, read_accounts};
pub use error::{FailureClass, SourceError, SourceErrorCode, SourceResult};
pub use fetch::{AccountFailure, AccountOutcome, FetchReport, collect_new_posts};
pub use json_export::JsonExportSource;
pub use record::{RawPostRecord, RecordError, RecordTime, post_url};
pub use source::{BoxFuture, DEFAULT_LOOKBACK_DAYS, ErrorSource, FetchOptions, MemorySource, PostSource};
