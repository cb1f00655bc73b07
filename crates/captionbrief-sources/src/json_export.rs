//! Source backed by per-account JSON exports.
//!
//! An external scraper drops `<dir>/<account>.json` files, each holding an
//! array of post records. This source only reads them.

use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::{SourceError, SourceResult};
use crate::record::RawPostRecord;
use crate::source::{BoxFuture, FetchOptions, PostSource};

const SOURCE_NAME: &str = "json-export";

/// Reads post records from a directory of JSON exports.
#[derive(Debug, Clone)]
pub struct JsonExportSource {
    dir: PathBuf,
}

impl JsonExportSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    /// Returns the export file of an account, rejecting handles that would
    /// escape the export directory.
    fn export_path(&self, account: &str) -> SourceResult<PathBuf> {
        if account.is_empty()
            || account.starts_with('.')
            || account.contains(['/', '\\'])
        {
            return Err(SourceError::configuration(format!("invalid account handle {account:?}"))
                .with_source_name(SOURCE_NAME));
        }
        Ok(self.dir.join(format!("{account}.json")))
    }

    async fn read_records(&self, account: &str) -> SourceResult<Vec<RawPostRecord>> {
        let path = self.export_path(account)?;
        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SourceError::account_not_found(format!(
                    "no export for @{account} at {}",
                    path.display()
                ))
                .with_source_name(SOURCE_NAME));
            }
            Err(e) => {
                return Err(SourceError::internal(format!("failed to read {}", path.display()))
                    .with_source_name(SOURCE_NAME)
                    .with_source(e));
            }
        };

        let mut records: Vec<RawPostRecord> = serde_json::from_slice(&contents).map_err(|e| {
            SourceError::invalid_response(format!("malformed export {}", path.display()))
                .with_source_name(SOURCE_NAME)
                .with_source(e)
        })?;

        // Newest first; records without a readable timestamp sink to the end
        // and are rejected later by validation.
        records.sort_by_key(|r| std::cmp::Reverse(r.taken_at.as_ref().and_then(|t| t.to_utc())));
        tracing::debug!(account = %account, count = records.len(), "read export");
        Ok(records)
    }
}

impl PostSource for JsonExportSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn fetch_posts<'a>(
        &'a self,
        account: &'a str,
        _options: &'a FetchOptions,
    ) -> BoxFuture<'a, SourceResult<Vec<RawPostRecord>>> {
        Box::pin(self.read_records(account))
    }
}
