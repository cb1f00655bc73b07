//! Tracked account list.
//!
//! One handle per line. A leading `@` is dropped, blank lines and lines
//! starting with `#` are ignored, and repeated handles keep their first
//! position.

use std::collections::HashSet;
use std::path::Path;

/// Parses the contents of an account list file.
pub fn parse_accounts(contents: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.trim_start_matches('@').trim().to_string())
        .filter(|handle| !handle.is_empty())
        .filter(|handle| seen.insert(handle.to_ascii_lowercase()))
        .collect()
}

/// Reads and parses an account list file.
///
/// # Errors
///
/// Returns the I/O error if the file cannot be read.
pub fn read_accounts(path: &Path) -> std::io::Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)?;
    let accounts = parse_accounts(&contents);
    tracing::debug!(path = %path.display(), count = accounts.len(), "loaded account list");
    Ok(accounts)
}
