//! Ledger inspection commands.

use captionbrief_runner::{JsonLedgerStore, LastRun, LedgerStore};

use crate::config::CaptionConfig;
use crate::error::ClientResult;

/// Prints the ledger size and the last run record.
pub fn stats(config: &CaptionConfig) -> ClientResult<()> {
    let data_dir = config.data_dir();
    let store = JsonLedgerStore::in_dir(&data_dir);
    let ledger = store.load()?;

    println!("ledger: {}", store.path().display());
    println!("seen posts: {}", ledger.len());
    match LastRun::load(&data_dir)? {
        Some(last) => {
            println!("last run: {} ({})", last.finished_at.to_rfc3339(), last.generated_on);
            println!("  new posts: {}, scheduled: {}", last.new_posts, last.scheduled);
            if last.partial_failure {
                println!("  failed accounts: {}", last.failed_accounts.join(", "));
            }
        }
        None => println!("last run: never"),
    }
    Ok(())
}

/// Returns whether `shortcode` has already been processed.
pub fn is_seen(config: &CaptionConfig, shortcode: &str) -> ClientResult<bool> {
    let ledger = JsonLedgerStore::in_dir(&config.data_dir()).load()?;
    Ok(!ledger.is_new(shortcode.trim()))
}

/// Prints whether `shortcode` has already been processed.
pub fn check(config: &CaptionConfig, shortcode: &str) -> ClientResult<()> {
    if is_seen(config, shortcode)? {
        println!("{shortcode}: seen");
    } else {
        println!("{shortcode}: new");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use captionbrief_core::SeenLedger;

    #[test]
    fn check_against_saved_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let config = CaptionConfig::parse(&format!(
            "[general]\ndata_dir = {:?}\n",
            dir.path().display().to_string()
        ))
        .unwrap();

        let mut ledger = SeenLedger::new();
        ledger.mark_seen("ABC");
        JsonLedgerStore::in_dir(dir.path()).save(&ledger).unwrap();

        assert!(is_seen(&config, "ABC").unwrap());
        assert!(!is_seen(&config, "XYZ").unwrap());
        assert!(stats(&config).is_ok());
    }
}
