//! The `analyze` command.

use std::io::Read;

use chrono::{DateTime, Utc};

use captionbrief_core::{Analyzer, EnrichedItem, RawPost, local_now};
use captionbrief_sources::post_url;

use crate::config::CaptionConfig;
use crate::error::ClientResult;

/// Shortcode given to captions analyzed from the command line.
const ADHOC_SHORTCODE: &str = "adhoc";

/// Analyzes one caption as if it had been posted at `now`.
pub fn analyze_caption(
    config: &CaptionConfig,
    caption: &str,
    account: &str,
    now: DateTime<Utc>,
) -> ClientResult<EnrichedItem> {
    let tz = config.timezone()?;
    let account = account.trim_start_matches('@');
    let post = RawPost::new(account, ADHOC_SHORTCODE, post_url(ADHOC_SHORTCODE), now)
        .with_caption(caption.trim());
    let analyzer = Analyzer::new().with_summary_chars(config.digest.summary_chars);
    Ok(analyzer.analyze(post, local_now(now, &tz)))
}

/// Prints the analysis of `caption` (or stdin for `-`) as JSON.
pub fn run(config: &CaptionConfig, caption: &str, account: &str) -> ClientResult<()> {
    let caption = if caption == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        caption.to_string()
    };
    let item = analyze_caption(config, &caption, account, Utc::now())?;
    println!("{}", serde_json::to_string_pretty(&item)?);
    Ok(())
}
