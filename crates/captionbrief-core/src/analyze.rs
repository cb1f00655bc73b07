//! Turns raw posts into enriched items.

use chrono::NaiveDateTime;

use crate::classify::{IMPORTANCE_RULES, ImportanceRule, classify_with};
use crate::extract::extract;
use crate::item::{EnrichedItem, RawPost};
use crate::summarize::{DEFAULT_SUMMARY_CHARS, summarize};
use crate::text::normalize;
use crate::title::build_title;

/// Caption analyzer.
///
/// Holds the tunables of the analysis; [`analyze`] uses the defaults.
#[derive(Debug, Clone)]
pub struct Analyzer {
    summary_chars: usize,
    rules: &'static [ImportanceRule],
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            summary_chars: DEFAULT_SUMMARY_CHARS,
            rules: IMPORTANCE_RULES,
        }
    }
}

impl Analyzer {
    /// Creates an analyzer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum summary length in characters.
    #[must_use]
    pub fn with_summary_chars(mut self, chars: usize) -> Self {
        self.summary_chars = chars;
        self
    }

    /// Replaces the importance rules.
    #[must_use]
    pub fn with_rules(mut self, rules: &'static [ImportanceRule]) -> Self {
        self.rules = rules;
        self
    }

    /// Analyzes one post. `now` is the local wall-clock time of the run.
    pub fn analyze(&self, post: RawPost, now: NaiveDateTime) -> EnrichedItem {
        let text = normalize(&post.caption);
        let fields = extract(&text, &post.account, now);
        let importance = classify_with(self.rules, &text);
        let summary = summarize(&text, self.summary_chars);
        let event_title = build_title(&post.account, &text, &fields.date_hint, &fields.time_hint);

        tracing::debug!(
            account = %post.account,
            shortcode = %post.shortcode,
            importance = %importance,
            scheduled = fields.schedule.is_some(),
            "Analyzed post"
        );

        EnrichedItem {
            post,
            summary,
            importance,
            fields,
            event_title,
        }
    }

    /// Analyzes a batch of posts, keeping their order.
    pub fn analyze_all(&self, posts: Vec<RawPost>, now: NaiveDateTime) -> Vec<EnrichedItem> {
        posts.into_iter().map(|p| self.analyze(p, now)).collect()
    }
}

/// Analyzes one post with default settings.
pub fn analyze(post: RawPost, now: NaiveDateTime) -> EnrichedItem {
    Analyzer::default().analyze(post, now)
}

/// Analyzes a batch of posts with default settings.
pub fn analyze_all(posts: Vec<RawPost>, now: NaiveDateTime) -> Vec<EnrichedItem> {
    Analyzer::default().analyze_all(posts, now)
}
