//! Digest assembly.
//!
//! A digest presents enriched items grouped by importance tier, in a
//! Markdown-flavoured plaintext form and an HTML form for email clients.
//! Items are ordered by:
//! 1. tier (Critical first)
//! 2. start time, unscheduled items last
//! 3. account, then shortcode
//!
//! # Example
//!
//! ```
//! use captionbrief_core::digest::{assemble, DigestOptions, EMPTY_DIGEST};
//!
//! let digest = assemble(&[], &DigestOptions::default());
//! assert!(digest.text.contains(EMPTY_DIGEST));
//! assert!(digest.html.contains(EMPTY_DIGEST));
//! ```

mod html;
mod text;


use std::cmp::Ordering;

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::item::{EnrichedItem, Importance};
use crate::time::DEFAULT_TIMEZONE;

pub use html::google_calendar_link;

/// Default digest title.
pub const DEFAULT_TITLE: &str = "Caption Brief";

/// Placeholder shown when there is nothing to report.
pub const EMPTY_DIGEST: &str = "No new posts from tracked accounts since the last run.";

/// Banner shown when some accounts failed to fetch.
pub const PARTIAL_FAILURE_NOTICE: &str =
    "Some accounts could not be fetched this run, so this digest may be incomplete.";

/// Options controlling digest rendering.
#[derive(Debug, Clone)]
pub struct DigestOptions {
    /// Heading of the digest.
    pub title: String,
    /// Date appended to the heading, usually the run date.
    pub generated_on: Option<NaiveDate>,
    /// Whether to show the partial-failure banner.
    pub partial_failure: bool,
    /// Zone of the items' local times, passed to calendar links.
    pub timezone: Tz,
    /// Google account selector appended to calendar links.
    pub gcal_authuser: Option<String>,
    /// Base URL where per-event `.ics` files are hosted.
    pub ics_base_url: Option<String>,
}

impl Default for DigestOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            generated_on: None,
            partial_failure: false,
            timezone: DEFAULT_TIMEZONE,
            gcal_authuser: None,
            ics_base_url: None,
        }
    }
}

impl DigestOptions {
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_generated_on(mut self, date: NaiveDate) -> Self {
        self.generated_on = Some(date);
        self
    }

    #[must_use]
    pub fn with_partial_failure(mut self, partial_failure: bool) -> Self {
        self.partial_failure = partial_failure;
        self
    }

    #[must_use]
    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    #[must_use]
    pub fn with_gcal_authuser(mut self, authuser: impl Into<String>) -> Self {
        self.gcal_authuser = Some(authuser.into());
        self
    }

    /// Sets the hosted `.ics` base URL. A trailing slash is dropped.
    #[must_use]
    pub fn with_ics_base_url(mut self, base: impl Into<String>) -> Self {
        self.ics_base_url = Some(base.into().trim_end_matches('/').to_string());
        self
    }

    /// Returns the heading, including the date when set.
    pub fn heading(&self) -> String {
        match self.generated_on {
            Some(date) => format!("{} — {}", self.title, date.format("%Y-%m-%d")),
            None => self.title.clone(),
        }
    }
}

/// A rendered digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    /// Markdown-flavoured plaintext body.
    pub text: String,
    /// HTML body.
    pub html: String,
}

/// Items of one tier, in digest order.
#[derive(Debug, Clone)]
pub struct TierSection<'a> {
    pub tier: Importance,
    pub items: Vec<&'a EnrichedItem>,
}

/// Orders two items for presentation.
pub fn digest_order(a: &EnrichedItem, b: &EnrichedItem) -> Ordering {
    a.importance
        .rank()
        .cmp(&b.importance.rank())
        .then_with(|| match (a.start_at(), b.start_at()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.account().cmp(b.account()))
        .then_with(|| a.shortcode().cmp(b.shortcode()))
}

/// Sorts items into digest order in place.
pub fn sort_items(items: &mut [EnrichedItem]) {
    items.sort_by(digest_order);
}

/// Groups items by tier in fixed tier order, omitting empty tiers.
pub fn group_by_tier(items: &[EnrichedItem]) -> Vec<TierSection<'_>> {
    let mut sorted: Vec<&EnrichedItem> = items.iter().collect();
    sorted.sort_by(|a, b| digest_order(a, b));

    Importance::ALL
        .iter()
        .map(|tier| TierSection {
            tier: *tier,
            items: sorted.iter().copied().filter(|i| i.importance == *tier).collect(),
        })
        .filter(|section| !section.items.is_empty())
        .collect()
}

/// Assembles the digest for `items`.
pub fn assemble(items: &[EnrichedItem], options: &DigestOptions) -> Digest {
    let sections = group_by_tier(items);
    tracing::debug!(
        items = items.len(),
        sections = sections.len(),
        partial_failure = options.partial_failure,
        "Assembling digest"
    );
    Digest {
        text: text::render(&sections, options),
        html: html::render(&sections, options),
    }
}

/// Joins the known parts of an item's date and time.
pub(crate) fn when_label(item: &EnrichedItem) -> Option<String> {
    let date = item.fields.date_hint.as_str();
    let time = item.fields.time_hint.as_str();
    match (date.is_empty(), time.is_empty()) {
        (true, true) => None,
        (false, true) => Some(date.to_string()),
        (true, false) => Some(time.to_string()),
        (false, false) => Some(format!("{date}, {time}")),
    }
}

/// Returns the `label: value` facts present on an item.
pub(crate) fn facts(item: &EnrichedItem) -> Vec<(&'static str, String)> {
    let mut facts = Vec::new();
    if let Some(when) = when_label(item) {
        facts.push(("When", when));
    }
    let fields = &item.fields;
    for (label, value) in [
        ("Where", &fields.venue_hint),
        ("Price", &fields.price_hint),
        ("Contact", &fields.contact_hint),
    ] {
        if !value.is_empty() {
            facts.push((label, value.clone()));
        }
    }
    facts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{item, local};

    mod ordering {
        use super::*;

        #[test]
        fn tier_then_start_then_account_then_shortcode() {
            let mut items = vec![
                item("b", "S4", Importance::Fyi, None),
                item("b", "S3", Importance::Critical, None),
                item("a", "S2", Importance::Critical, Some(local(2026, 10, 20, 9, 0))),
                item("z", "S1", Importance::Critical, Some(local(2026, 10, 18, 9, 0))),
                item("a", "S5", Importance::Critical, None),
                item("a", "S0", Importance::Critical, None),
            ];
            sort_items(&mut items);
            let order: Vec<&str> = items.iter().map(|i| i.shortcode()).collect();
            assert_eq!(order, vec!["S1", "S2", "S0", "S5", "S3", "S4"]);
        }

        #[test]
        fn groups_in_fixed_tier_order() {
            let items = vec![
                item("a", "F", Importance::Fyi, None),
                item("a", "C", Importance::Critical, None),
            ];
            let sections = group_by_tier(&items);
            assert_eq!(sections.len(), 2);
            assert_eq!(sections[0].tier, Importance::Critical);
            assert_eq!(sections[1].tier, Importance::Fyi);
        }

        #[test]
        fn empty_input_has_no_sections() {
            assert!(group_by_tier(&[]).is_empty());
        }
    }

    mod options {
        use super::*;

        #[test]
        fn heading_with_date() {
            let options = DigestOptions::default()
                .with_generated_on(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
            assert_eq!(options.heading(), "Caption Brief — 2026-10-16");
            assert_eq!(DigestOptions::default().heading(), "Caption Brief");
        }

        #[test]
        fn ics_base_url_trailing_slash() {
            let options = DigestOptions::default().with_ics_base_url("https://example.com/events/");
            assert_eq!(options.ics_base_url.as_deref(), Some("https://example.com/events"));
        }
    }

    mod facts {
        use super::*;

        #[test]
        fn only_present_facts() {
            let mut it = item("a", "X", Importance::Fyi, None);
            assert!(facts(&it).is_empty());

            it.fields.price_hint = "Free".to_string();
            it.fields.time_hint = "19:00".to_string();
            assert_eq!(
                facts(&it),
                vec![("When", "19:00".to_string()), ("Price", "Free".to_string())]
            );
        }
    }

    mod assemble {
        use super::*;

        #[test]
        fn empty_placeholder_in_both_forms() {
            let digest = assemble(&[], &DigestOptions::default());
            assert!(digest.text.contains(EMPTY_DIGEST));
            assert!(digest.html.contains(EMPTY_DIGEST));
            assert!(!digest.text.contains("## "));
        }

        #[test]
        fn partial_failure_banner() {
            let options = DigestOptions::default().with_partial_failure(true);
            let digest = assemble(&[], &options);
            assert!(digest.text.contains(PARTIAL_FAILURE_NOTICE));
            assert!(digest.html.contains(PARTIAL_FAILURE_NOTICE));

            let digest = assemble(&[], &DigestOptions::default());
            assert!(!digest.text.contains(PARTIAL_FAILURE_NOTICE));
            assert!(!digest.html.contains(PARTIAL_FAILURE_NOTICE));
        }

        #[test]
        fn empty_tiers_are_omitted() {
            let items = vec![item("a", "X", Importance::Fyi, None)];
            let digest = assemble(&items, &DigestOptions::default());
            assert!(digest.text.contains("## FYI (1)"));
            assert!(!digest.text.contains("Critical"));
            assert!(!digest.text.contains("Time-Sensitive"));
        }
    }
}
