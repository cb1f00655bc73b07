//! Post and event record types.
//!
//! This module provides the records that flow through the pipeline:
//! - [`RawPost`]: A post as delivered by a source, immutable once fetched
//! - [`Importance`]: The urgency tier assigned to a post
//! - [`EventFields`]: Structured fields pulled out of a caption
//! - [`EnrichedItem`]: A post together with everything derived from it

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::EventWindow;

/// An unprocessed post.
///
/// Sources validate their records before producing a `RawPost`, so every
/// field here can be trusted downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPost {
    /// Handle of the account that published the post (without `@`).
    pub account: String,
    /// Platform identifier of the post, unique across a run.
    pub shortcode: String,
    /// Public URL of the post.
    pub url: String,
    /// When the post was published.
    pub taken_at: DateTime<Utc>,
    /// The caption exactly as published. Empty when the post had none.
    pub caption: String,
}

impl RawPost {
    /// Creates a new RawPost with an empty caption.
    pub fn new(
        account: impl Into<String>,
        shortcode: impl Into<String>,
        url: impl Into<String>,
        taken_at: DateTime<Utc>,
    ) -> Self {
        Self {
            account: account.into(),
            shortcode: shortcode.into(),
            url: url.into(),
            taken_at,
            caption: String::new(),
        }
    }

    /// Builder method to set the caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }
}

/// Urgency tier of a post, most urgent first.
///
/// The derived ordering follows severity: `Critical < TimeSensitive < Fyi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    /// Requires action before a deadline (registration, tickets, RSVP).
    Critical,
    /// Announces something happening soon.
    TimeSensitive,
    /// Everything else.
    Fyi,
}

impl Importance {
    /// All tiers in presentation order.
    pub const ALL: [Importance; 3] = [Self::Critical, Self::TimeSensitive, Self::Fyi];

    /// Returns the sort rank of this tier (0 is the most urgent).
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::TimeSensitive => 1,
            Self::Fyi => 2,
        }
    }

    /// Returns the human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::TimeSensitive => "Time-Sensitive",
            Self::Fyi => "FYI",
        }
    }

    /// Returns the accent colour used by the HTML digest.
    pub fn accent_color(&self) -> &'static str {
        match self {
            Self::Critical => "#c0392b",
            Self::TimeSensitive => "#d68910",
            Self::Fyi => "#2e86c1",
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Structured fields extracted from a caption.
///
/// Missing fields are empty strings rather than options so that rendering
/// code never has to special-case absence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFields {
    /// Resolved date, formatted like `Oct 17`.
    pub date_hint: String,
    /// Detected clock time, formatted `HH:MM` in 24-hour time.
    pub time_hint: String,
    /// Venue phrase (e.g. `Main Hall`, `Room 204`).
    pub venue_hint: String,
    /// Price text (e.g. `$15`) or `Free`.
    pub price_hint: String,
    /// First email address found.
    pub contact_hint: String,
    /// First http(s) URL found.
    pub url_found: String,
    /// Whether the caption points readers to the link in the account bio.
    pub link_in_bio: bool,
    /// Resolved start/end, present only when a date was detected.
    pub schedule: Option<EventWindow>,
}

/// A post enriched with derived fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedItem {
    /// The original post.
    #[serde(flatten)]
    pub post: RawPost,
    /// Extractive summary of the caption.
    pub summary: String,
    /// Urgency tier.
    pub importance: Importance,
    /// Extracted event fields.
    #[serde(flatten)]
    pub fields: EventFields,
    /// Short human title, never empty.
    pub event_title: String,
}

impl EnrichedItem {
    /// Returns the account handle.
    pub fn account(&self) -> &str {
        &self.post.account
    }

    /// Returns the post shortcode.
    pub fn shortcode(&self) -> &str {
        &self.post.shortcode
    }

    /// Returns the resolved event window, if any.
    pub fn schedule(&self) -> Option<&EventWindow> {
        self.fields.schedule.as_ref()
    }

    /// Returns the resolved local start time, if any.
    pub fn start_at(&self) -> Option<NaiveDateTime> {
        self.fields.schedule.map(|w| w.start)
    }

    /// Returns the resolved local end time, if any.
    pub fn end_at(&self) -> Option<NaiveDateTime> {
        self.fields.schedule.map(|w| w.end)
    }

    /// Returns true if the item has a temporal anchor.
    pub fn is_scheduled(&self) -> bool {
        self.fields.schedule.is_some()
    }
}
