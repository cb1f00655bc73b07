//! The seen-post ledger.
//!
//! [`SeenLedger`] records every shortcode that has ever been emitted so a
//! post is processed at most once across runs. It is append-only and
//! serializes as a JSON object mapping each shortcode to `true`, e.g.
//! `{"Cx1": true, "Cx2": true}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Set of processed post shortcodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenLedger {
    entries: BTreeMap<String, bool>,
}

impl SeenLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a ledger from a snapshot. Entries mapped to `false` are
    /// treated as unseen and dropped.
    pub fn from_snapshot(snapshot: BTreeMap<String, bool>) -> Self {
        Self {
            entries: snapshot.into_iter().filter(|(_, seen)| *seen).collect(),
        }
    }

    /// Returns a full copy of the ledger contents.
    pub fn snapshot(&self) -> BTreeMap<String, bool> {
        self.entries.clone()
    }

    /// Returns true if `shortcode` has never been marked.
    pub fn is_new(&self, shortcode: &str) -> bool {
        !self.entries.get(shortcode).copied().unwrap_or(false)
    }

    /// Marks `shortcode` as seen. Returns true if it was not seen before.
    pub fn mark_seen(&mut self, shortcode: impl Into<String>) -> bool {
        let shortcode = shortcode.into();
        let newly = self.is_new(&shortcode);
        self.entries.insert(shortcode, true);
        newly
    }

    /// Returns the number of seen shortcodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over seen shortcodes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
