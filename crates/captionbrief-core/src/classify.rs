//! Importance classification.
//!
//! Rules are plain data evaluated top to bottom; the first rule with a
//! keyword present in the text decides the tier.

use crate::item::Importance;

/// One classification rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportanceRule {
    pub tier: Importance,
    pub keywords: &'static [&'static str],
}

impl ImportanceRule {
    /// Returns the first keyword of this rule found in lower-cased `text`.
    fn first_hit(&self, lowered: &str) -> Option<&'static str> {
        self.keywords.iter().copied().find(|k| lowered.contains(k))
    }
}

/// Default rules, most urgent first.
pub const IMPORTANCE_RULES: &[ImportanceRule] = &[
    ImportanceRule {
        tier: Importance::Critical,
        keywords: &[
            "deadline",
            "register",
            "registration",
            "apply",
            "application",
            "closes",
            "last day",
            "final day",
            "spots left",
            "limited spots",
            "rsvp",
            "today only",
            "ends today",
            "tickets",
        ],
    },
    ImportanceRule {
        tier: Importance::TimeSensitive,
        keywords: &[
            "event",
            "workshop",
            "seminar",
            "webinar",
            "orientation",
            "meeting",
            "tonight",
            "this week",
            "tomorrow",
            "today",
            "info session",
            "career fair",
            "case competition",
            "boat cruise",
            "tryouts",
            "auditions",
        ],
    },
];

/// Classifies text with the default rules.
pub fn classify(text: &str) -> Importance {
    classify_with(IMPORTANCE_RULES, text)
}

/// Classifies text with a custom rule list. Matching is a case-insensitive
/// substring test; text matching no rule is [`Importance::Fyi`].
pub fn classify_with(rules: &[ImportanceRule], text: &str) -> Importance {
    explain(rules, text).map_or(Importance::Fyi, |(tier, _)| tier)
}

/// Returns the deciding tier and keyword, or `None` when no rule matched.
pub fn explain(rules: &[ImportanceRule], text: &str) -> Option<(Importance, &'static str)> {
    let lowered = text.to_lowercase();
    rules
        .iter()
        .find_map(|rule| rule.first_hit(&lowered).map(|k| (rule.tier, k)))
}
