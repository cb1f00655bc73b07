//! Event title construction.

use std::sync::LazyLock;

use regex::Regex;

use crate::text::{normalize, title_case};

/// Activity phrases recognised as a title hint, in priority order for
/// matches at the same position.
pub const ACTIVITY_KEYWORDS: &[&str] = &[
    "orientation",
    "boat cruise",
    "info session",
    "workshop",
    "seminar",
    "webinar",
    "career fair",
    "case competition",
    "tryouts",
    "auditions",
    "meeting",
    "town hall",
    "open house",
    "social",
    "mixer",
];

/// Title hint used when a caption has no usable words.
pub const FALLBACK_HINT: &str = "Event";

/// Number of leading words used when no activity keyword is present.
const HINT_WORDS: usize = 5;

static ACTIVITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = ACTIVITY_KEYWORDS
        .iter()
        .map(|k| k.replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternatives})\b")).expect("Invalid activity regex")
});

/// Returns the title hint for a caption.
pub fn title_hint(caption: &str) -> String {
    if let Some(m) = ACTIVITY_REGEX.find(caption) {
        return title_case(m.as_str());
    }

    let normalized = normalize(caption);
    let words = normalized
        .split_whitespace()
        .take(HINT_WORDS)
        .collect::<Vec<_>>()
        .join(" ");
    let words = words.trim_end_matches([',', '.', ':', ';']);
    if words.is_empty() {
        FALLBACK_HINT.to_string()
    } else {
        title_case(words)
    }
}

/// Builds `@account — Hint`, followed by ` (date, time)` or ` (date)` when
/// a date is known. The result is never empty.
pub fn build_title(account: &str, caption: &str, date_hint: &str, time_hint: &str) -> String {
    let hint = title_hint(caption);
    let when = match (date_hint.is_empty(), time_hint.is_empty()) {
        (true, _) => String::new(),
        (false, true) => format!(" ({date_hint})"),
        (false, false) => format!(" ({date_hint}, {time_hint})"),
    };
    format!("@{account} — {hint}{when}")
}

#[cfg(test)]
mod tests {
    use super::*;

    mod hint {
        use super::*;

        #[test]
        fn activity_keyword() {
            assert_eq!(title_hint("Join our BOAT CRUISE this weekend"), "Boat Cruise");
            assert_eq!(title_hint("Resume workshop tomorrow"), "Workshop");
        }

        #[test]
        fn earliest_keyword_wins() {
            assert_eq!(title_hint("Social after the meeting"), "Social");
        }

        #[test]
        fn keyword_spanning_whitespace() {
            assert_eq!(title_hint("Open\nHouse on Saturday"), "Open House");
        }

        #[test]
        fn first_five_words_fallback() {
            assert_eq!(
                title_hint("Congrats to the winners of this year's hackathon"),
                "Congrats To The Winners Of"
            );
        }

        #[test]
        fn fallback_strips_trailing_punctuation() {
            assert_eq!(title_hint("🎉 Big news, everyone:"), "Big News, Everyone");
        }

        #[test]
        fn empty_caption() {
            assert_eq!(title_hint(""), FALLBACK_HINT);
            assert_eq!(title_hint("🎉 #tbt"), FALLBACK_HINT);
        }
    }

    mod build {
        use super::*;

        #[test]
        fn with_date_and_time() {
            assert_eq!(
                build_title("engsoc", "Workshop tomorrow at 3pm", "Oct 17", "15:00"),
                "@engsoc — Workshop (Oct 17, 15:00)"
            );
        }

        #[test]
        fn with_date_only() {
            assert_eq!(
                build_title("engsoc", "Open house", "Oct 30", ""),
                "@engsoc — Open House (Oct 30)"
            );
        }

        #[test]
        fn without_date() {
            assert_eq!(
                build_title("engsoc", "Doors at 7pm", "", "19:00"),
                "@engsoc — Doors At 7Pm"
            );
        }

        #[test]
        fn never_empty() {
            assert_eq!(build_title("", "", "", ""), "@ — Event");
            for caption in ["", " ", "#tag", "✨✨", "hello"] {
                assert!(!build_title("a", caption, "", "").is_empty());
            }
        }
    }
}
