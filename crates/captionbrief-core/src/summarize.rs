//! Extractive caption summaries.
//!
//! The summary is built from at most two whole sentences of the caption,
//! picked by a small score that favours calls to action and anything that
//! looks like a date or a clock time.

use crate::extract::{TIME_REGEX, has_date_expression};
use crate::text::ellipsis;

/// Summary used when a caption has no text.
pub const NO_CAPTION: &str = "(No caption)";

/// Summary length used by the analyzer.
pub const DEFAULT_SUMMARY_CHARS: usize = 360;

/// Number of leading sentences considered.
const SCANNED_SENTENCES: usize = 8;

/// Number of sentences kept.
const KEPT_SENTENCES: usize = 2;

/// Phrases that ask the reader to act.
pub const CALL_TO_ACTION_KEYWORDS: &[&str] = &[
    "register", "apply", "rsvp", "join", "sign up", "tickets", "deadline", "free",
];

/// Splits text into trimmed, non-empty sentences.
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace, or at a
/// newline.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let (end, next_start) = match c {
            '\n' => (i, i + 1),
            '.' | '!' | '?' if chars.peek().is_some_and(|(_, n)| n.is_whitespace()) => {
                (i + 1, i + 1)
            }
            _ => continue,
        };
        let part = text[start..end].trim();
        if !part.is_empty() {
            parts.push(part);
        }
        start = next_start;
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        parts.push(rest);
    }
    parts
}

/// Scores one sentence.
pub fn score_sentence(sentence: &str) -> u32 {
    let lowered = sentence.to_lowercase();
    let mut score = CALL_TO_ACTION_KEYWORDS
        .iter()
        .filter(|k| lowered.contains(*k))
        .count() as u32
        * 2;
    if has_date_expression(sentence) {
        score += 2;
    }
    if TIME_REGEX.is_match(sentence) {
        score += 1;
    }
    score
}

/// Summarizes `text` in at most `max_chars` characters.
pub fn summarize(text: &str, max_chars: usize) -> String {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return NO_CAPTION.to_string();
    }

    let mut scored: Vec<(u32, &str)> = sentences
        .iter()
        .take(SCANNED_SENTENCES)
        .map(|s| (score_sentence(s), *s))
        .collect();
    scored.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| a.1.chars().count().cmp(&b.1.chars().count()))
    });

    let mut kept: Vec<&str> = Vec::with_capacity(KEPT_SENTENCES);
    for (_, sentence) in scored {
        if !kept.contains(&sentence) {
            kept.push(sentence);
        }
        if kept.len() == KEPT_SENTENCES {
            break;
        }
    }

    ellipsis(&kept.join(" "), max_chars).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    mod split {
        use super::*;

        #[test]
        fn punctuation_and_newlines() {
            assert_eq!(
                split_sentences("Hi there! Come by.\nDoors open?  Yes"),
                vec!["Hi there!", "Come by.", "Doors open?", "Yes"]
            );
        }

        #[test]
        fn punctuation_without_space_does_not_split() {
            assert_eq!(
                split_sentences("Visit example.com today. Thanks"),
                vec!["Visit example.com today.", "Thanks"]
            );
        }

        #[test]
        fn trailing_punctuation() {
            assert_eq!(split_sentences("Done."), vec!["Done."]);
            assert!(split_sentences("  \n ").is_empty());
        }
    }

    mod scoring {
        use super::*;

        #[test]
        fn call_to_action_counts_twice() {
            assert_eq!(score_sentence("Join us"), 2);
            assert_eq!(score_sentence("Register and apply"), 4);
        }

        #[test]
        fn date_and_time() {
            assert_eq!(score_sentence("Oct 20"), 2);
            assert_eq!(score_sentence("at 3pm"), 1);
            assert_eq!(score_sentence("Free on Oct 20 at 3pm"), 5);
            assert_eq!(score_sentence("Nice weather"), 0);
        }
    }

    mod summarize {
        use super::*;

        #[test]
        fn empty_caption() {
            assert_eq!(summarize("", DEFAULT_SUMMARY_CHARS), NO_CAPTION);
            assert_eq!(summarize("   ", DEFAULT_SUMMARY_CHARS), NO_CAPTION);
        }

        #[test]
        fn picks_best_two() {
            let text = "Great turnout last week. Register by Oct 20 for the next one! Thanks all.";
            assert_eq!(
                summarize(text, DEFAULT_SUMMARY_CHARS),
                "Register by Oct 20 for the next one! Thanks all."
            );
        }

        #[test]
        fn duplicates_are_skipped() {
            assert_eq!(summarize("Join us! Join us! Bye.", DEFAULT_SUMMARY_CHARS), "Join us! Bye.");
        }

        #[test]
        fn only_first_eight_sentences_scanned() {
            let text = "One. Two. Three. Four. Five. Six. Seven. Eight. Register now.";
            let summary = summarize(text, DEFAULT_SUMMARY_CHARS);
            assert!(!summary.contains("Register"));
            assert_eq!(summary, "One. Two.");
        }

        #[test]
        fn single_sentence() {
            assert_eq!(summarize("Just one line", 100), "Just one line");
        }

        #[test]
        fn truncated_with_ellipsis() {
            let text = "Register today for the annual engineering gala featuring dinner \
                        dancing and a silent auction supporting student clubs";
            let summary = summarize(text, 40);
            assert!(summary.chars().count() <= 40);
            assert!(summary.ends_with('…'));
            assert_eq!(summary, "Register today for the annual…");
        }
    }
}
