//! Caption text normalization.
//!
//! Captions are full of emoji, hashtags and hard line breaks. The helpers
//! here reduce a caption to plain single-spaced text so the detectors in
//! [`crate::extract`] and [`crate::summarize`] see predictable input.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Regex for `#word` hashtags.
static HASHTAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\w+").expect("Invalid hashtag regex"));

/// Regex for whitespace runs, newlines included.
static WHITESPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Code point ranges treated as decoration.
///
/// Covers emoji and pictograph blocks (regional indicators included),
/// miscellaneous symbols, dingbats, arrows, technical symbols, variation
/// selectors, the zero-width joiner, the keycap combiner and tag characters.
/// General punctuation such as dashes and quotes is kept.
const DECORATIVE_RANGES: &[(u32, u32)] = &[
    (0x1F000, 0x1FAFF),
    (0x2600, 0x27BF),
    (0x2B00, 0x2BFF),
    (0x2190, 0x21FF),
    (0x2300, 0x23FF),
    (0xFE00, 0xFE0F),
    (0x200D, 0x200D),
    (0x20E3, 0x20E3),
    (0xE0020, 0xE007F),
];

/// Maximum distance, in characters, that [`ellipsis`] backs up to find a
/// word boundary.
const WORD_BOUNDARY_WINDOW: usize = 15;

/// Returns true if `c` is a decorative code point.
pub fn is_decorative(c: char) -> bool {
    let cp = c as u32;
    DECORATIVE_RANGES
        .iter()
        .any(|&(lo, hi)| (lo..=hi).contains(&cp))
}

/// Removes decorative code points.
pub fn strip_decorative(s: &str) -> String {
    s.chars().filter(|c| !is_decorative(*c)).collect()
}

/// Removes `#word` hashtags.
pub fn strip_hashtags(s: &str) -> Cow<'_, str> {
    HASHTAG_REGEX.replace_all(s, "")
}

/// Collapses whitespace runs into single spaces and trims both ends.
pub fn squeeze_whitespace(s: &str) -> String {
    WHITESPACE_REGEX.replace_all(s, " ").trim().to_string()
}

/// Normalizes a raw caption.
///
/// ```
/// use captionbrief_core::text::normalize;
///
/// assert_eq!(normalize("🎉 Career Fair!\n\n#jobs  Free"), "Career Fair! Free");
/// ```
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let plain = strip_decorative(raw);
    squeeze_whitespace(&strip_hashtags(&plain))
}

/// Truncates `s` to at most `max_chars` characters, ending with `…`.
///
/// When the cut would land inside a word and a space exists within the
/// last few characters, the cut moves back to that space.
pub fn ellipsis(s: &str, max_chars: usize) -> Cow<'_, str> {
    if s.chars().count() <= max_chars {
        return Cow::Borrowed(s);
    }
    if max_chars == 0 {
        return Cow::Borrowed("");
    }

    let budget = max_chars - 1;
    let chars: Vec<char> = s.chars().collect();
    let mut cut = budget;

    if !chars[budget].is_whitespace()
        && let Some(space) = chars[..budget].iter().rposition(|c| c.is_whitespace())
        && space > 0
        && budget - space <= WORD_BOUNDARY_WINDOW
    {
        cut = space;
    }

    let kept: String = chars[..cut].iter().collect();
    let kept = kept.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':'));
    Cow::Owned(format!("{kept}…"))
}

/// Upper-cases the first letter of each word and lower-cases the rest.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut out = String::with_capacity(word.len());
            let mut started = false;
            for c in word.chars() {
                if !started && c.is_alphabetic() {
                    out.extend(c.to_uppercase());
                    started = true;
                } else if started {
                    out.extend(c.to_lowercase());
                } else {
                    out.push(c);
                }
            }
            out
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escapes text for HTML display.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    mod normalize {
        use super::*;

        #[test]
        fn empty_input() {
            assert_eq!(normalize(""), "");
            assert_eq!(normalize("   \n\t "), "");
        }

        #[test]
        fn strips_emoji_and_hashtags() {
            assert_eq!(
                normalize("🚀 Launch party ✨ tonight! #uoft #engsoc"),
                "Launch party tonight!"
            );
        }

        #[test]
        fn collapses_newlines() {
            assert_eq!(normalize("Line one\n\nLine two\r\n  three"), "Line one Line two three");
        }

        #[test]
        fn keeps_dashes_and_quotes() {
            assert_eq!(normalize("Doors 6 – 9 — “free”"), "Doors 6 – 9 — “free”");
        }

        #[test]
        fn strips_flags_and_keycaps() {
            // Regional indicators, variation selector and keycap combiner.
            assert_eq!(normalize("🇨🇦 Canada 1\u{FE0F}\u{20E3} day"), "Canada 1 day");
        }

        #[test]
        fn strips_zwj_sequences() {
            assert_eq!(normalize("Team 👩\u{200D}💻 meetup"), "Team meetup");
        }
    }

    mod helpers {
        use super::*;

        #[test]
        fn decorative_ranges() {
            assert!(is_decorative('🎉'));
            assert!(is_decorative('☀'));
            assert!(is_decorative('➡'));
            assert!(!is_decorative('a'));
            assert!(!is_decorative('é'));
            assert!(!is_decorative('—'));
        }

        #[test]
        fn hashtags_only() {
            assert_eq!(strip_hashtags("Go #team go"), "Go  go");
            assert_eq!(strip_hashtags("no tags"), "no tags");
        }

        #[test]
        fn squeeze() {
            assert_eq!(squeeze_whitespace("  a \n b  "), "a b");
        }

        #[test]
        fn title_case_words() {
            assert_eq!(title_case("career fair"), "Career Fair");
            assert_eq!(title_case("JOIN us at UofT"), "Join Us At Uoft");
            assert_eq!(title_case("'quoted' word"), "'Quoted' Word");
        }

        #[test]
        fn escapes_special_chars() {
            assert_eq!(
                html_escape("<a href=\"x\">Tom & Jerry's</a>"),
                "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#x27;s&lt;/a&gt;"
            );
        }
    }

    mod ellipsis {
        use super::*;

        #[test]
        fn short_string_unchanged() {
            assert_eq!(ellipsis("hello", 10), "hello");
            assert_eq!(ellipsis("hello", 5), "hello");
        }

        #[test]
        fn zero_length() {
            assert_eq!(ellipsis("hello", 0), "");
        }

        #[test]
        fn cuts_at_word_boundary() {
            let out = ellipsis("Register today for the annual engineering gala", 30);
            assert_eq!(out, "Register today for the annual…");
            assert!(out.chars().count() <= 30);
        }

        #[test]
        fn cut_exactly_before_space() {
            // The character at the cut is a space, so nothing is dropped.
            assert_eq!(ellipsis("abcd efgh", 5), "abcd…");
        }

        #[test]
        fn long_word_is_hard_cut() {
            let out = ellipsis("Supercalifragilisticexpialidocious", 10);
            assert_eq!(out, "Supercali…");
            assert_eq!(out.chars().count(), 10);
        }

        #[test]
        fn trims_trailing_punctuation() {
            assert_eq!(ellipsis("Alpha, beta gamma delta", 13), "Alpha, beta…");
            assert_eq!(ellipsis("Alpha; beta", 9), "Alpha…");
        }

        #[test]
        fn never_exceeds_max_and_never_splits_words() {
            let text = "Join the Engineering Society for a night of games, food and \
                        prizes. Everyone welcome, bring a friend along with you.";
            for max in 20..text.chars().count() {
                let out = ellipsis(text, max);
                assert!(out.chars().count() <= max, "max {max}: {out}");
                assert!(out.ends_with('…'));
                let body = out.trim_end_matches('…');
                let last_word = body.split_whitespace().last().unwrap();
                assert!(
                    text.split_whitespace()
                        .any(|w| w.trim_end_matches([',', '.']) == last_word.trim_end_matches([',', '.'])),
                    "max {max}: partial word {last_word:?}"
                );
            }
        }
    }
}
