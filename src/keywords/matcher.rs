// Phrase matching primitives.
//
// Phrases compile to case-insensitive regexes with word boundaries asserted
// only on ends that are word characters, so "u.s.c." and "at-will" behave.
// All offsets are byte offsets into the original text; window helpers walk
// by chars so multi-byte text never splits.

use std::ops::Range;

use regex_lite::Regex;
use tracing::warn;

/// Characters inspected on each side of a match for negation phrases.
pub const NEGATION_WINDOW_CHARS: usize = 60;

/// Characters kept on each side of a match in its context snippet (~100 total).
pub const SNIPPET_RADIUS_CHARS: usize = 50;

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A compiled, reusable phrase matcher.
#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    phrase: String,
    regex: Regex,
}

impl PhraseMatcher {
    /// Compile a phrase. Returns `None` for blank phrases.
    pub fn new(phrase: &str) -> Option<Self> {
        let phrase = phrase.trim().to_lowercase();
        let first = phrase.chars().next()?;
        let last = phrase.chars().last()?;

        let mut pattern = String::from("(?i)");
        if is_word_char(first) {
            pattern.push_str(r"\b");
        }
        // Collapse internal whitespace so "schedule  f" still matches "schedule f".
        let escaped: Vec<String> = phrase
            .split_whitespace()
            .map(regex_lite::escape)
            .collect();
        pattern.push_str(&escaped.join(r"\s+"));
        if is_word_char(last) {
            pattern.push_str(r"\b");
        }

        match Regex::new(&pattern) {
            Ok(regex) => Some(Self { phrase, regex }),
            Err(e) => {
                warn!(phrase = %phrase, error = %e, "Skipping keyword that failed to compile");
                None
            }
        }
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Byte ranges of every non-overlapping occurrence, in text order.
    pub fn find_all(&self, text: &str) -> Vec<Range<usize>> {
        self.regex.find_iter(text).map(|m| m.range()).collect()
    }
}

/// One-off check for a phrase anywhere in `text`.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    PhraseMatcher::new(phrase).is_some_and(|m| m.is_match(text))
}

/// Byte offset `n` chars before `from` (clamped to the start of the text).
fn back_chars(text: &str, from: usize, n: usize) -> usize {
    if n == 0 {
        return from;
    }
    text[..from]
        .char_indices()
        .rev()
        .take(n)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(from)
}

/// Byte offset `n` chars after `from` (clamped to the end of the text).
fn forward_chars(text: &str, from: usize, n: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| from + i)
        .unwrap_or(text.len())
}

/// Return the first negation phrase found within `window` chars before or
/// after the occurrence. The matched text itself is not inspected.
pub fn negation_near<'a>(
    text: &str,
    occurrence: &Range<usize>,
    window: usize,
    negations: &'a [PhraseMatcher],
) -> Option<&'a str> {
    let before = &text[back_chars(text, occurrence.start, window)..occurrence.start];
    let after = &text[occurrence.end..forward_chars(text, occurrence.end, window)];

    negations
        .iter()
        .find(|n| n.is_match(before) || n.is_match(after))
        .map(|n| n.phrase())
}

/// Extract a short context snippet around an occurrence with whitespace collapsed.
pub fn context_snippet(text: &str, occurrence: &Range<usize>, radius: usize) -> String {
    let start = back_chars(text, occurrence.start, radius);
    let end = forward_chars(text, occurrence.end, radius);
    let body = text[start..end].split_whitespace().collect::<Vec<_>>().join(" ");

    let mut snippet = String::with_capacity(body.len() + 6);
    if start > 0 {
        snippet.push_str("...");
    }
    snippet.push_str(&body);
    if end < text.len() {
        snippet.push_str("...");
    }
    snippet
}
