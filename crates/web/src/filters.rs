//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Words kept by [`excerpt`].
const EXCERPT_WORDS: usize = 25;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Truncates text to its first 25 words, marking the cut with an ellipsis.
///
/// Usage in templates: `{{ store.description|excerpt }}`
#[askama::filter_fn]
pub fn excerpt(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(truncate_words(&value.to_string(), EXCERPT_WORDS))
}

fn truncate_words(text: &str, max: usize) -> String {
    let mut words = text.split_whitespace();
    let kept: Vec<&str> = words.by_ref().take(max).collect();
    let mut out = kept.join(" ");
    if words.next().is_some() {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_words_short_text_unchanged() {
        assert_eq!(truncate_words("a  b\nc", 5), "a b c");
    }

    #[test]
    fn test_truncate_words_marks_cut() {
        assert_eq!(truncate_words("one two three four", 2), "one two…");
    }

    #[test]
    fn test_truncate_words_exact_length() {
        assert_eq!(truncate_words("one two", 2), "one two");
    }
}
