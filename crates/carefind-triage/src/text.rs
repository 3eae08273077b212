//! Text normalization and phrase matching shared by the lexicon and catalog.

/// Lower-cases `text`, straightens typographic apostrophes and collapses
/// runs of whitespace to single spaces.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .replace(['\u{2019}', '\u{2018}', '`'], "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `true` when `phrase` occurs in `haystack` starting at a word boundary.
///
/// Only the left edge is anchored, so `rash` matches `rashes` but `ear`
/// does not match `heart`. Both arguments must already be normalized.
#[must_use]
pub fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    haystack.match_indices(phrase).any(|(idx, _)| {
        haystack[..idx]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric())
    })
}
