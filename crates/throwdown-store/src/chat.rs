//! Banned-word filtering for chat messages.
//!
//! Filtering happens once at write time — stored text is already sanitized,
//! so renderers never need to know the banned list. Matching is
//! case-insensitive on word boundaries; each matched word is replaced with a
//! placeholder glyph.

use regex::RegexBuilder;

/// The glyph that replaces a banned word.
pub const PLACEHOLDER: &str = "✨";

/// Replace every banned word in `text` with the placeholder glyph.
///
/// Words match case-insensitively and only on word boundaries, so a banned
/// `"trash"` leaves `"trashcan"` alone. An empty banned list returns the
/// text unchanged.
pub fn filter_banned(text: &str, banned_words: &[String]) -> String {
    if banned_words.is_empty() {
        return text.to_owned();
    }

    let alternation = banned_words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"\b(?:{alternation})\b");

    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => re.replace_all(text, PLACEHOLDER).into_owned(),
        Err(e) => {
            // Escaped words cannot produce an invalid pattern in practice;
            // if one somehow does, store the text unfiltered.
            tracing::warn!(error = %e, "Banned-word pattern failed to compile");
            text.to_owned()
        }
    }
}
