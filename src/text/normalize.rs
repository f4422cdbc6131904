//! Label canonicalization.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonicalize text for comparison.
///
/// Lowercases, strips diacritics via canonical decomposition, removes literal
/// `.` characters and collapses whitespace runs to a single space. The result
/// is trimmed and the function is idempotent.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c) && *c != '.')
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
