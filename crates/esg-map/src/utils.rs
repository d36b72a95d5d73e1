//! Utility functions for mapping operations.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Normalizes a header or alias for comparison.
///
/// Lowercases, strips diacritics, drops parenthesized segments such as unit
/// suffixes, keeps only ASCII letters, digits and whitespace, then collapses
/// whitespace. The output is always ASCII.
pub fn normalize_text(raw: &str) -> String {
    let folded: String = raw
        .to_lowercase()
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect();
    strip_parenthesized(&folded)
        .chars()
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Removes `( ... )` segments, including nested ones.
///
/// An unmatched `(` drops the remainder of the string, which matches how a
/// trailing unit suffix like `"Peso (kg"` is meant to be read.
fn strip_parenthesized(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0usize;
    for ch in raw.chars() {
        match ch {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Splits normalized text into tokens.
pub fn tokens(normalized: &str) -> Vec<&str> {
    normalized.split_whitespace().collect()
}
