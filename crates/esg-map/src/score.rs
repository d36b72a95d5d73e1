//! Confidence scoring of a normalized header against alias patterns.
//!
//! Three heuristics are evaluated for every pattern and the maximum wins:
//! exact match (1.0), substring containment (length ratio) and token
//! overlap (overlap ratio discounted by [`TOKEN_OVERLAP_DISCOUNT`]).

use std::collections::BTreeSet;
use std::fmt;

use crate::utils::{normalize_text, tokens};

/// Discount applied to token overlap relative to substring containment.
pub const TOKEN_OVERLAP_DISCOUNT: f64 = 0.9;

/// Heuristic that produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchMethod {
    Exact,
    Substring,
    TokenOverlap,
}

impl MatchMethod {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Substring => "substring",
            Self::TokenOverlap => "token overlap",
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Best score of a header against a pattern list, with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternScore {
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Heuristic that produced the confidence.
    pub method: MatchMethod,
    /// Normalized pattern that produced the confidence.
    pub pattern: String,
}

impl PatternScore {
    /// Human-readable explanation of the score.
    pub fn explain(&self) -> String {
        format!(
            "{} match on '{}': {:.0}%",
            self.method,
            self.pattern,
            self.confidence * 100.0
        )
    }
}

/// Scores a normalized header against a list of alias patterns.
///
/// Patterns are normalized before comparison. An empty pattern list, an
/// empty header, or patterns that normalize to nothing score 0.
pub fn score<S: AsRef<str>>(normalized_source: &str, patterns: &[S]) -> f64 {
    score_detailed(normalized_source, patterns).map_or(0.0, |s| s.confidence)
}

/// Like [`score`], but also reports which pattern and heuristic won.
///
/// Returns `None` when nothing scored above zero.
pub fn score_detailed<S: AsRef<str>>(
    normalized_source: &str,
    patterns: &[S],
) -> Option<PatternScore> {
    if normalized_source.is_empty() {
        return None;
    }
    let mut best: Option<PatternScore> = None;
    for raw in patterns {
        let pattern = normalize_text(raw.as_ref());
        if pattern.is_empty() {
            continue;
        }
        if pattern == normalized_source {
            return Some(PatternScore {
                confidence: 1.0,
                method: MatchMethod::Exact,
                pattern,
            });
        }
        for (confidence, method) in [
            (substring_score(normalized_source, &pattern), MatchMethod::Substring),
            (token_overlap_score(normalized_source, &pattern), MatchMethod::TokenOverlap),
        ] {
            if confidence > best.as_ref().map_or(0.0, |b| b.confidence) {
                best = Some(PatternScore {
                    confidence,
                    method,
                    pattern: pattern.clone(),
                });
            }
        }
    }
    best
}

/// Length ratio when one string contains the other, else 0.
///
/// Inputs are normalized and therefore ASCII, so byte length equals
/// character length.
pub fn substring_score(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a.contains(b) || b.contains(a) {
        let (short, long) = if a.len() <= b.len() {
            (a.len(), b.len())
        } else {
            (b.len(), a.len())
        };
        short as f64 / long as f64
    } else {
        0.0
    }
}

/// Share of source tokens found in the pattern, discounted.
///
/// The denominator is the larger token count, so a one-word header never
/// scores high against a long alias just because it shares that word.
pub fn token_overlap_score(source: &str, pattern: &str) -> f64 {
    let source_tokens = tokens(source);
    let pattern_tokens = tokens(pattern);
    let max_len = source_tokens.len().max(pattern_tokens.len());
    if max_len == 0 {
        return 0.0;
    }
    let pattern_set: BTreeSet<&str> = pattern_tokens.iter().copied().collect();
    let matching = source_tokens
        .iter()
        .filter(|t| pattern_set.contains(*t))
        .count()
        .min(max_len);
    matching as f64 / max_len as f64 * TOKEN_OVERLAP_DISCOUNT
}
