//! Pluggable string-similarity scoring.
//!
//! Two scorers cover the engine's two fuzzy tiers: [`TokenOverlapScorer`]
//! (Jaccard overlap of whitespace tokens, used for column-name resolution at
//! threshold [`FIELD_MATCH_THRESHOLD`]) and [`DiffRatioScorer`] (character
//! diff ratio, used for mapping-key lookup at threshold
//! [`KEY_MATCH_THRESHOLD`]). Both compare case-insensitively and return a
//! score in `[0, 1]`.

use std::collections::HashSet;

use similar::TextDiff;

/// Acceptance threshold for fuzzy mapping-key lookups.
pub const KEY_MATCH_THRESHOLD: f64 = 0.8;
/// Acceptance threshold for fuzzy column-name resolution.
pub const FIELD_MATCH_THRESHOLD: f64 = 0.3;

pub trait SimilarityScorer {
    /// Returns a closeness score between two strings in `[0, 1]`.
    fn score(&self, left: &str, right: &str) -> f64;
}

/// Character-level diff ratio, equivalent to a longest-common-subsequence
/// ratio over the lowercased inputs.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiffRatioScorer;

impl SimilarityScorer for DiffRatioScorer {
    fn score(&self, left: &str, right: &str) -> f64 {
        let left = left.to_lowercase();
        let right = right.to_lowercase();
        if left.is_empty() && right.is_empty() {
            return 1.0;
        }
        f64::from(TextDiff::from_chars(left.as_str(), right.as_str()).ratio())
    }
}

/// Jaccard similarity over lowercased whitespace tokens.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenOverlapScorer;

impl SimilarityScorer for TokenOverlapScorer {
    fn score(&self, left: &str, right: &str) -> f64 {
        let left = left.to_lowercase();
        let right = right.to_lowercase();
        let left_tokens: HashSet<&str> = left.split_whitespace().collect();
        let right_tokens: HashSet<&str> = right.split_whitespace().collect();
        if left_tokens.is_empty() || right_tokens.is_empty() {
            return 0.0;
        }
        let intersection = left_tokens.intersection(&right_tokens).count();
        let union = left_tokens.union(&right_tokens).count();
        intersection as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_ratio_scores_identical_strings_as_one() {
        let scorer = DiffRatioScorer;
        assert_eq!(scorer.score("Asistio", "ASISTIO"), 1.0);
    }

    #[test]
    fn diff_ratio_scores_disjoint_strings_low() {
        let scorer = DiffRatioScorer;
        assert!(scorer.score("Marco Legal", "zzz") < KEY_MATCH_THRESHOLD);
    }

    #[test]
    fn token_overlap_counts_shared_words() {
        let scorer = TokenOverlapScorer;
        let score = scorer.score("Nombre programa", "nombre del programa");
        // {nombre, programa} / {nombre, del, programa}
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(scorer.score("", "anything"), 0.0);
    }
}
