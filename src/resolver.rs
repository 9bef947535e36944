//! Column name resolution against a dataset's actual field names.
//!
//! Configuration refers to columns by logical name; real files rarely agree
//! on exact spelling ("Fecha" vs "Fecha (DD/MM/AA)"). [`resolve_field`] tries
//! four strategies in strict order and returns the first hit:
//!
//! 1. exact match
//! 2. case-insensitive exact match
//! 3. domain synonym groups (a logical name containing a term of a group
//!    matches a candidate containing any term of the same group)
//! 4. token-overlap similarity above [`FIELD_MATCH_THRESHOLD`]
//!
//! The function is pure. Ties in the similarity tier are broken by candidate
//! iteration order, so the result is deterministic only for a stable
//! candidate ordering; datasets keep field order stable, which makes this
//! hold in practice.

use crate::similarity::{FIELD_MATCH_THRESHOLD, SimilarityScorer, TokenOverlapScorer};

/// Terms that refer to the same domain concept across file layouts.
const SYNONYM_GROUPS: &[&[&str]] = &[
    &["nombre", "programa", "tema"],
    &["fecha", "date"],
    &["modulo", "módulo", "module"],
    &["ciudad", "city"],
];

/// Resolves a logical column name to an actual field name, or `None` when no
/// strategy succeeds. Callers decide whether a miss is fatal.
pub fn resolve_field<'a>(logical: &str, candidates: &'a [String]) -> Option<&'a str> {
    resolve_field_with(logical, candidates, &TokenOverlapScorer)
}

/// [`resolve_field`] with an explicit scorer for the similarity tier.
pub fn resolve_field_with<'a>(
    logical: &str,
    candidates: &'a [String],
    scorer: &dyn SimilarityScorer,
) -> Option<&'a str> {
    if let Some(found) = candidates.iter().find(|c| c.as_str() == logical) {
        return Some(found);
    }

    let logical_lower = logical.to_lowercase();
    if let Some(found) = candidates
        .iter()
        .find(|c| c.to_lowercase() == logical_lower)
    {
        return Some(found);
    }

    for group in SYNONYM_GROUPS {
        if !group.iter().any(|term| logical_lower.contains(term)) {
            continue;
        }
        if let Some(found) = candidates.iter().find(|c| {
            let candidate_lower = c.to_lowercase();
            group.iter().any(|term| candidate_lower.contains(term))
        }) {
            return Some(found);
        }
    }

    candidates
        .iter()
        .find(|c| scorer.score(logical, c) > FIELD_MATCH_THRESHOLD)
        .map(String::as_str)
}
