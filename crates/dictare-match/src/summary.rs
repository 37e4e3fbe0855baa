//! Aggregate statistics over reconciliation results.

use dictare_core::types::{MatchResult, MatchSummary};

/// Count correct, wrong and missed words.
pub fn summarize(results: &[MatchResult]) -> MatchSummary {
    let total = results.len();
    let correct = results.iter().filter(|r| r.is_correct).count();
    let missed = results.iter().filter(|r| r.actual.is_none()).count();
    let wrong = total - correct - missed;

    let accuracy_percent = if total == 0 {
        0
    } else {
        (correct as f64 / total as f64 * 100.0).round() as u32
    };

    MatchSummary {
        correct,
        wrong,
        missed,
        total,
        accuracy_percent,
    }
}

/// Render incorrect entries as `original-actual`, comma separated.
///
/// Unmatched words render with an empty right-hand side (`cat-`).
pub fn error_words(results: &[MatchResult]) -> String {
    results
        .iter()
        .filter(|r| !r.is_correct)
        .map(|r| format!("{}-{}", r.original, r.actual.as_deref().unwrap_or_default()))
        .collect::<Vec<_>>()
        .join(",")
}
