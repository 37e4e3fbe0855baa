//! Reconciliation engine.
//!
//! Assigns each dictated word at most one recognized token:
//! 1. Exact pass: case-insensitive equality, first unused token wins.
//! 2. Fuzzy pass: every remaining (word, token) pair with a shared substring
//!    becomes a candidate; candidates are consumed greedily by descending LCS
//!    length, then descending LCS ratio.
//! 3. Unmatched pass: words still without a token get `actual = None`.
//!
//! Results are returned in the order of the dictated words.

use std::cmp::Ordering;
use std::collections::HashSet;

use dictare_core::types::MatchResult;

use crate::lcs::longest_common_substring_len;

/// Tuning for the fuzzy pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReconcileOptions {
    /// Discard fuzzy candidates whose LCS ratio (LCS length / word length)
    /// is below this value. `None` accepts any shared substring.
    pub min_ratio: Option<f64>,
}

impl ReconcileOptions {
    pub fn with_min_ratio(min_ratio: f64) -> Self {
        Self {
            min_ratio: Some(min_ratio),
        }
    }
}

/// A fuzzy-pass candidate pairing.
#[derive(Debug, Clone)]
struct Candidate {
    original_index: usize,
    actual_index: usize,
    match_len: usize,
    ratio: f64,
}

/// Reconcile with the baseline options (no ratio cutoff).
pub fn reconcile<O, A>(originals: &[O], actuals: &[A]) -> Vec<MatchResult>
where
    O: AsRef<str>,
    A: AsRef<str>,
{
    reconcile_with(originals, actuals, &ReconcileOptions::default())
}

/// Reconcile `originals` (ordered) against `actuals` (unordered, may repeat).
///
/// Returns exactly one result per original, in original order. Deterministic
/// for a given input.
pub fn reconcile_with<O, A>(
    originals: &[O],
    actuals: &[A],
    options: &ReconcileOptions,
) -> Vec<MatchResult>
where
    O: AsRef<str>,
    A: AsRef<str>,
{
    if originals.is_empty() {
        return Vec::new();
    }
    if actuals.is_empty() {
        tracing::debug!(originals = originals.len(), "No recognized tokens, all words unmatched");
        return originals
            .iter()
            .map(|o| MatchResult::unmatched(o.as_ref()))
            .collect();
    }

    let lower_originals: Vec<String> = originals.iter().map(|o| o.as_ref().to_lowercase()).collect();
    let lower_actuals: Vec<String> = actuals.iter().map(|a| a.as_ref().to_lowercase()).collect();

    let mut slots: Vec<Option<MatchResult>> = vec![None; originals.len()];
    let mut actual_used = vec![false; actuals.len()];

    // Stage 1: exact matches.
    for (i, lower) in lower_originals.iter().enumerate() {
        let hit = (0..actuals.len()).find(|&j| !actual_used[j] && lower_actuals[j] == *lower);
        if let Some(j) = hit {
            actual_used[j] = true;
            slots[i] = Some(MatchResult::exact(originals[i].as_ref(), actuals[j].as_ref()));
        }
    }

    let exact_count = slots.iter().filter(|s| s.is_some()).count();
    tracing::debug!(exact = exact_count, total = originals.len(), "Exact pass complete");

    // Unused tokens, one per case-insensitive spelling, first occurrence kept.
    // A spelling consumed by the exact pass is not offered again in any case.
    let mut seen: HashSet<&str> = (0..actuals.len())
        .filter(|&j| actual_used[j])
        .map(|j| lower_actuals[j].as_str())
        .collect();
    let remaining_actuals: Vec<usize> = (0..actuals.len())
        .filter(|&j| !actual_used[j] && seen.insert(lower_actuals[j].as_str()))
        .collect();

    // Stage 2: greedy LCS best match.
    let remaining_originals: Vec<usize> = (0..originals.len()).filter(|&i| slots[i].is_none()).collect();
    if !remaining_originals.is_empty() && !remaining_actuals.is_empty() {
        let mut candidates = Vec::new();
        for &i in &remaining_originals {
            let original = &lower_originals[i];
            let original_len = original.chars().count();
            for &j in &remaining_actuals {
                let match_len = longest_common_substring_len(original, &lower_actuals[j]);
                if match_len == 0 {
                    continue;
                }
                let ratio = match_len as f64 / original_len as f64;
                if options.min_ratio.is_some_and(|min| ratio < min) {
                    continue;
                }
                candidates.push(Candidate {
                    original_index: i,
                    actual_index: j,
                    match_len,
                    ratio,
                });
            }
        }

        candidates.sort_by(|a, b| match b.match_len.cmp(&a.match_len) {
            Ordering::Equal => b.ratio.total_cmp(&a.ratio),
            other => other,
        });

        let mut matched_originals = HashSet::new();
        let mut matched_actuals = HashSet::new();
        for candidate in &candidates {
            let lower_actual = lower_actuals[candidate.actual_index].as_str();
            if matched_originals.contains(&candidate.original_index)
                || matched_actuals.contains(lower_actual)
            {
                continue;
            }
            matched_originals.insert(candidate.original_index);
            matched_actuals.insert(lower_actual);

            tracing::trace!(
                original = originals[candidate.original_index].as_ref(),
                actual = actuals[candidate.actual_index].as_ref(),
                match_len = candidate.match_len,
                ratio = candidate.ratio,
                "Fuzzy match accepted"
            );
            slots[candidate.original_index] = Some(MatchResult::fuzzy(
                originals[candidate.original_index].as_ref(),
                actuals[candidate.actual_index].as_ref(),
            ));
        }
    }

    // Stage 3: everything left is unmatched.
    let results: Vec<MatchResult> = slots
        .into_iter()
        .zip(originals)
        .map(|(slot, original)| slot.unwrap_or_else(|| MatchResult::unmatched(original.as_ref())))
        .collect();

    #[cfg(debug_assertions)]
    if let Err(violations) = crate::validate::validate(&results, originals, actuals) {
        for violation in &violations {
            tracing::error!(%violation, "Reconciliation post-condition violated");
        }
    }

    results
}
