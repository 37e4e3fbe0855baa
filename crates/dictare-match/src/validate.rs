//! Post-condition checks for reconciliation output.

use std::collections::HashMap;

use dictare_core::types::{MatchResult, MatchStage};

/// A broken reconciliation post-condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchViolation {
    #[error("token \"{0}\" assigned to more than one word")]
    DuplicateActual(String),
    #[error("token \"{0}\" is not among the recognized tokens")]
    ForeignActual(String),
    #[error("expected {expected} results, got {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("result {index} is for \"{found}\", expected \"{expected}\"")]
    OrderMismatch {
        index: usize,
        expected: String,
        found: String,
    },
}

/// Verify uniqueness, membership and coverage of a result set.
///
/// Token comparisons are case-insensitive. A token value may be assigned as
/// many times as it occurs among `actuals`, and only to exact matches when
/// assigned more than once; a fuzzy assignment owns its value outright.
/// Returns every violation found.
pub fn validate<O, A>(
    results: &[MatchResult],
    originals: &[O],
    actuals: &[A],
) -> Result<(), Vec<MatchViolation>>
where
    O: AsRef<str>,
    A: AsRef<str>,
{
    let mut violations = Vec::new();

    if results.len() != originals.len() {
        violations.push(MatchViolation::LengthMismatch {
            expected: originals.len(),
            found: results.len(),
        });
    }

    for (index, (result, original)) in results.iter().zip(originals).enumerate() {
        if result.original != original.as_ref() {
            violations.push(MatchViolation::OrderMismatch {
                index,
                expected: original.as_ref().to_string(),
                found: result.original.clone(),
            });
        }
    }

    let mut available: HashMap<String, usize> = HashMap::new();
    for actual in actuals {
        *available.entry(actual.as_ref().to_lowercase()).or_default() += 1;
    }

    let mut assigned: HashMap<String, (usize, bool)> = HashMap::new();
    for result in results {
        let Some(actual) = result.actual.as_deref() else {
            continue;
        };
        let lower = actual.to_lowercase();
        let Some(&limit) = available.get(&lower) else {
            violations.push(MatchViolation::ForeignActual(actual.to_string()));
            continue;
        };
        let (count, fuzzy) = assigned.entry(lower).or_insert((0, false));
        *count += 1;
        *fuzzy |= result.stage == MatchStage::Fuzzy;
        if *count > limit || (*count > 1 && *fuzzy) {
            violations.push(MatchViolation::DuplicateActual(actual.to_string()));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
