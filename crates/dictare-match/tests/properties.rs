//! Invariant checks for the reconciliation engine over generated inputs.

use dictare_core::types::MatchStage;
use dictare_match::{reconcile, reconcile_with, validate, ReconcileOptions};
use quickcheck::{Arbitrary, Gen};

const WORDS: &[&str] = &[
    "book", "ruler", "pencil", "dog", "bird", "eight", "nine", "banana", "orange", "apple",
    "difficult", "beautiful", "necessary", "cat", "Dog", "BIRD",
];

/// A dictated list and the tokens read back off a written page.
#[derive(Debug, Clone)]
struct Sheet {
    originals: Vec<String>,
    actuals: Vec<String>,
}

fn below(g: &mut Gen, n: usize) -> usize {
    usize::arbitrary(g) % n
}

fn pick_word(g: &mut Gen) -> String {
    g.choose(WORDS).copied().unwrap_or("book").to_string()
}

/// Simulate a misread: flip case, drop a letter, or swap two letters.
fn garble(word: &str, g: &mut Gen) -> String {
    let mut chars: Vec<char> = word.chars().collect();
    match below(g, 4) {
        0 => word.to_uppercase(),
        1 if chars.len() > 1 => {
            chars.remove(below(g, chars.len()));
            chars.into_iter().collect()
        }
        2 if chars.len() > 1 => {
            let i = below(g, chars.len() - 1);
            chars.swap(i, i + 1);
            chars.into_iter().collect()
        }
        _ => word.to_string(),
    }
}

impl Arbitrary for Sheet {
    fn arbitrary(g: &mut Gen) -> Self {
        let originals: Vec<String> = (0..1 + below(g, 8)).map(|_| pick_word(g)).collect();

        let mut actuals = Vec::new();
        for word in &originals {
            // Roughly one word in five is left off the page.
            if below(g, 5) != 0 {
                actuals.push(garble(word, g));
            }
        }
        for _ in 0..below(g, 3) {
            actuals.push(pick_word(g));
        }
        // Token order is unrelated to dictation order.
        for i in (1..actuals.len()).rev() {
            let j = below(g, i + 1);
            actuals.swap(i, j);
        }

        Sheet { originals, actuals }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let mut smaller = Vec::new();
        for i in 0..self.originals.len() {
            let mut originals = self.originals.clone();
            originals.remove(i);
            smaller.push(Sheet {
                originals,
                actuals: self.actuals.clone(),
            });
        }
        for j in 0..self.actuals.len() {
            let mut actuals = self.actuals.clone();
            actuals.remove(j);
            smaller.push(Sheet {
                originals: self.originals.clone(),
                actuals,
            });
        }
        Box::new(smaller.into_iter())
    }
}

#[quickcheck_macros::quickcheck]
fn prop_uniqueness_membership_and_coverage(sheet: Sheet) -> bool {
    let results = reconcile(&sheet.originals, &sheet.actuals);
    validate(&results, &sheet.originals, &sheet.actuals).is_ok()
}

#[quickcheck_macros::quickcheck]
fn prop_invariants_hold_with_ratio_cutoff(sheet: Sheet) -> bool {
    let options = ReconcileOptions::with_min_ratio(0.3);
    let results = reconcile_with(&sheet.originals, &sheet.actuals, &options);
    validate(&results, &sheet.originals, &sheet.actuals).is_ok()
}

#[quickcheck_macros::quickcheck]
fn prop_exact_match_is_never_downgraded(sheet: Sheet) -> bool {
    let results = reconcile(&sheet.originals, &sheet.actuals);

    // Replay the exact pass: any original that can claim an unused
    // case-insensitive equal token must have been matched at stage 1.
    let mut used = vec![false; sheet.actuals.len()];
    sheet.originals.iter().zip(&results).all(|(original, result)| {
        let lower = original.to_lowercase();
        let available = (0..sheet.actuals.len())
            .find(|&j| !used[j] && sheet.actuals[j].to_lowercase() == lower);
        match available {
            Some(j) => {
                used[j] = true;
                result.stage == MatchStage::Exact && result.is_correct
            }
            None => result.stage != MatchStage::Exact,
        }
    })
}

#[quickcheck_macros::quickcheck]
fn prop_correctness_flag_matches_stage(sheet: Sheet) -> bool {
    reconcile(&sheet.originals, &sheet.actuals)
        .iter()
        .all(|r| {
            r.is_correct == (r.stage == MatchStage::Exact)
                && r.actual.is_none() == (r.stage == MatchStage::Unmatched)
        })
}

#[quickcheck_macros::quickcheck]
fn prop_deterministic(sheet: Sheet) -> bool {
    reconcile(&sheet.originals, &sheet.actuals) == reconcile(&sheet.originals, &sheet.actuals)
}

#[test]
fn case_variant_of_consumed_token_is_not_reassigned() {
    let originals = ["dog", "dogs"];
    let actuals = ["dog", "DOG"];
    let results = reconcile(&originals, &actuals);
    assert_eq!(results[1].stage, MatchStage::Unmatched);
    assert!(validate(&results, &originals, &actuals).is_ok());
}

#[test]
fn repeated_word_takes_each_written_occurrence() {
    let originals = ["dog", "Dog"];
    let actuals = ["dog", "DOG"];
    let results = reconcile(&originals, &actuals);
    assert!(results.iter().all(|r| r.stage == MatchStage::Exact));
    assert!(validate(&results, &originals, &actuals).is_ok());
}

#[test]
fn worked_examples() {
    let results = reconcile(&["book", "ruler", "bird"], &["Book", "rulter", "brid"]);
    let json = serde_json::to_value(&results).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"original": "book", "actual": "Book", "is_correct": true, "stage": 1},
            {"original": "ruler", "actual": "rulter", "is_correct": false, "stage": 2},
            {"original": "bird", "actual": "brid", "is_correct": false, "stage": 2},
        ])
    );

    let results = reconcile(&["cat", "dog"], &["dog"]);
    assert_eq!(results[0].stage, MatchStage::Unmatched);
    assert!(results[0].actual.is_none());
    assert_eq!(results[1].stage, MatchStage::Exact);
}
