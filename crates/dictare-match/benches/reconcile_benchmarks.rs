//! Benchmarks for reconciliation of a full page of handwriting.
//!
//! The fuzzy pass compares every leftover word against every leftover token,
//! so the worst case is a page where nothing matches exactly.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dictare_match::{longest_common_substring_len, reconcile};

const WORDS: &[&str] = &[
    "book", "ruler", "pencil", "dog", "bird", "eight", "nine", "banana", "orange", "apple",
    "difficult", "beautiful", "necessary", "elephant", "tomorrow", "library", "february",
    "separate", "calendar", "restaurant",
];

/// Drop the middle letter of every word to defeat the exact pass.
fn misspell(word: &str) -> String {
    let mut chars: Vec<char> = word.chars().collect();
    chars.remove(chars.len() / 2);
    chars.into_iter().rev().collect()
}

fn bench_lcs(c: &mut Criterion) {
    c.bench_function("lcs_restaurant", |b| {
        b.iter(|| longest_common_substring_len(black_box("restaurant"), black_box("resturant")))
    });
}

fn bench_reconcile(c: &mut Criterion) {
    let originals: Vec<String> = WORDS.iter().map(|w| w.to_string()).collect();
    let exact: Vec<String> = WORDS.iter().rev().map(|w| w.to_uppercase()).collect();
    let garbled: Vec<String> = WORDS.iter().map(|w| misspell(w)).collect();

    let mut group = c.benchmark_group("reconcile");
    group.bench_function("all_exact_20", |b| {
        b.iter(|| reconcile(black_box(&originals), black_box(&exact)))
    });
    group.bench_function("all_fuzzy_20", |b| {
        b.iter(|| reconcile(black_box(&originals), black_box(&garbled)))
    });
    group.finish();
}

criterion_group!(benches, bench_lcs, bench_reconcile);
criterion_main!(benches);
