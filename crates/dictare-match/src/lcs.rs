//! Longest common substring.
//!
//! Contiguous runs matter more than edit distance for handwriting OCR: a
//! misread letter breaks a word into runs, and the longest surviving run is a
//! good indicator of which word was meant.

/// Length in characters of the longest contiguous substring shared by `a` and `b`.
///
/// Comparison is exact; callers lower-case both sides first. Runs in
/// O(|a|·|b|) time using a single rolling row of the DP table.
pub fn longest_common_substring_len(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // prev[j] holds the run length ending at a[i-1], b[j-1].
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    let mut best = 0;

    for &ca in &a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            best = best.max(curr[j + 1]);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    best
}
