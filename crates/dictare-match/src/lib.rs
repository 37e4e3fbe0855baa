//! Dictare matching crate - reconciles recognized handwriting tokens against
//! the dictated word list.
//!
//! Matching runs in three passes: case-insensitive exact matches first, then a
//! greedy longest-common-substring best match over what is left, then every
//! remaining word is reported as unmatched. No recognized token is ever
//! assigned to two words. The engine is pure and holds no state, so it can be
//! called from any number of sessions at once.

pub mod engine;
pub mod lcs;
pub mod summary;
pub mod tokenize;
pub mod validate;

pub use engine::{reconcile, reconcile_with, ReconcileOptions};
pub use lcs::longest_common_substring_len;
pub use summary::{error_words, summarize};
pub use tokenize::extract_tokens;
pub use validate::{validate, MatchViolation};
