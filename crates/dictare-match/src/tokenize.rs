//! Splitting recognized OCR lines into candidate tokens.

use std::collections::HashSet;

use dictare_core::config::OcrConfig;

/// Split recognized lines into tokens.
///
/// Lines are split on whitespace and on every character in
/// `config.delimiters`; tokens are trimmed and empty ones dropped. With
/// `config.dedupe`, exact duplicates are removed keeping the first occurrence.
pub fn extract_tokens<I, S>(lines: I, config: &OcrConfig) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let is_delimiter = |c: char| c.is_whitespace() || config.delimiters.contains(c);

    let mut seen = HashSet::new();
    let mut tokens = Vec::new();
    for line in lines {
        for token in line.as_ref().split(is_delimiter) {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            if config.dedupe && !seen.insert(token.to_string()) {
                continue;
            }
            tokens.push(token.to_string());
        }
    }
    tokens
}
