use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Words
// =============================================================================

/// Opaque reference to a playable audio clip (file path, URL, cache key).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioRef(pub String);

impl AudioRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AudioRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A canonical word the user is meant to write down.
///
/// Storage keeps the text's case; matching compares case-insensitively.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_ref: Option<AudioRef>,
}

impl Word {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            translation: None,
            audio_ref: None,
        }
    }

    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(translation.into());
        self
    }

    pub fn with_audio(mut self, audio_ref: AudioRef) -> Self {
        self.audio_ref = Some(audio_ref);
        self
    }

    /// Parse a `word - translation` line.
    ///
    /// Any run of `-`, `—`, `_`, `:` or `：` separates the word from its
    /// translation; extra parts are joined with `", "`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let parts: Vec<&str> = line
            .split(is_translation_separator)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        match parts.split_first() {
            None => None,
            Some((text, [])) => Some(Word::new(*text)),
            Some((text, rest)) => Some(Word::new(*text).with_translation(rest.join(", "))),
        }
    }
}

fn is_translation_separator(c: char) -> bool {
    matches!(c, '-' | '—' | '_' | ':' | '：')
}

/// Ordered dictation words. Order is presentation order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordList(Vec<Word>);

impl WordList {
    /// Build a list, dropping words whose text is blank.
    pub fn new(words: Vec<Word>) -> Self {
        Self(
            words
                .into_iter()
                .filter(|w| !w.text.trim().is_empty())
                .collect(),
        )
    }

    /// Parse one word per line (`\n` or `\r`), skipping blank lines.
    pub fn parse(text: &str) -> Self {
        Self(text.split(['\n', '\r']).filter_map(Word::parse_line).collect())
    }

    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(Word::new).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Word> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Word> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Word> {
        self.0.iter_mut()
    }

    /// Word texts in presentation order, used as reconciliation originals.
    pub fn texts(&self) -> Vec<String> {
        self.0.iter().map(|w| w.text.clone()).collect()
    }

    pub fn as_slice(&self) -> &[Word] {
        &self.0
    }

    /// Reorder the words randomly.
    pub fn shuffle<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.0.shuffle(rng);
    }
}

impl<'a> IntoIterator for &'a WordList {
    type Item = &'a Word;
    type IntoIter = std::slice::Iter<'a, Word>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// =============================================================================
// Match results
// =============================================================================

/// Which reconciliation pass produced a result. Serialized as 1, 2 or 3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum MatchStage {
    /// Case-insensitive exact match.
    Exact,
    /// Longest-common-substring best match.
    Fuzzy,
    /// No token could be assigned.
    Unmatched,
}

impl MatchStage {
    pub fn number(&self) -> u8 {
        match self {
            MatchStage::Exact => 1,
            MatchStage::Fuzzy => 2,
            MatchStage::Unmatched => 3,
        }
    }
}

impl From<MatchStage> for u8 {
    fn from(stage: MatchStage) -> Self {
        stage.number()
    }
}

impl TryFrom<u8> for MatchStage {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MatchStage::Exact),
            2 => Ok(MatchStage::Fuzzy),
            3 => Ok(MatchStage::Unmatched),
            other => Err(format!("invalid match stage: {}", other)),
        }
    }
}

impl fmt::Display for MatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStage::Exact => write!(f, "exact"),
            MatchStage::Fuzzy => write!(f, "fuzzy"),
            MatchStage::Unmatched => write!(f, "unmatched"),
        }
    }
}

/// Assignment of one dictated word to at most one recognized token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub original: String,
    pub actual: Option<String>,
    pub is_correct: bool,
    pub stage: MatchStage,
}

impl MatchResult {
    pub fn exact(original: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            actual: Some(actual.into()),
            is_correct: true,
            stage: MatchStage::Exact,
        }
    }

    pub fn fuzzy(original: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            actual: Some(actual.into()),
            is_correct: false,
            stage: MatchStage::Fuzzy,
        }
    }

    pub fn unmatched(original: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            actual: None,
            is_correct: false,
            stage: MatchStage::Unmatched,
        }
    }
}

/// Aggregate counts over a reconciliation result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub correct: usize,
    /// Matched to a token, but not exactly.
    pub wrong: usize,
    /// No token assigned.
    pub missed: usize,
    pub total: usize,
    /// `correct / total`, rounded to the nearest whole percent.
    pub accuracy_percent: u32,
}

// =============================================================================
// Session record
// =============================================================================

/// Everything handed to the persistence collaborator after reconciliation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DictationRecord {
    pub id: Uuid,
    pub title: String,
    pub words: WordList,
    pub results: Vec<MatchResult>,
    pub summary: MatchSummary,
    /// Indexes of words the user skipped during playback.
    pub skipped: Vec<usize>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Session length in whole minutes, rounded.
    #[serde(default)]
    pub elapsed_minutes: i64,
}

impl DictationRecord {
    /// Whole minutes between `started_at` and `finished_at`, rounded.
    pub fn minutes_between(started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> i64 {
        let secs = (finished_at - started_at).num_seconds().max(0);
        (secs + 30) / 60
    }

    /// Entries that were not written correctly.
    pub fn mistakes(&self) -> impl Iterator<Item = &MatchResult> {
        self.results.iter().filter(|r| !r.is_correct)
    }
}

/// Default record title, e.g. `Dictation 2024-03-09 English`.
///
/// The language suffix is `English` when the first word only contains ASCII
/// letters, digits, spaces and common punctuation, `Chinese` otherwise.
pub fn default_title(date: NaiveDate, first_word: Option<&str>) -> String {
    let language = match first_word {
        Some(word) if !is_english(word) => "Chinese",
        _ => "English",
    };
    format!("Dictation {} {}", date.format("%Y-%m-%d"), language)
}

fn is_english(text: &str) -> bool {
    text.chars().all(|c| {
        c.is_ascii_alphanumeric() || c.is_ascii_whitespace() || ".,?!-'\"".contains(c)
    })
}
