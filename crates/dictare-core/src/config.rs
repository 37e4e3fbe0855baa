use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DictareError, Result};

/// Top-level configuration for Dictare.
///
/// Loaded from `~/.dictare/config.toml` by default. Sections are handed to the
/// subsystems explicitly when a session is constructed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DictareConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
}

impl DictareConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DictareConfig = toml::from_str(&content)?;
        config.playback.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| DictareError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory for the local record cache and audio manifest.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.dictare/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Playback pacing for a dictation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// How many times each word is played before advancing.
    pub repeat_count: u32,
    /// Pause between two plays of the same word.
    pub repeat_gap_ms: u64,
    /// Pause after a word's last repeat before the next word starts.
    pub word_gap_ms: u64,
    /// Delay before skipping forward after a missing asset or an audio error.
    pub error_delay_ms: u64,
    /// How many times the completion cue is played.
    pub cue_repeats: u32,
    /// Audio file played once every word has been presented.
    pub cue_path: Option<String>,
    /// Present the words in random order.
    pub shuffle: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            repeat_count: 3,
            repeat_gap_ms: 1500,
            word_gap_ms: 5000,
            error_delay_ms: 500,
            cue_repeats: 2,
            cue_path: None,
            shuffle: false,
        }
    }
}

impl PlaybackConfig {
    /// Reject pacing that cannot be honoured.
    pub fn validate(&self) -> Result<()> {
        if self.repeat_count == 0 {
            return Err(DictareError::Config(
                "playback.repeat_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn repeat_gap(&self) -> Duration {
        Duration::from_millis(self.repeat_gap_ms)
    }

    pub fn word_gap(&self) -> Duration {
        Duration::from_millis(self.word_gap_ms)
    }

    pub fn error_delay(&self) -> Duration {
        Duration::from_millis(self.error_delay_ms)
    }
}

/// Reconciliation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum LCS ratio (LCS length / original length) a fuzzy match needs.
    /// `None` accepts any shared substring.
    pub min_ratio: Option<f64>,
}

/// How recognized OCR lines are split into tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Characters that separate tokens in addition to whitespace.
    pub delimiters: String,
    /// Drop exact duplicate tokens, keeping the first occurrence.
    pub dedupe: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            delimiters: ",，、;；".to_string(),
            dedupe: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = DictareConfig::default();
        assert_eq!(config.general.data_dir, "~/.dictare/data");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.playback.repeat_count, 3);
        assert_eq!(config.playback.repeat_gap_ms, 1500);
        assert_eq!(config.playback.word_gap_ms, 5000);
        assert_eq!(config.playback.error_delay_ms, 500);
        assert_eq!(config.playback.cue_repeats, 2);
        assert!(config.playback.cue_path.is_none());
        assert!(config.matching.min_ratio.is_none());
        assert_eq!(config.ocr.delimiters, ",，、;；");
        assert!(config.ocr.dedupe);
    }

    #[test]
    fn test_repeat_gap_shorter_than_word_gap() {
        let playback = PlaybackConfig::default();
        assert!(playback.repeat_gap() < playback.word_gap());
        assert_eq!(playback.error_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
data_dir = "/custom/data"
log_level = "debug"

[playback]
repeat_count = 2
repeat_gap_ms = 800
word_gap_ms = 3000
error_delay_ms = 250
cue_repeats = 3
cue_path = "/sounds/done.mp3"

[matching]
min_ratio = 0.3

[ocr]
delimiters = ",;"
dedupe = false
"#;
        let file = create_temp_config(content);
        let config = DictareConfig::load(file.path()).unwrap();
        assert_eq!(config.general.data_dir, "/custom/data");
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.playback.repeat_count, 2);
        assert_eq!(config.playback.word_gap(), Duration::from_secs(3));
        assert_eq!(config.playback.cue_path.as_deref(), Some("/sounds/done.mp3"));
        assert_eq!(config.matching.min_ratio, Some(0.3));
        assert_eq!(config.ocr.delimiters, ",;");
        assert!(!config.ocr.dedupe);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[playback]
repeat_count = 5
"#;
        let file = create_temp_config(content);
        let config = DictareConfig::load(file.path()).unwrap();
        assert_eq!(config.playback.repeat_count, 5);
        assert_eq!(config.playback.repeat_gap_ms, 1500);
        assert_eq!(config.general.log_level, "info");
        assert!(config.ocr.dedupe);
    }

    #[test]
    fn test_load_rejects_zero_repeat_count() {
        let file = create_temp_config("[playback]\nrepeat_count = 0\n");
        let err = DictareConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, DictareError::Config(ref msg) if msg.contains("repeat_count")));

        let config = DictareConfig::load_or_default(file.path());
        assert_eq!(config.playback.repeat_count, 3);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = DictareConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.data_dir, "~/.dictare/data");
        assert_eq!(config.playback.repeat_count, 3);
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        assert!(DictareConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_save_creates_parent_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = DictareConfig::default();
        config.playback.word_gap_ms = 8000;
        config.save(&path).unwrap();

        assert!(path.exists());
        let reloaded = DictareConfig::load(&path).unwrap();
        assert_eq!(reloaded.playback.word_gap_ms, 8000);
        assert_eq!(reloaded.general.log_level, "info");
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = DictareConfig::load(file.path()).unwrap();
        assert_eq!(config.playback.repeat_count, 3);
        assert_eq!(config.ocr.delimiters, ",，、;；");
    }
}
