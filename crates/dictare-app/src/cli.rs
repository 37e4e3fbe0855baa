//! CLI argument definitions for the Dictare application.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Dictare - plays a dictation word list aloud, then scores the written answer.
#[derive(Parser, Debug)]
#[command(name = "dictare", version, about)]
pub struct CliArgs {
    /// Word list, one word per line. `word - translation` is accepted.
    pub words: PathBuf,

    /// Recognized text of the answer sheet (one line per written line).
    #[arg(short = 'a', long = "answer")]
    pub answer: PathBuf,

    /// Title for the saved record. Defaults to the date and language.
    #[arg(short = 't', long = "title")]
    pub title: Option<String>,

    /// JSON manifest mapping words to audio clips.
    #[arg(short = 'm', long = "assets")]
    pub assets: Option<PathBuf>,

    /// Simulated clip length in milliseconds for the dry-run output.
    #[arg(long = "clip-ms", default_value_t = 1000)]
    pub clip_ms: u64,

    /// Present the words in random order.
    #[arg(short = 's', long = "shuffle")]
    pub shuffle: bool,

    /// Play clips even if they do not exist on disk.
    #[arg(long = "no-file-check")]
    pub no_file_check: bool,

    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Data directory for saved records and the default audio manifest.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > DICTARE_CONFIG env var > ~/.dictare/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("DICTARE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the data directory path.
    ///
    /// Priority: --data-dir flag > config file value.
    /// Returns `None` if not overridden (use config value).
    pub fn resolve_data_dir(&self) -> Option<String> {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(".dictare").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE");
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME");
    home.ok().map(PathBuf::from)
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(rest)
    } else {
        PathBuf::from(path)
    }
}
