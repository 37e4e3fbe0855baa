//! Audio asset lookup by word text.
//!
//! Synthesizing a clip is someone else's job; the coordinator only asks
//! whether a clip already exists for a word before playback starts. Keys are
//! trimmed and lowercased so `Book` and `book` share a clip.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use dictare_core::error::{DictareError, Result};
use dictare_core::types::AudioRef;

/// Key-value store from word text to a playable clip.
pub trait AudioAssetStore: Send + Sync {
    /// The clip for `text`, if one exists.
    fn lookup(&self, text: &str) -> Option<AudioRef>;

    /// Remember the clip for `text`, replacing any previous one.
    fn insert(&self, text: &str, source: AudioRef);
}

fn asset_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Asset store held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryAssetStore {
    entries: RwLock<HashMap<String, AudioRef>>,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AudioAssetStore for InMemoryAssetStore {
    fn lookup(&self, text: &str) -> Option<AudioRef> {
        let entries = self.entries.read().ok()?;
        entries.get(&asset_key(text)).cloned()
    }

    fn insert(&self, text: &str, source: AudioRef) {
        match self.entries.write() {
            Ok(mut entries) => {
                entries.insert(asset_key(text), source);
            }
            Err(_) => tracing::warn!(word = text, "Asset store lock poisoned, entry dropped"),
        }
    }
}

/// Asset store backed by a JSON manifest mapping words to clip paths.
///
/// ```json
/// { "apple": "clips/apple.mp3", "banana": "/srv/audio/banana.mp3" }
/// ```
///
/// Relative paths are resolved against the manifest's directory.
#[derive(Debug)]
pub struct ManifestAssetStore {
    path: PathBuf,
    entries: InMemoryAssetStore,
}

impl ManifestAssetStore {
    /// Load a manifest. A missing file yields an empty store bound to `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let entries = InMemoryAssetStore::new();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let manifest: BTreeMap<String, String> = serde_json::from_str(&content)?;
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            for (word, clip) in manifest {
                let clip_path = base.join(&clip);
                entries.insert(&word, AudioRef::new(clip_path.to_string_lossy()));
            }
            tracing::info!(entries = entries.len(), path = %path.display(), "Audio manifest loaded");
        } else {
            tracing::debug!(path = %path.display(), "No audio manifest, starting empty");
        }

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Write the current entries back to the manifest file.
    pub fn save(&self) -> Result<()> {
        let manifest: BTreeMap<String, String> = self
            .entries
            .entries
            .read()
            .map_err(|_| DictareError::Persistence("Asset store lock poisoned".to_string()))?
            .iter()
            .map(|(word, clip)| (word.clone(), clip.as_str().to_string()))
            .collect();

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&manifest)?)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AudioAssetStore for ManifestAssetStore {
    fn lookup(&self, text: &str) -> Option<AudioRef> {
        self.entries.lookup(text)
    }

    fn insert(&self, text: &str, source: AudioRef) {
        self.entries.insert(text, source)
    }
}
