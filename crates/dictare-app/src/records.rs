//! JSON-file record sink.
//!
//! Records are kept as one JSON array in `<data_dir>/records.json`. This is a
//! local cache; a failed write is reported to the caller, which logs it.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dictare_core::error::{DictareError, Result};
use dictare_core::types::DictationRecord;
use dictare_session::RecordSink;

pub struct JsonFileRecordSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileRecordSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Sink writing to `records.json` inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("records.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record in the file, oldest first. A missing file is empty.
    pub fn load_all(&self) -> Result<Vec<DictationRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

impl RecordSink for JsonFileRecordSink {
    fn save(&self, record: &DictationRecord) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| DictareError::Persistence("Record file lock poisoned".to_string()))?;

        let mut records = self.load_all()?;
        records.push(record.clone());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&records)?)?;
        tracing::info!(
            id = %record.id,
            path = %self.path.display(),
            total = records.len(),
            "Dictation record saved"
        );
        Ok(())
    }
}
