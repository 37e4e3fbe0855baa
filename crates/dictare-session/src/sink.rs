//! Where finished dictation records go.

use std::sync::Mutex;

use dictare_core::error::{DictareError, Result};
use dictare_core::types::DictationRecord;

/// Destination for finished session records.
pub trait RecordSink: Send + Sync {
    fn save(&self, record: &DictationRecord) -> Result<()>;
}

/// Keeps records in memory. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryRecordSink {
    records: Mutex<Vec<DictationRecord>>,
}

impl InMemoryRecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record saved so far, oldest first.
    pub fn records(&self) -> Vec<DictationRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl RecordSink for InMemoryRecordSink {
    fn save(&self, record: &DictationRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| DictareError::Persistence("Record sink lock poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }
}
