//! Dictare Session crate - runs one dictation attempt end to end.
//!
//! The `SessionCoordinator` resolves words to audio clips, plays them through
//! the playback driver, reads the written answer with a handwriting
//! recognizer, reconciles the two and hands the resulting record to a sink.
//! Collaborators (asset store, recognizer, sink) are traits so the app can
//! plug in real implementations and tests can use the in-memory ones here.

pub mod assets;
pub mod coordinator;
pub mod error;
pub mod ocr;
pub mod sink;

pub use assets::{AudioAssetStore, InMemoryAssetStore, ManifestAssetStore};
pub use coordinator::{ActiveSession, FinishedPlayback, SessionCoordinator};
pub use error::SessionError;
pub use ocr::{HandwritingRecognizer, MockRecognizer};
pub use sink::{InMemoryRecordSink, RecordSink};
