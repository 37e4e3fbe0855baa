//! Error types for the session coordinator.

use dictare_core::error::DictareError;
use dictare_playback::PlaybackError;

/// Errors surfaced while running a dictation session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Core(#[from] DictareError),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
    #[error("Playback ended before the session was complete")]
    Interrupted,
}

pub type Result<T> = std::result::Result<T, SessionError>;
