//! Error types for the playback scheduler.

use dictare_core::error::DictareError;

use crate::state::PlaybackState;

/// Errors from playback control.
///
/// None of these end a session: a rejected control leaves the scheduler in the
/// state it was in.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("Invalid playback transition: {0} -> {1}")]
    InvalidTransition(PlaybackState, PlaybackState),
    #[error("Playback driver is no longer running")]
    DriverStopped,
    #[error(transparent)]
    Core(#[from] DictareError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_display() {
        let err = PlaybackError::InvalidTransition(PlaybackState::Idle, PlaybackState::Paused);
        assert_eq!(err.to_string(), "Invalid playback transition: Idle -> Paused");
    }

    #[test]
    fn test_from_core_error() {
        let err: PlaybackError = DictareError::Audio("device lost".to_string()).into();
        assert!(matches!(err, PlaybackError::Core(_)));
        assert_eq!(err.to_string(), "Audio error: device lost");
    }

    #[test]
    fn test_driver_stopped_display() {
        assert_eq!(
            PlaybackError::DriverStopped.to_string(),
            "Playback driver is no longer running"
        );
    }
}
