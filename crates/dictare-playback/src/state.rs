//! Playback session states and the transitions allowed between them.
//!
//! - Idle -> Playing (start)
//! - Playing -> Paused (pause, host interruption)
//! - Paused -> Playing (resume, skip, prev, next, replay)
//! - Idle / Playing / Paused -> AllWordsCompleted (last word done or skipped)
//! - AllWordsCompleted -> Playing (restart)
//! - Playing / Paused / AllWordsCompleted -> Completed (hand off)

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operational state of a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Session created, nothing played yet.
    Idle,
    /// Presenting the current word (sounding or waiting between repeats).
    Playing,
    /// Stopped by the user or the host; waits for an explicit resume.
    Paused,
    /// Every word has been presented; the completion cue may be playing.
    AllWordsCompleted,
    /// Handed off to reconciliation. Terminal.
    Completed,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "Idle"),
            PlaybackState::Playing => write!(f, "Playing"),
            PlaybackState::Paused => write!(f, "Paused"),
            PlaybackState::AllWordsCompleted => write!(f, "AllWordsCompleted"),
            PlaybackState::Completed => write!(f, "Completed"),
        }
    }
}

impl PlaybackState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &PlaybackState) -> bool {
        use PlaybackState::*;
        matches!(
            (self, target),
            (Idle, Playing)
                | (Playing, Paused)
                | (Paused, Playing)
                | (Idle, AllWordsCompleted)
                | (Playing, AllWordsCompleted)
                | (Paused, AllWordsCompleted)
                | (AllWordsCompleted, Playing)
                // Hand off, possibly before every word was presented
                | (Playing, Completed)
                | (Paused, Completed)
                | (AllWordsCompleted, Completed)
        )
    }

    /// Whether the user can still navigate between words.
    pub fn is_presenting(&self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PlaybackState; 5] = [
        PlaybackState::Idle,
        PlaybackState::Playing,
        PlaybackState::Paused,
        PlaybackState::AllWordsCompleted,
        PlaybackState::Completed,
    ];

    #[test]
    fn test_state_display() {
        assert_eq!(PlaybackState::Idle.to_string(), "Idle");
        assert_eq!(PlaybackState::AllWordsCompleted.to_string(), "AllWordsCompleted");
        assert_eq!(PlaybackState::Completed.to_string(), "Completed");
    }

    #[test]
    fn test_forward_path() {
        assert!(PlaybackState::Idle.can_transition_to(&PlaybackState::Playing));
        assert!(PlaybackState::Playing.can_transition_to(&PlaybackState::AllWordsCompleted));
        assert!(PlaybackState::AllWordsCompleted.can_transition_to(&PlaybackState::Completed));
    }

    #[test]
    fn test_pause_resume() {
        assert!(PlaybackState::Playing.can_transition_to(&PlaybackState::Paused));
        assert!(PlaybackState::Paused.can_transition_to(&PlaybackState::Playing));
    }

    #[test]
    fn test_restart_from_all_words_completed() {
        assert!(PlaybackState::AllWordsCompleted.can_transition_to(&PlaybackState::Playing));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!PlaybackState::Idle.can_transition_to(&PlaybackState::Paused));
        assert!(!PlaybackState::Idle.can_transition_to(&PlaybackState::Completed));
        assert!(!PlaybackState::AllWordsCompleted.can_transition_to(&PlaybackState::Paused));
        for target in ALL {
            assert!(!PlaybackState::Completed.can_transition_to(&target));
        }
    }

    #[test]
    fn test_no_self_transitions() {
        for state in ALL {
            assert!(!state.can_transition_to(&state), "{} -> {}", state, state);
        }
    }

    #[test]
    fn test_valid_transition_count() {
        let count = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (from, to)))
            .filter(|(from, to)| from.can_transition_to(to))
            .count();
        assert_eq!(count, 10);
    }

    #[test]
    fn test_is_presenting() {
        assert!(PlaybackState::Playing.is_presenting());
        assert!(PlaybackState::Paused.is_presenting());
        assert!(!PlaybackState::Idle.is_presenting());
        assert!(!PlaybackState::AllWordsCompleted.is_presenting());
    }
}
