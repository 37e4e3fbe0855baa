//! Dictare Playback crate - sequential word presentation through an audio output.
//!
//! The `PlaybackScheduler` is a synchronous state machine
//! (Idle -> Playing <-> Paused -> AllWordsCompleted -> Completed) that plays
//! each word a fixed number of times with a short gap between repeats and a
//! longer gap between words. It never sleeps or spawns: it asks for at most
//! one timer at a time and reacts to timer and audio events handed to it.
//! `PlaybackDriver` runs a scheduler on a tokio task, turning those timer
//! requests into sleeps and serialising commands and audio events.

pub mod audio;
pub mod driver;
pub mod error;
pub mod scheduler;
pub mod state;

pub use audio::{AudioCall, AudioEvent, AudioEventKind, AudioHandle, AudioOutput, MockAudioOutput};
pub use driver::{ControlAction, PlaybackCommand, PlaybackDriver, PlaybackHandle};
pub use error::PlaybackError;
pub use scheduler::{
    BoundaryEdge, ControlOutcome, PendingTimer, PlaybackNotice, PlaybackOutcome,
    PlaybackScheduler, SchedulerEvent, TimerAction, TimerToken,
};
pub use state::PlaybackState;
