//! Playback scheduler driving word presentation through an audio output.
//!
//! Each word is played `repeat_count` times. Between two plays of the same
//! word the scheduler waits `repeat_gap`; after the last play it waits
//! `word_gap` and moves on. Once every word has been presented a completion
//! cue is played `cue_repeats` times, then `SessionComplete` is signalled.
//!
//! The scheduler owns no clock. It keeps at most one pending timer, identified
//! by a `TimerToken`; whoever drives it sleeps for the requested delay and
//! calls `on_timer` with the token. Any control action cancels the pending
//! timer, and a token that is no longer pending is ignored, so a delayed
//! repeat can never fire after a pause or a skip. Audio events are likewise
//! ignored unless they refer to the clip currently owned by the session and
//! that clip is actually sounding.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dictare_core::config::PlaybackConfig;
use dictare_core::error::DictareError;
use dictare_core::types::{AudioRef, Word, WordList};

use crate::audio::{AudioEvent, AudioEventKind, AudioHandle, AudioOutput};
use crate::error::PlaybackError;
use crate::state::PlaybackState;

// =============================================================================
// Public types
// =============================================================================

/// Identifies one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// What happens when the pending timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Play the current clip again.
    Replay,
    /// Move on to the next word.
    Advance,
}

/// The single timer a scheduler may have in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTimer {
    pub token: TimerToken,
    pub action: TimerAction,
    pub delay: Duration,
}

/// Result of a control action that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    /// The action took effect.
    Applied,
    /// The scheduler was already where the action would take it.
    Unchanged,
    /// prev/next at the edge of the list. Nothing changed.
    Boundary,
}

/// Which edge of the word list a navigation hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryEdge {
    First,
    Last,
}

/// Transient, non-fatal conditions worth showing to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackNotice {
    /// The word has no playable audio; it was skipped forward.
    AssetMissing { index: usize, word: String },
    /// Output failed while playing the word; it was skipped forward.
    AudioFailed {
        index: usize,
        word: String,
        message: String,
    },
    /// The completion cue could not be played.
    CueUnavailable,
    /// The host stopped audio; playback is paused until resumed.
    Interrupted,
}

/// Everything observable that the scheduler did, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerEvent {
    StateChanged {
        from: PlaybackState,
        to: PlaybackState,
    },
    WordEntered {
        index: usize,
        word: String,
    },
    Notice(PlaybackNotice),
    Boundary(BoundaryEdge),
    /// The completion cue finished (or was unavailable).
    SessionComplete,
}

/// Handed to the session coordinator when playback is finished.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackOutcome {
    pub words: WordList,
    /// Indexes of words the user skipped, in the order they were skipped.
    pub skipped: Vec<usize>,
    /// Whether every word was presented before hand-off.
    pub all_presented: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

// =============================================================================
// Scheduler
// =============================================================================

/// What the current clip is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Nothing is sounding and nothing is scheduled.
    Silent,
    /// `play` was issued and `Ended` has not arrived yet.
    Sounding,
    /// Waiting on the pending timer.
    Waiting,
}

/// State machine presenting a `WordList` through an `AudioOutput`.
pub struct PlaybackScheduler<A: AudioOutput> {
    words: WordList,
    config: PlaybackConfig,
    cue: Option<AudioRef>,
    audio: A,
    state: PlaybackState,
    current_index: usize,
    repeat_count: u32,
    phase: Phase,
    handle: Option<AudioHandle>,
    timer: Option<PendingTimer>,
    next_timer: u64,
    skipped: Vec<usize>,
    complete_signalled: bool,
    started_at: Option<DateTime<Utc>>,
    events: Vec<SchedulerEvent>,
}

impl<A: AudioOutput> std::fmt::Debug for PlaybackScheduler<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackScheduler")
            .field("state", &self.state)
            .field("current_index", &self.current_index)
            .field("repeat_count", &self.repeat_count)
            .field("words", &self.words.len())
            .field("timer", &self.timer)
            .finish()
    }
}

impl<A: AudioOutput> PlaybackScheduler<A> {
    /// Create an idle scheduler. The cue is taken from `config.cue_path`.
    ///
    /// A `repeat_count` of zero is raised to one.
    pub fn new(words: WordList, mut config: PlaybackConfig, audio: A) -> Self {
        if config.validate().is_err() {
            tracing::warn!("repeat_count of 0 raised to 1");
            config.repeat_count = 1;
        }
        let cue = config.cue_path.clone().map(AudioRef);
        Self {
            words,
            config,
            cue,
            audio,
            state: PlaybackState::Idle,
            current_index: 0,
            repeat_count: 1,
            phase: Phase::Silent,
            handle: None,
            timer: None,
            next_timer: 0,
            skipped: Vec::new(),
            complete_signalled: false,
            started_at: None,
            events: Vec::new(),
        }
    }

    /// Override the completion cue.
    pub fn with_cue(mut self, cue: Option<AudioRef>) -> Self {
        self.cue = cue;
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Which play of the current clip is in progress (1-based).
    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    pub fn current_word(&self) -> Option<&Word> {
        self.words.get(self.current_index)
    }

    pub fn words(&self) -> &WordList {
        &self.words
    }

    pub fn skipped(&self) -> &[usize] {
        &self.skipped
    }

    /// The clip the session currently owns, if any.
    pub fn current_handle(&self) -> Option<AudioHandle> {
        self.handle
    }

    pub fn pending_timer(&self) -> Option<PendingTimer> {
        self.timer
    }

    /// Whether `SessionComplete` has been signalled.
    pub fn is_session_complete(&self) -> bool {
        self.complete_signalled
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    /// Take the events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<SchedulerEvent> {
        std::mem::take(&mut self.events)
    }

    // -------------------------------------------------------------------------
    // Controls
    // -------------------------------------------------------------------------

    /// Begin presenting the first word.
    pub fn start(&mut self) -> Result<(), PlaybackError> {
        if self.state != PlaybackState::Idle {
            return Err(PlaybackError::InvalidTransition(self.state, PlaybackState::Playing));
        }
        self.started_at = Some(Utc::now());
        tracing::info!(words = self.words.len(), "Playback session started");

        if self.words.is_empty() {
            self.transition(PlaybackState::AllWordsCompleted)?;
            self.begin_cue();
        } else {
            self.transition(PlaybackState::Playing)?;
            self.enter_word();
        }
        Ok(())
    }

    /// Stop output and wait for `resume`. Idempotent when already paused.
    pub fn pause(&mut self) -> Result<ControlOutcome, PlaybackError> {
        match self.state {
            PlaybackState::Paused => Ok(ControlOutcome::Unchanged),
            PlaybackState::Playing => {
                self.transition(PlaybackState::Paused)?;
                self.cancel_timer();
                self.silence();
                tracing::info!(index = self.current_index, "Playback paused");
                Ok(ControlOutcome::Applied)
            }
            other => Err(PlaybackError::InvalidTransition(other, PlaybackState::Paused)),
        }
    }

    /// Restart the current word from its first repeat.
    pub fn resume(&mut self) -> Result<ControlOutcome, PlaybackError> {
        match self.state {
            PlaybackState::Playing => Ok(ControlOutcome::Unchanged),
            PlaybackState::Paused => {
                self.transition(PlaybackState::Playing)?;
                tracing::info!(index = self.current_index, "Playback resumed");
                self.enter_word();
                Ok(ControlOutcome::Applied)
            }
            other => Err(PlaybackError::InvalidTransition(other, PlaybackState::Playing)),
        }
    }

    /// Record the current word as skipped and move to the next one.
    pub fn skip(&mut self) -> Result<ControlOutcome, PlaybackError> {
        self.require_presenting(PlaybackState::Playing)?;
        if !self.skipped.contains(&self.current_index) {
            self.skipped.push(self.current_index);
        }
        tracing::info!(index = self.current_index, "Word skipped");
        self.cancel_timer();
        self.release();

        if self.current_index + 1 >= self.words.len() {
            self.current_index = self.words.len();
            self.transition(PlaybackState::AllWordsCompleted)?;
            self.begin_cue();
        } else {
            self.current_index += 1;
            self.ensure_playing()?;
            self.enter_word();
        }
        Ok(ControlOutcome::Applied)
    }

    /// Jump to the previous word. At the first word this is a no-op.
    pub fn prev(&mut self) -> Result<ControlOutcome, PlaybackError> {
        self.require_presenting(PlaybackState::Playing)?;
        if self.current_index == 0 {
            self.events.push(SchedulerEvent::Boundary(BoundaryEdge::First));
            return Ok(ControlOutcome::Boundary);
        }
        self.jump_to(self.current_index - 1)
    }

    /// Jump to the next word. At the last word this is a no-op.
    pub fn next(&mut self) -> Result<ControlOutcome, PlaybackError> {
        self.require_presenting(PlaybackState::Playing)?;
        if self.current_index + 1 >= self.words.len() {
            self.events.push(SchedulerEvent::Boundary(BoundaryEdge::Last));
            return Ok(ControlOutcome::Boundary);
        }
        self.jump_to(self.current_index + 1)
    }

    /// Play the current word again from its first repeat.
    pub fn replay(&mut self) -> Result<ControlOutcome, PlaybackError> {
        self.require_presenting(PlaybackState::Playing)?;
        self.jump_to(self.current_index)
    }

    /// Start the whole list over after every word was presented.
    pub fn restart(&mut self) -> Result<ControlOutcome, PlaybackError> {
        if self.state != PlaybackState::AllWordsCompleted || self.words.is_empty() {
            return Err(PlaybackError::InvalidTransition(self.state, PlaybackState::Playing));
        }
        self.cancel_timer();
        self.release();
        self.transition(PlaybackState::Playing)?;
        self.current_index = 0;
        self.skipped.clear();
        self.complete_signalled = false;
        tracing::info!("Playback restarted from the first word");
        self.enter_word();
        Ok(ControlOutcome::Applied)
    }

    /// Hand the session off. Silences output and enters `Completed`.
    pub fn finish(&mut self) -> Result<PlaybackOutcome, PlaybackError> {
        let all_presented = self.state == PlaybackState::AllWordsCompleted;
        self.transition(PlaybackState::Completed)?;
        self.cancel_timer();
        self.release();

        let finished_at = Utc::now();
        let outcome = PlaybackOutcome {
            words: self.words.clone(),
            skipped: self.skipped.clone(),
            all_presented,
            started_at: self.started_at.unwrap_or(finished_at),
            finished_at,
        };
        tracing::info!(
            skipped = outcome.skipped.len(),
            all_presented,
            "Playback session handed off"
        );
        Ok(outcome)
    }

    /// Release the audio output without changing state. Used when the user
    /// abandons the session.
    pub fn stop(&mut self) {
        self.cancel_timer();
        self.release();
        self.phase = Phase::Silent;
    }

    /// The host is about to stop audio output (app backgrounded). Equivalent
    /// to a pause; nothing resumes automatically afterwards.
    pub fn suspend(&mut self) {
        match self.state {
            PlaybackState::Playing => {
                if self.pause().is_ok() {
                    self.events.push(SchedulerEvent::Notice(PlaybackNotice::Interrupted));
                }
            }
            PlaybackState::AllWordsCompleted => self.complete_session(),
            _ => {}
        }
    }

    // -------------------------------------------------------------------------
    // Event inputs
    // -------------------------------------------------------------------------

    /// Feed an event reported by the audio output.
    pub fn on_audio_event(&mut self, event: AudioEvent) {
        if self.handle != Some(event.handle) {
            tracing::trace!(handle = %event.handle, "Ignoring event for a released clip");
            return;
        }

        match event.kind {
            AudioEventKind::Ended => self.on_clip_ended(),
            AudioEventKind::Error(message) => self.on_clip_error(message),
            AudioEventKind::Interrupted => {
                tracing::info!(state = %self.state, "Audio interrupted by host");
                self.suspend();
            }
            AudioEventKind::Resumed => {
                if self.state == PlaybackState::Paused {
                    // Stay silent until an explicit resume.
                    tracing::debug!(handle = %event.handle, "Host resumed audio while paused, silencing");
                    self.audio.stop(event.handle);
                }
            }
        }
    }

    /// Fire the timer identified by `token`. Stale tokens are ignored.
    pub fn on_timer(&mut self, token: TimerToken) {
        let timer = match self.timer {
            Some(timer) if timer.token == token => timer,
            _ => {
                tracing::trace!(?token, "Ignoring stale timer");
                return;
            }
        };
        self.timer = None;
        self.phase = Phase::Silent;

        match (timer.action, self.state) {
            (TimerAction::Replay, PlaybackState::Playing | PlaybackState::AllWordsCompleted) => {
                self.play_current()
            }
            (TimerAction::Advance, PlaybackState::Playing) => self.advance(),
            (action, state) => {
                tracing::debug!(?action, %state, "Timer no longer relevant");
            }
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn transition(&mut self, target: PlaybackState) -> Result<(), PlaybackError> {
        if !self.state.can_transition_to(&target) {
            return Err(PlaybackError::InvalidTransition(self.state, target));
        }
        tracing::debug!("Playback state: {} -> {}", self.state, target);
        self.events.push(SchedulerEvent::StateChanged {
            from: self.state,
            to: target,
        });
        self.state = target;
        Ok(())
    }

    fn require_presenting(&self, target: PlaybackState) -> Result<(), PlaybackError> {
        if self.state.is_presenting() {
            Ok(())
        } else {
            Err(PlaybackError::InvalidTransition(self.state, target))
        }
    }

    fn ensure_playing(&mut self) -> Result<(), PlaybackError> {
        if self.state == PlaybackState::Paused {
            self.transition(PlaybackState::Playing)?;
        }
        Ok(())
    }

    fn jump_to(&mut self, index: usize) -> Result<ControlOutcome, PlaybackError> {
        self.cancel_timer();
        self.release();
        self.ensure_playing()?;
        self.current_index = index;
        self.enter_word();
        Ok(ControlOutcome::Applied)
    }

    fn schedule(&mut self, action: TimerAction, delay: Duration) {
        self.next_timer += 1;
        let timer = PendingTimer {
            token: TimerToken(self.next_timer),
            action,
            delay,
        };
        if let Some(previous) = self.timer.replace(timer) {
            tracing::trace!(token = ?previous.token, "Replacing pending timer");
        }
        self.phase = Phase::Waiting;
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            tracing::trace!(token = ?timer.token, action = ?timer.action, "Timer cancelled");
        }
    }

    /// Stop the owned clip but keep it, so host events for it are still recognised.
    fn silence(&mut self) {
        if let Some(handle) = self.handle {
            self.audio.stop(handle);
        }
        self.phase = Phase::Silent;
    }

    /// Stop and drop the owned clip. Late events for it will be ignored.
    fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.audio.stop(handle);
        }
        self.phase = Phase::Silent;
    }

    /// Start the current word from its first repeat.
    fn enter_word(&mut self) {
        self.cancel_timer();
        self.release();
        self.repeat_count = 1;

        let Some(word) = self.words.get(self.current_index).cloned() else {
            return;
        };
        tracing::info!(index = self.current_index, word = %word.text, "Word entered");
        self.events.push(SchedulerEvent::WordEntered {
            index: self.current_index,
            word: word.text.clone(),
        });

        let Some(source) = word.audio_ref else {
            self.skip_forward_missing(&word.text);
            return;
        };

        match self.audio.load(&source) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.play_current();
            }
            Err(DictareError::AssetMissing(_)) => self.skip_forward_missing(&word.text),
            Err(e) => self.skip_forward_failed(&word.text, e.to_string()),
        }
    }

    fn play_current(&mut self) {
        let Some(handle) = self.handle else {
            return;
        };
        match self.audio.play(handle) {
            Ok(()) => {
                tracing::debug!(
                    index = self.current_index,
                    repeat = self.repeat_count,
                    state = %self.state,
                    "Clip playing"
                );
                self.phase = Phase::Sounding;
            }
            Err(e) => self.on_clip_error(e.to_string()),
        }
    }

    fn on_clip_ended(&mut self) {
        if self.phase != Phase::Sounding {
            tracing::trace!("Ignoring end of a clip that is not sounding");
            return;
        }

        match self.state {
            PlaybackState::Playing => {
                self.repeat_count += 1;
                if self.repeat_count <= self.config.repeat_count {
                    self.schedule(TimerAction::Replay, self.config.repeat_gap());
                } else {
                    self.schedule(TimerAction::Advance, self.config.word_gap());
                }
            }
            PlaybackState::AllWordsCompleted => {
                self.repeat_count += 1;
                if self.repeat_count <= self.config.cue_repeats {
                    self.schedule(TimerAction::Replay, self.config.repeat_gap());
                } else {
                    self.complete_session();
                }
            }
            _ => {}
        }
    }

    fn on_clip_error(&mut self, message: String) {
        match self.state {
            PlaybackState::Playing => {
                let word = self.current_word().map(|w| w.text.clone()).unwrap_or_default();
                self.skip_forward_failed(&word, message);
            }
            PlaybackState::AllWordsCompleted => {
                tracing::warn!(error = %message, "Completion cue failed");
                self.events.push(SchedulerEvent::Notice(PlaybackNotice::CueUnavailable));
                self.complete_session();
            }
            _ => {}
        }
    }

    fn skip_forward_missing(&mut self, word: &str) {
        tracing::warn!(index = self.current_index, word, "No audio for word, skipping forward");
        self.events.push(SchedulerEvent::Notice(PlaybackNotice::AssetMissing {
            index: self.current_index,
            word: word.to_string(),
        }));
        self.release();
        self.schedule(TimerAction::Advance, self.config.error_delay());
    }

    fn skip_forward_failed(&mut self, word: &str, message: String) {
        tracing::warn!(
            index = self.current_index,
            word,
            error = %message,
            "Audio output failed, skipping forward"
        );
        self.events.push(SchedulerEvent::Notice(PlaybackNotice::AudioFailed {
            index: self.current_index,
            word: word.to_string(),
            message,
        }));
        self.release();
        self.schedule(TimerAction::Advance, self.config.error_delay());
    }

    fn advance(&mut self) {
        self.release();
        self.repeat_count = 1;
        self.current_index += 1;
        if self.current_index >= self.words.len() {
            self.current_index = self.words.len();
            if let Err(e) = self.transition(PlaybackState::AllWordsCompleted) {
                tracing::warn!(error = %e, "Could not complete word list");
                return;
            }
            self.begin_cue();
        } else {
            self.enter_word();
        }
    }

    /// Play the completion cue, or signal completion right away without one.
    fn begin_cue(&mut self) {
        self.cancel_timer();
        self.release();
        self.repeat_count = 1;
        tracing::info!("All words presented");

        let cue = match (&self.cue, self.config.cue_repeats) {
            (Some(cue), repeats) if repeats > 0 => cue.clone(),
            _ => {
                self.complete_session();
                return;
            }
        };

        match self.audio.load(&cue) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.play_current();
            }
            Err(e) => {
                tracing::warn!(cue = %cue, error = %e, "Completion cue unavailable");
                self.events.push(SchedulerEvent::Notice(PlaybackNotice::CueUnavailable));
                self.complete_session();
            }
        }
    }

    fn complete_session(&mut self) {
        self.cancel_timer();
        self.release();
        if self.complete_signalled {
            return;
        }
        self.complete_signalled = true;
        tracing::info!(skipped = self.skipped.len(), "Dictation playback complete");
        self.events.push(SchedulerEvent::SessionComplete);
    }
}

// =============================================================================
// Tests
// =============================================================================
