//! Audio output capability consumed by the playback scheduler.
//!
//! The scheduler treats output as opaque: it loads a clip, plays it, stops
//! it, and learns about playback progress through `AudioEvent`s that the
//! host delivers back to it. A mock implementation is provided for tests and
//! dry runs.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use dictare_core::error::DictareError;
use dictare_core::types::AudioRef;

// =============================================================================
// Types
// =============================================================================

/// Identifies one loaded clip on an audio output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioHandle(pub u64);

impl fmt::Display for AudioHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What happened to a clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEventKind {
    /// The clip played to the end.
    Ended,
    /// Playback failed.
    Error(String),
    /// The host stopped output outside the scheduler's control (app
    /// backgrounded, call, audio focus lost).
    Interrupted,
    /// The host started output again on its own.
    Resumed,
}

/// An event reported by the audio output for a specific clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioEvent {
    pub handle: AudioHandle,
    pub kind: AudioEventKind,
}

impl AudioEvent {
    pub fn ended(handle: AudioHandle) -> Self {
        Self {
            handle,
            kind: AudioEventKind::Ended,
        }
    }

    pub fn error(handle: AudioHandle, message: impl Into<String>) -> Self {
        Self {
            handle,
            kind: AudioEventKind::Error(message.into()),
        }
    }

    pub fn interrupted(handle: AudioHandle) -> Self {
        Self {
            handle,
            kind: AudioEventKind::Interrupted,
        }
    }

    pub fn resumed(handle: AudioHandle) -> Self {
        Self {
            handle,
            kind: AudioEventKind::Resumed,
        }
    }
}

// =============================================================================
// Trait
// =============================================================================

/// Output device able to play short clips.
///
/// Implementations report progress asynchronously as `AudioEvent`s; the
/// scheduler ignores events for handles it no longer owns.
pub trait AudioOutput: Send {
    /// Prepare a clip. Fails with `DictareError::AssetMissing` when the
    /// referenced audio does not exist.
    fn load(&mut self, source: &AudioRef) -> Result<AudioHandle, DictareError>;

    /// Start playing a loaded clip from the beginning.
    fn play(&mut self, handle: AudioHandle) -> Result<(), DictareError>;

    /// Silence a clip. Stopping an idle or unknown handle is a no-op.
    fn stop(&mut self, handle: AudioHandle);
}

impl<T: AudioOutput + ?Sized> AudioOutput for Box<T> {
    fn load(&mut self, source: &AudioRef) -> Result<AudioHandle, DictareError> {
        (**self).load(source)
    }

    fn play(&mut self, handle: AudioHandle) -> Result<(), DictareError> {
        (**self).play(handle)
    }

    fn stop(&mut self, handle: AudioHandle) {
        (**self).stop(handle)
    }
}

// =============================================================================
// Mock implementation
// =============================================================================

/// A call made against `MockAudioOutput`, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCall {
    Load(AudioRef),
    Play(AudioHandle, AudioRef),
    Stop(AudioHandle),
}

#[derive(Debug, Default)]
struct MockState {
    next_handle: u64,
    loaded: HashMap<AudioHandle, AudioRef>,
    /// Bumped on every play and stop so a stopped clip never reports Ended.
    generation: HashMap<AudioHandle, u64>,
    calls: Vec<AudioCall>,
    missing: HashSet<AudioRef>,
    failing: HashSet<AudioRef>,
}

/// Mock audio output for testing.
///
/// Records every call. Clones share the same log, so a test can keep one
/// clone for assertions while the scheduler owns another. When built with
/// `with_events`, each play reports `Ended` after the configured clip length
/// (requires a tokio runtime).
#[derive(Clone, Default)]
pub struct MockAudioOutput {
    state: Arc<Mutex<MockState>>,
    events: Option<(UnboundedSender<AudioEvent>, Duration)>,
}

impl fmt::Debug for MockAudioOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockAudioOutput")
            .field("emits_events", &self.events.is_some())
            .finish()
    }
}

impl MockAudioOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `Ended` through `sender` once `clip_len` has elapsed after each play.
    pub fn with_events(sender: UnboundedSender<AudioEvent>, clip_len: Duration) -> Self {
        Self {
            state: Arc::default(),
            events: Some((sender, clip_len)),
        }
    }

    /// Make `load` fail with `AssetMissing` for this reference.
    pub fn missing(self, source: AudioRef) -> Self {
        self.lock().missing.insert(source);
        self
    }

    /// Make `play` fail for this reference.
    pub fn failing(self, source: AudioRef) -> Self {
        self.lock().failing.insert(source);
        self
    }

    /// Every call made so far.
    pub fn calls(&self) -> Vec<AudioCall> {
        self.lock().calls.clone()
    }

    /// References played so far, in order.
    pub fn plays(&self) -> Vec<AudioRef> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                AudioCall::Play(_, source) => Some(source.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of times `source` was played.
    pub fn play_count(&self, source: &AudioRef) -> usize {
        self.plays().iter().filter(|p| *p == source).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock audio mutex poisoned")
    }
}

impl AudioOutput for MockAudioOutput {
    fn load(&mut self, source: &AudioRef) -> Result<AudioHandle, DictareError> {
        let mut state = self.lock();
        state.calls.push(AudioCall::Load(source.clone()));
        if state.missing.contains(source) {
            return Err(DictareError::AssetMissing(source.to_string()));
        }
        state.next_handle += 1;
        let handle = AudioHandle(state.next_handle);
        state.loaded.insert(handle, source.clone());
        Ok(handle)
    }

    fn play(&mut self, handle: AudioHandle) -> Result<(), DictareError> {
        let mut state = self.lock();
        let source = state
            .loaded
            .get(&handle)
            .cloned()
            .ok_or_else(|| DictareError::Audio(format!("Unknown audio handle {}", handle)))?;
        state.calls.push(AudioCall::Play(handle, source.clone()));
        if state.failing.contains(&source) {
            return Err(DictareError::Audio(format!("Decoder failed for {}", source)));
        }

        let generation = {
            let g = state.generation.entry(handle).or_insert(0);
            *g += 1;
            *g
        };
        drop(state);

        if let Some((sender, clip_len)) = self.events.clone() {
            let shared = Arc::clone(&self.state);
            tokio::spawn(async move {
                tokio::time::sleep(clip_len).await;
                let still_playing = shared
                    .lock()
                    .map(|s| s.generation.get(&handle) == Some(&generation))
                    .unwrap_or(false);
                if still_playing {
                    let _ = sender.send(AudioEvent::ended(handle));
                }
            });
        }
        Ok(())
    }

    fn stop(&mut self, handle: AudioHandle) {
        let mut state = self.lock();
        state.calls.push(AudioCall::Stop(handle));
        if let Some(g) = state.generation.get_mut(&handle) {
            *g += 1;
        }
    }
}
