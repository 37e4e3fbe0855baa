//! Dry-run audio output for the command line.
//!
//! No sound is produced. Each play is logged, and `Ended` is reported after a
//! fixed clip length so the scheduler runs with real timing. Clips that do
//! not exist on disk fail to load, which exercises the skip-forward path.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use dictare_core::error::DictareError;
use dictare_core::types::AudioRef;
use dictare_playback::{AudioEvent, AudioHandle, AudioOutput, MockAudioOutput};

pub struct DryRunAudioOutput {
    timing: MockAudioOutput,
    clips: HashMap<AudioHandle, AudioRef>,
    check_files: bool,
}

impl DryRunAudioOutput {
    pub fn new(events: UnboundedSender<AudioEvent>, clip_len: Duration) -> Self {
        Self {
            timing: MockAudioOutput::with_events(events, clip_len),
            clips: HashMap::new(),
            check_files: true,
        }
    }

    /// Accept clips whether or not they exist on disk.
    pub fn without_file_check(mut self) -> Self {
        self.check_files = false;
        self
    }
}

impl AudioOutput for DryRunAudioOutput {
    fn load(&mut self, source: &AudioRef) -> Result<AudioHandle, DictareError> {
        if self.check_files && !Path::new(source.as_str()).is_file() {
            return Err(DictareError::AssetMissing(source.to_string()));
        }
        let handle = self.timing.load(source)?;
        self.clips.insert(handle, source.clone());
        Ok(handle)
    }

    fn play(&mut self, handle: AudioHandle) -> Result<(), DictareError> {
        if let Some(clip) = self.clips.get(&handle) {
            tracing::info!(%handle, clip = %clip, "Playing clip");
        }
        self.timing.play(handle)
    }

    fn stop(&mut self, handle: AudioHandle) {
        tracing::debug!(%handle, "Stopping clip");
        self.timing.stop(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_existing_clip_plays_and_ends() {
        let dir = TempDir::new().unwrap();
        let clip = dir.path().join("cat.mp3");
        std::fs::write(&clip, b"ID3").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut output = DryRunAudioOutput::new(tx, Duration::from_millis(300));
        let handle = output
            .load(&AudioRef::new(clip.to_string_lossy()))
            .unwrap();
        output.play(handle).unwrap();

        assert_eq!(rx.recv().await, Some(AudioEvent::ended(handle)));
    }

    #[tokio::test]
    async fn test_missing_clip_fails_to_load() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut output = DryRunAudioOutput::new(tx, Duration::from_millis(300));
        let result = output.load(&AudioRef::new("/definitely/not/here.mp3"));
        assert!(matches!(result, Err(DictareError::AssetMissing(_))));
    }

    #[tokio::test]
    async fn test_file_check_can_be_disabled() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut output =
            DryRunAudioOutput::new(tx, Duration::from_millis(300)).without_file_check();
        assert!(output.load(&AudioRef::new("virtual.mp3")).is_ok());
    }
}
