//! Session coordinator: plays a word list, then scores the written answer.
//!
//! A session runs in two halves. `begin` resolves each word to a clip and
//! starts playback on its own task; the caller drives it through the returned
//! `ActiveSession` until the completion signal, then calls `finish`. The
//! resulting `FinishedPlayback` is reconciled against whatever the recognizer
//! reads off the answer sheet, and the record is handed to the sink.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use dictare_core::config::{DictareConfig, MatchingConfig, OcrConfig, PlaybackConfig};
use dictare_core::types::{default_title, DictationRecord, WordList};
use dictare_match::{extract_tokens, reconcile_with, summarize, ReconcileOptions};
use dictare_playback::{
    AudioEvent, AudioOutput, PlaybackDriver, PlaybackError, PlaybackHandle, PlaybackOutcome,
    PlaybackScheduler, SchedulerEvent,
};

use crate::assets::AudioAssetStore;
use crate::error::{Result, SessionError};
use crate::ocr::HandwritingRecognizer;
use crate::sink::RecordSink;

/// Builds and scores dictation sessions.
pub struct SessionCoordinator<R: HandwritingRecognizer> {
    playback: PlaybackConfig,
    matching: MatchingConfig,
    ocr: OcrConfig,
    assets: Arc<dyn AudioAssetStore>,
    recognizer: R,
    sink: Arc<dyn RecordSink>,
}

impl<R: HandwritingRecognizer> std::fmt::Debug for SessionCoordinator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("playback", &self.playback)
            .field("matching", &self.matching)
            .field("ocr", &self.ocr)
            .finish()
    }
}

impl<R: HandwritingRecognizer> SessionCoordinator<R> {
    pub fn new(
        config: &DictareConfig,
        assets: Arc<dyn AudioAssetStore>,
        recognizer: R,
        sink: Arc<dyn RecordSink>,
    ) -> Self {
        Self {
            playback: config.playback.clone(),
            matching: config.matching.clone(),
            ocr: config.ocr.clone(),
            assets,
            recognizer,
            sink,
        }
    }

    /// Fill in each word's clip from the asset store.
    ///
    /// Words that already carry a clip keep it. Words without one are kept
    /// as well; playback skips them forward.
    pub fn resolve_audio(&self, mut words: WordList) -> WordList {
        for word in words.iter_mut() {
            if word.audio_ref.is_some() {
                continue;
            }
            word.audio_ref = self.assets.lookup(&word.text);
            if word.audio_ref.is_none() {
                tracing::warn!(word = %word.text, "No audio asset for word");
            }
        }
        words
    }

    /// Start playing `words` through `audio`.
    ///
    /// `audio_events` must carry every event `audio` reports.
    pub fn begin<A: AudioOutput + 'static>(
        &self,
        words: WordList,
        audio: A,
        audio_events: UnboundedReceiver<AudioEvent>,
    ) -> ActiveSession {
        let mut words = self.resolve_audio(words);
        if self.playback.shuffle {
            words.shuffle(&mut rand::rng());
        }
        let id = Uuid::new_v4();
        tracing::info!(
            %id,
            words = words.len(),
            shuffled = self.playback.shuffle,
            "Dictation session started"
        );

        let scheduler = PlaybackScheduler::new(words, self.playback.clone(), audio);
        ActiveSession {
            id,
            handle: PlaybackDriver::spawn(scheduler, audio_events),
        }
    }

    /// Read the answer sheet and score it against the played words.
    pub async fn reconcile(
        &self,
        finished: FinishedPlayback,
        image_data: &[u8],
        title: Option<&str>,
    ) -> Result<DictationRecord> {
        let lines = self.recognizer.recognize(image_data).await?;
        tracing::debug!(lines = lines.len(), "Answer sheet recognized");
        Ok(self.reconcile_lines(finished, &lines, title))
    }

    /// Score already-recognized answer lines against the played words.
    ///
    /// The record is handed to the sink; a sink failure is logged and the
    /// record is still returned.
    pub fn reconcile_lines<S: AsRef<str>>(
        &self,
        finished: FinishedPlayback,
        lines: &[S],
        title: Option<&str>,
    ) -> DictationRecord {
        let tokens = extract_tokens(lines, &self.ocr);
        let record = self.build_record(finished, &tokens, title);

        tracing::info!(
            id = %record.id,
            correct = record.summary.correct,
            wrong = record.summary.wrong,
            missed = record.summary.missed,
            accuracy = record.summary.accuracy_percent,
            "Dictation scored"
        );

        if let Err(e) = self.sink.save(&record) {
            tracing::warn!(id = %record.id, error = %e, "Failed to save dictation record");
        }
        record
    }

    /// Play `words` to the end, then score the answer sheet.
    ///
    /// `observe` sees every scheduler event as it happens.
    pub async fn run<A, F>(
        &self,
        words: WordList,
        audio: A,
        audio_events: UnboundedReceiver<AudioEvent>,
        image_data: &[u8],
        observe: F,
    ) -> Result<DictationRecord>
    where
        A: AudioOutput + 'static,
        F: FnMut(&SchedulerEvent),
    {
        let mut session = self.begin(words, audio, audio_events);
        session.wait_for_completion(observe).await?;
        let finished = session.finish().await?;
        self.reconcile(finished, image_data, None).await
    }

    fn build_record(
        &self,
        finished: FinishedPlayback,
        tokens: &[String],
        title: Option<&str>,
    ) -> DictationRecord {
        let FinishedPlayback { id, outcome } = finished;
        let originals = outcome.words.texts();
        let options = ReconcileOptions {
            min_ratio: self.matching.min_ratio,
        };
        let results = reconcile_with(&originals, tokens, &options);
        let summary = summarize(&results);

        let title = match title {
            Some(title) if !title.trim().is_empty() => title.trim().to_string(),
            _ => default_title(
                outcome.started_at.date_naive(),
                originals.first().map(String::as_str),
            ),
        };

        DictationRecord {
            id,
            title,
            words: outcome.words,
            results,
            summary,
            skipped: outcome.skipped,
            started_at: outcome.started_at,
            finished_at: outcome.finished_at,
            elapsed_minutes: DictationRecord::minutes_between(
                outcome.started_at,
                outcome.finished_at,
            ),
        }
    }
}

/// A session whose words are being played.
#[derive(Debug)]
pub struct ActiveSession {
    id: Uuid,
    handle: PlaybackHandle,
}

impl ActiveSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Playback controls (pause, resume, skip, prev, next, replay, restart).
    pub fn controls(&self) -> &PlaybackHandle {
        &self.handle
    }

    /// Wait for the completion signal, passing every event to `observe`.
    pub async fn wait_for_completion<F>(&mut self, observe: F) -> Result<()>
    where
        F: FnMut(&SchedulerEvent),
    {
        self.handle
            .wait_for_completion(observe)
            .await
            .map_err(|e| match e {
                PlaybackError::DriverStopped => SessionError::Interrupted,
                other => SessionError::Playback(other),
            })
    }

    /// Stop playback and hand the played words over for scoring. Allowed
    /// before every word was presented.
    pub async fn finish(self) -> Result<FinishedPlayback> {
        let outcome = self.handle.finish().await?;
        tracing::info!(id = %self.id, skipped = outcome.skipped.len(), "Playback finished");
        Ok(FinishedPlayback {
            id: self.id,
            outcome,
        })
    }

    /// Leave without scoring. Output is released.
    pub async fn abandon(self) {
        tracing::info!(id = %self.id, "Dictation session abandoned");
        self.handle.exit().await;
    }
}

/// Playback result waiting to be scored.
#[derive(Debug, Clone)]
pub struct FinishedPlayback {
    pub id: Uuid,
    pub outcome: PlaybackOutcome,
}
