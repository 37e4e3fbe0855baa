//! End-to-end playback runs on a paused tokio clock.
//!
//! The mock output reports `Ended` 800ms after each play, so the timings
//! below follow from the default gaps (1500ms between repeats, 5000ms
//! between words, 500ms after a missing asset).

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use dictare_core::config::PlaybackConfig;
use dictare_core::types::{AudioRef, Word, WordList};
use dictare_playback::{
    AudioCall, ControlOutcome, MockAudioOutput, PlaybackDriver, PlaybackError, PlaybackHandle,
    PlaybackNotice, PlaybackScheduler, SchedulerEvent,
};

// =============================================================================
// Helpers
// =============================================================================

const CLIP: Duration = Duration::from_millis(800);

fn clip(text: &str) -> AudioRef {
    AudioRef::new(format!("{}.mp3", text))
}

fn voiced(texts: &[&str]) -> WordList {
    WordList::new(texts.iter().map(|t| Word::new(*t).with_audio(clip(t))).collect())
}

fn spawn(words: WordList, cue: Option<AudioRef>) -> (PlaybackHandle, MockAudioOutput) {
    let (tx, rx) = mpsc::unbounded_channel();
    let audio = MockAudioOutput::with_events(tx, CLIP);
    let probe = audio.clone();
    let scheduler = PlaybackScheduler::new(words, PlaybackConfig::default(), audio).with_cue(cue);
    (PlaybackDriver::spawn(scheduler, rx), probe)
}

async fn collect_until_complete(handle: &mut PlaybackHandle) -> Vec<SchedulerEvent> {
    let mut seen = Vec::new();
    handle
        .wait_for_completion(|e| seen.push(e.clone()))
        .await
        .expect("session should complete");
    seen
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn plays_every_word_exactly_three_times() {
    let (mut handle, probe) = spawn(voiced(&["cat", "dog"]), None);
    let started = Instant::now();

    let events = collect_until_complete(&mut handle).await;

    assert_eq!(probe.play_count(&clip("cat")), 3);
    assert_eq!(probe.play_count(&clip("dog")), 3);
    let entered: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            SchedulerEvent::WordEntered { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(entered, vec![0, 1]);

    // Per word: three clips, two repeat gaps, one word gap.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(20_800), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(21_000), "{:?}", elapsed);

    let outcome = handle.finish().await.unwrap();
    assert!(outcome.all_presented);
    assert!(outcome.skipped.is_empty());
}

#[tokio::test(start_paused = true)]
async fn pause_blocks_pending_repeat_and_resume_starts_over() {
    let (mut handle, probe) = spawn(voiced(&["cat"]), None);

    // First play ended at 800ms; the repeat is due at 2300ms.
    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(handle.pause().await.unwrap(), ControlOutcome::Applied);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(probe.play_count(&clip("cat")), 1);

    assert_eq!(handle.resume().await.unwrap(), ControlOutcome::Applied);
    collect_until_complete(&mut handle).await;
    assert_eq!(probe.play_count(&clip("cat")), 4);
}

#[tokio::test(start_paused = true)]
async fn backgrounding_pauses_until_explicit_resume() {
    let (mut handle, probe) = spawn(voiced(&["cat", "dog"]), None);
    tokio::time::sleep(Duration::from_millis(100)).await;

    handle.suspend().await.unwrap();
    loop {
        match handle.next_event().await {
            Some(SchedulerEvent::Notice(PlaybackNotice::Interrupted)) => break,
            Some(_) => continue,
            None => panic!("driver stopped"),
        }
    }

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(probe.plays(), vec![clip("cat")]);
    assert!(matches!(probe.calls().last(), Some(AudioCall::Stop(_))));

    assert_eq!(handle.resume().await.unwrap(), ControlOutcome::Applied);
    assert_eq!(probe.play_count(&clip("cat")), 2);
}

#[tokio::test(start_paused = true)]
async fn navigation_at_edges_is_a_no_op() {
    let (handle, probe) = spawn(voiced(&["cat", "dog"]), None);

    assert_eq!(handle.prev().await.unwrap(), ControlOutcome::Boundary);
    assert_eq!(handle.next().await.unwrap(), ControlOutcome::Applied);
    assert_eq!(handle.next().await.unwrap(), ControlOutcome::Boundary);
    assert_eq!(probe.plays(), vec![clip("cat"), clip("dog")]);

    handle.exit().await;
}

#[tokio::test(start_paused = true)]
async fn missing_asset_skips_forward() {
    let words = WordList::new(vec![Word::new("cat"), Word::new("dog").with_audio(clip("dog"))]);
    let (mut handle, probe) = spawn(words, None);

    let events = collect_until_complete(&mut handle).await;

    assert!(events.contains(&SchedulerEvent::Notice(PlaybackNotice::AssetMissing {
        index: 0,
        word: "cat".to_string(),
    })));
    assert_eq!(probe.plays(), vec![clip("dog"), clip("dog"), clip("dog")]);
}

#[tokio::test(start_paused = true)]
async fn completion_cue_plays_before_session_complete() {
    let cue = AudioRef::new("done.mp3");
    let (mut handle, probe) = spawn(voiced(&["cat"]), Some(cue.clone()));

    collect_until_complete(&mut handle).await;

    assert_eq!(probe.play_count(&cue), 2);
    let last_play = probe.plays().pop();
    assert_eq!(last_play, Some(cue));
}

#[tokio::test(start_paused = true)]
async fn skip_records_word_in_outcome() {
    let (mut handle, _probe) = spawn(voiced(&["cat", "dog", "bird"]), None);

    handle.skip().await.unwrap();
    handle.skip().await.unwrap();
    collect_until_complete(&mut handle).await;

    let outcome = handle.finish().await.unwrap();
    assert_eq!(outcome.skipped, vec![0, 1]);
}

#[tokio::test(start_paused = true)]
async fn finish_early_stops_the_driver() {
    let (handle, probe) = spawn(voiced(&["cat", "dog"]), None);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let outcome = handle.finish().await.unwrap();
    assert!(!outcome.all_presented);
    assert!(matches!(probe.calls().last(), Some(AudioCall::Stop(_))));

    assert!(matches!(handle.pause().await, Err(PlaybackError::DriverStopped)));
}

#[tokio::test(start_paused = true)]
async fn exit_releases_output() {
    let (handle, probe) = spawn(voiced(&["cat"]), None);
    tokio::time::sleep(Duration::from_millis(100)).await;

    handle.exit().await;
    assert!(matches!(probe.calls().last(), Some(AudioCall::Stop(_))));

    // Nothing plays after exit.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(probe.plays().len(), 1);
}
