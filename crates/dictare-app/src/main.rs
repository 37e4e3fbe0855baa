mod cli;
mod output;
mod records;
mod transcript;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;

use dictare_core::config::DictareConfig;
use dictare_core::types::WordList;
use dictare_match::error_words;
use dictare_playback::SchedulerEvent;
use dictare_session::{ManifestAssetStore, SessionCoordinator};

use cli::{expand_home, CliArgs};
use output::DryRunAudioOutput;
use records::JsonFileRecordSink;
use transcript::TranscriptRecognizer;

/// Progress line for the person taking the dictation.
fn report(event: &SchedulerEvent, total: usize) {
    match event {
        SchedulerEvent::WordEntered { index, word } => {
            eprintln!("[{}/{}] {}", index + 1, total, word);
        }
        SchedulerEvent::SessionComplete => eprintln!("All words played."),
        _ => {}
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Read config before tracing so its log level can seed the filter.
    let config_file = args.resolve_config_path();
    let loaded = DictareConfig::load(&config_file);
    let log_level = args
        .resolve_log_level()
        .or_else(|| loaded.as_ref().ok().map(|c| c.general.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Dictare v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            if config_file.exists() {
                tracing::warn!(path = %config_file.display(), error = %e, "Invalid config, using defaults");
            } else {
                tracing::debug!(path = %config_file.display(), "No config file, using defaults");
            }
            DictareConfig::default()
        }
    };
    if let Some(dir) = args.resolve_data_dir() {
        config.general.data_dir = dir;
    }
    if args.shuffle {
        config.playback.shuffle = true;
    }

    let data_dir = expand_home(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    // Inputs.
    let words = WordList::parse(&std::fs::read_to_string(&args.words)?);
    if words.is_empty() {
        tracing::error!(path = %args.words.display(), "Word list is empty");
        return Err("word list is empty".into());
    }
    let answer = std::fs::read(&args.answer)?;

    // Collaborators.
    let manifest = args
        .assets
        .clone()
        .unwrap_or_else(|| data_dir.join("audio").join("manifest.json"));
    let assets = Arc::new(ManifestAssetStore::load(&manifest)?);
    let sink = Arc::new(JsonFileRecordSink::in_dir(&data_dir));
    tracing::debug!(path = %sink.path().display(), "Records file");

    let coordinator = SessionCoordinator::new(&config, assets, TranscriptRecognizer, sink);

    // Playback.
    let (audio_tx, audio_rx) = mpsc::unbounded_channel();
    let mut audio = DryRunAudioOutput::new(audio_tx, Duration::from_millis(args.clip_ms));
    if args.no_file_check {
        audio = audio.without_file_check();
    }
    let total = words.len();
    let mut session = coordinator.begin(words, audio, audio_rx);

    let completed = tokio::select! {
        result = session.wait_for_completion(|event| report(event, total)) => {
            result?;
            true
        }
        _ = tokio::signal::ctrl_c() => false,
    };
    if !completed {
        tracing::info!("Interrupted, scoring the words played so far");
    }

    // Scoring.
    let finished = session.finish().await?;
    let record = coordinator
        .reconcile(finished, &answer, args.title.as_deref())
        .await?;

    eprintln!(
        "{}: {}/{} correct ({}%)",
        record.title, record.summary.correct, record.summary.total, record.summary.accuracy_percent
    );
    let mistakes = error_words(&record.results);
    if !mistakes.is_empty() {
        eprintln!("Mistakes: {}", mistakes);
    }
    println!("{}", serde_json::to_string_pretty(&record)?);

    Ok(())
}
