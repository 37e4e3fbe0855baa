//! Runs a `PlaybackScheduler` on a tokio task.
//!
//! The driver owns the scheduler and is the only thing that touches it.
//! Commands, audio events and the pending timer are multiplexed with
//! `tokio::select!`, so every input is handled to completion before the next
//! one is looked at.

use std::future;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::audio::{AudioEvent, AudioOutput};
use crate::error::PlaybackError;
use crate::scheduler::{ControlOutcome, PlaybackOutcome, PlaybackScheduler, SchedulerEvent, TimerToken};

const COMMAND_BUFFER: usize = 16;

type Reply<T> = oneshot::Sender<Result<T, PlaybackError>>;

/// User controls forwarded to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Pause,
    Resume,
    Skip,
    Prev,
    Next,
    Replay,
    Restart,
}

/// Messages accepted by a running driver.
#[derive(Debug)]
pub enum PlaybackCommand {
    Control(ControlAction, Reply<ControlOutcome>),
    /// The host is going to the background.
    Suspend,
    /// Hand the session off and stop the driver.
    Finish(Reply<PlaybackOutcome>),
    /// Abandon the session. Output is released.
    Exit,
}

/// Task-side half: owns the scheduler and its inputs.
pub struct PlaybackDriver<A: AudioOutput> {
    scheduler: PlaybackScheduler<A>,
    commands: mpsc::Receiver<PlaybackCommand>,
    audio_events: mpsc::UnboundedReceiver<AudioEvent>,
    events: mpsc::UnboundedSender<SchedulerEvent>,
    deadline: Option<(TimerToken, Instant)>,
}

impl<A: AudioOutput + 'static> PlaybackDriver<A> {
    /// Start `scheduler` on a new task. `audio_events` must receive every
    /// event the scheduler's audio output reports.
    pub fn spawn(
        scheduler: PlaybackScheduler<A>,
        audio_events: mpsc::UnboundedReceiver<AudioEvent>,
    ) -> PlaybackHandle {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let driver = Self {
            scheduler,
            commands: command_rx,
            audio_events,
            events: event_tx,
            deadline: None,
        };
        let task = tokio::spawn(driver.run());

        PlaybackHandle {
            commands: command_tx,
            events: event_rx,
            task,
        }
    }

    async fn run(mut self) {
        if let Err(e) = self.scheduler.start() {
            tracing::error!(error = %e, "Failed to start playback");
            return;
        }
        self.flush();

        loop {
            let deadline = self.deadline.map(|(_, at)| at);
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(PlaybackCommand::Control(action, reply)) => {
                        let result = self.apply(action);
                        self.flush();
                        let _ = reply.send(result);
                    }
                    Some(PlaybackCommand::Suspend) => {
                        self.scheduler.suspend();
                        self.flush();
                    }
                    Some(PlaybackCommand::Finish(reply)) => {
                        let result = self.scheduler.finish();
                        self.flush();
                        let finished = result.is_ok();
                        let _ = reply.send(result);
                        if finished {
                            return;
                        }
                    }
                    Some(PlaybackCommand::Exit) | None => {
                        tracing::info!(state = %self.scheduler.state(), "Playback driver exiting");
                        self.scheduler.stop();
                        return;
                    }
                },
                Some(event) = self.audio_events.recv() => {
                    self.scheduler.on_audio_event(event);
                    self.flush();
                }
                _ = wait_until(deadline) => {
                    if let Some((token, _)) = self.deadline.take() {
                        self.scheduler.on_timer(token);
                        self.flush();
                    }
                }
            }
        }
    }

    fn apply(&mut self, action: ControlAction) -> Result<ControlOutcome, PlaybackError> {
        match action {
            ControlAction::Pause => self.scheduler.pause(),
            ControlAction::Resume => self.scheduler.resume(),
            ControlAction::Skip => self.scheduler.skip(),
            ControlAction::Prev => self.scheduler.prev(),
            ControlAction::Next => self.scheduler.next(),
            ControlAction::Replay => self.scheduler.replay(),
            ControlAction::Restart => self.scheduler.restart(),
        }
    }

    /// Sync the sleep deadline with the scheduler and publish its events.
    fn flush(&mut self) {
        self.deadline = match self.scheduler.pending_timer() {
            Some(timer) => match self.deadline {
                Some((token, at)) if token == timer.token => Some((token, at)),
                _ => Some((timer.token, Instant::now() + timer.delay)),
            },
            None => None,
        };

        for event in self.scheduler.drain_events() {
            // Nobody listening is fine; the session keeps running.
            let _ = self.events.send(event);
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => future::pending().await,
    }
}

/// Caller-side half of a running driver.
pub struct PlaybackHandle {
    commands: mpsc::Sender<PlaybackCommand>,
    events: mpsc::UnboundedReceiver<SchedulerEvent>,
    task: JoinHandle<()>,
}

impl PlaybackHandle {
    pub async fn pause(&self) -> Result<ControlOutcome, PlaybackError> {
        self.control(ControlAction::Pause).await
    }

    pub async fn resume(&self) -> Result<ControlOutcome, PlaybackError> {
        self.control(ControlAction::Resume).await
    }

    pub async fn skip(&self) -> Result<ControlOutcome, PlaybackError> {
        self.control(ControlAction::Skip).await
    }

    pub async fn prev(&self) -> Result<ControlOutcome, PlaybackError> {
        self.control(ControlAction::Prev).await
    }

    pub async fn next(&self) -> Result<ControlOutcome, PlaybackError> {
        self.control(ControlAction::Next).await
    }

    pub async fn replay(&self) -> Result<ControlOutcome, PlaybackError> {
        self.control(ControlAction::Replay).await
    }

    pub async fn restart(&self) -> Result<ControlOutcome, PlaybackError> {
        self.control(ControlAction::Restart).await
    }

    pub async fn control(&self, action: ControlAction) -> Result<ControlOutcome, PlaybackError> {
        let (tx, rx) = oneshot::channel();
        self.send(PlaybackCommand::Control(action, tx)).await?;
        rx.await.map_err(|_| PlaybackError::DriverStopped)?
    }

    /// Tell the driver the host is going to the background.
    pub async fn suspend(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::Suspend).await
    }

    /// Hand the session off. On success the driver stops.
    pub async fn finish(&self) -> Result<PlaybackOutcome, PlaybackError> {
        let (tx, rx) = oneshot::channel();
        self.send(PlaybackCommand::Finish(tx)).await?;
        rx.await.map_err(|_| PlaybackError::DriverStopped)?
    }

    /// Abandon the session and wait for the driver to release output.
    pub async fn exit(self) {
        let _ = self.commands.send(PlaybackCommand::Exit).await;
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Playback driver task failed");
        }
    }

    /// Next event published by the scheduler. `None` once the driver stopped
    /// and every event was consumed.
    pub async fn next_event(&mut self) -> Option<SchedulerEvent> {
        self.events.recv().await
    }

    /// Consume events until `SessionComplete`, passing each one to `observe`.
    pub async fn wait_for_completion<F>(&mut self, mut observe: F) -> Result<(), PlaybackError>
    where
        F: FnMut(&SchedulerEvent),
    {
        while let Some(event) = self.events.recv().await {
            observe(&event);
            if event == SchedulerEvent::SessionComplete {
                return Ok(());
            }
        }
        Err(PlaybackError::DriverStopped)
    }

    async fn send(&self, command: PlaybackCommand) -> Result<(), PlaybackError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PlaybackError::DriverStopped)
    }
}

impl std::fmt::Debug for PlaybackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackHandle")
            .field("running", &!self.task.is_finished())
            .finish()
    }
}
