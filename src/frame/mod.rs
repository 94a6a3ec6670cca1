//! Frame scheduling
//!
//! A session implements [`Simulation`]: one call advances the world by one frame,
//! draws it and reports events. [`FrameScheduler`] sits between the host's
//! frame-callback mechanism and the session. It owns the teardown contract:
//! once stopped or finished it never runs another frame, and the game-over
//! callback fires at most once.

pub mod input;
pub mod performance;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::audio::{AudioSink, NullAudio, SoundCue};
use crate::difficulty::Difficulty;
use crate::frame::input::{FrameInput, InputLatch};
use crate::frame::performance::PerformanceMonitor;
use crate::progress::{GameKind, ProgressStore};
use crate::render::RenderSurface;

/// Final result of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum GameOutcome {
    /// Divide-io ends when the player has no cells left
    Divide { score: u64 },
    /// Magic-bubbles ends on a cleared board (win), overflow, lose line or timeout
    Bubbles { won: bool, score: u64 },
}

impl GameOutcome {
    pub fn score(&self) -> u64 {
        match *self {
            GameOutcome::Divide { score } => score,
            GameOutcome::Bubbles { score, .. } => score,
        }
    }

    pub fn won(&self) -> bool {
        matches!(self, GameOutcome::Bubbles { won: true, .. })
    }

    pub fn game(&self) -> GameKind {
        match self {
            GameOutcome::Divide { .. } => GameKind::Divide,
            GameOutcome::Bubbles { .. } => GameKind::Bubbles,
        }
    }
}

/// Events that may want a sound
pub trait CueSource {
    fn cue(&self) -> Option<SoundCue>;
}

/// What one frame produced
#[derive(Debug, Clone)]
pub struct FrameReport<E> {
    pub events: Vec<E>,
    /// Set on the frame where a terminal condition was reached
    pub outcome: Option<GameOutcome>,
}

impl<E> FrameReport<E> {
    pub fn running(events: Vec<E>) -> Self {
        Self {
            events,
            outcome: None,
        }
    }
}

/// A game session advanced one frame at a time
pub trait Simulation {
    type Input: FrameInput;
    type Event: CueSource + std::fmt::Debug;

    fn game(&self) -> GameKind;

    fn difficulty(&self) -> Difficulty;

    /// Number of live entities, for frame-budget reporting
    fn entity_count(&self) -> usize;

    /// Run input, update, resolve, draw and terminal checks for one frame
    fn frame(
        &mut self,
        input: &Self::Input,
        surface: &mut dyn RenderSurface,
    ) -> FrameReport<Self::Event>;
}

/// Cancellation flag shared with whatever tears the host UI down
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Result of offering the scheduler a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Frame ran; the host should request another
    Continue,
    /// The session has ended; no further frames will run
    Finished(GameOutcome),
    /// Stopped from outside; no further frames will run
    Stopped,
}

impl FrameStatus {
    pub fn wants_next_frame(&self) -> bool {
        matches!(self, FrameStatus::Continue)
    }
}

type GameOverCallback<'a> = Box<dyn FnOnce(GameOutcome) + 'a>;

/// Drives a [`Simulation`] from host frame callbacks
pub struct FrameScheduler<'a, S: Simulation> {
    session: S,
    stop: StopHandle,
    finished: Option<GameOutcome>,
    audio: Box<dyn AudioSink + 'a>,
    progress: Option<&'a mut dyn ProgressStore>,
    on_game_over: Option<GameOverCallback<'a>>,
    monitor: PerformanceMonitor,
    frames: u64,
}

impl<'a, S: Simulation> FrameScheduler<'a, S> {
    pub fn new(session: S, frame_rate: u32) -> Self {
        info!(
            "Scheduling {} session ({}) at {} fps",
            session.game().as_str(),
            session.difficulty().as_str(),
            frame_rate
        );
        Self {
            session,
            stop: StopHandle::new(),
            finished: None,
            audio: Box::new(NullAudio),
            progress: None,
            on_game_over: None,
            monitor: PerformanceMonitor::new(frame_rate),
            frames: 0,
        }
    }

    pub fn with_audio(mut self, audio: impl AudioSink + 'a) -> Self {
        self.audio = Box::new(audio);
        self
    }

    pub fn with_progress(mut self, store: &'a mut dyn ProgressStore) -> Self {
        self.progress = Some(store);
        self
    }

    pub fn on_game_over(mut self, callback: impl FnOnce(GameOutcome) + 'a) -> Self {
        self.on_game_over = Some(Box::new(callback));
        self
    }

    /// Handle that can stop this scheduler from elsewhere (UI teardown, Ctrl+C)
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.finished
    }

    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    /// Take one snapshot from the latch and run a frame with it
    pub fn on_frame_latched(
        &mut self,
        latch: &InputLatch<S::Input>,
        surface: &mut dyn RenderSurface,
    ) -> FrameStatus {
        if let Some(status) = self.terminal_status() {
            return status;
        }
        let input = latch.take_snapshot();
        self.on_frame(&input, surface)
    }

    /// Host frame callback
    pub fn on_frame(&mut self, input: &S::Input, surface: &mut dyn RenderSurface) -> FrameStatus {
        if let Some(status) = self.terminal_status() {
            return status;
        }

        self.monitor.frame_start();
        let report = self.session.frame(input, surface);
        self.frames += 1;

        if let Some(status) = self.monitor.frame_end(self.session.entity_count()) {
            if status.is_degraded() {
                warn!("Frame budget degraded: {}", self.monitor.status_message());
            } else {
                debug!("Frame budget recovered: {}", self.monitor.status_message());
            }
        }

        for event in &report.events {
            if let Some(cue) = event.cue() {
                self.audio.play(cue);
            }
        }

        match report.outcome {
            Some(outcome) => {
                self.finish(outcome);
                FrameStatus::Finished(outcome)
            }
            None => FrameStatus::Continue,
        }
    }

    fn terminal_status(&self) -> Option<FrameStatus> {
        if let Some(outcome) = self.finished {
            return Some(FrameStatus::Finished(outcome));
        }
        if self.stop.is_stopped() {
            return Some(FrameStatus::Stopped);
        }
        None
    }

    fn finish(&mut self, outcome: GameOutcome) {
        self.finished = Some(outcome);
        info!(
            "{} session over after {} frames: score {}{}",
            outcome.game().as_str(),
            self.frames,
            outcome.score(),
            if outcome.won() { " (victory)" } else { "" }
        );

        if let Some(store) = self.progress.as_deref_mut() {
            if store.update_high_score_if_greater(outcome.game(), outcome.score()) {
                info!("New {} high score: {}", outcome.game().as_str(), outcome.score());
            }
            if outcome.won() {
                store.update_max_level_if_greater(outcome.game(), self.session.difficulty().level());
            }
        }

        if let Some(callback) = self.on_game_over.take() {
            callback(outcome);
        }
    }
}
