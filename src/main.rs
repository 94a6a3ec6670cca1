use std::time::Duration;

use anyhow::Context;
use minigame_engine::audio::CueLog;
use minigame_engine::bubbles::{BubbleInput, BubbleSession};
use minigame_engine::config::EngineConfig;
use minigame_engine::divide::constants::mass;
use minigame_engine::divide::{DivideInput, DivideSession};
use minigame_engine::frame::input::{InputLatch, InputWriter};
use minigame_engine::frame::{FrameScheduler, FrameStatus, GameOutcome, Simulation};
use minigame_engine::progress::{GameKind, MemoryProgress};
use minigame_engine::render::FrameRecorder;
use minigame_engine::util::vec2::Vec2;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Minigame Engine v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = EngineConfig::load_or_default();
    config.validate().context("invalid configuration")?;
    info!(
        "Configuration loaded: game={}, difficulty={}, frame_rate={}, max_frames={}",
        config.game.as_str(),
        config.difficulty.as_str(),
        config.frame_rate,
        config.max_frames
    );

    let mut progress = MemoryProgress::new();
    let mut cues = CueLog::default();

    let outcome = match config.game {
        GameKind::Divide => {
            let session = DivideSession::new(
                config.difficulty,
                config.boundary(),
                config.pellet_count,
                config.rng_seed,
            );
            let scheduler = FrameScheduler::new(session, config.frame_rate)
                .with_audio(&mut cues)
                .with_progress(&mut progress);
            run(scheduler, &config, script_divide, sanitize_divide).await
        }
        GameKind::Bubbles => {
            let session = BubbleSession::new(config.difficulty, config.rng_seed, config.frame_rate);
            let scheduler = FrameScheduler::new(session, config.frame_rate)
                .with_audio(&mut cues)
                .with_progress(&mut progress);
            run(scheduler, &config, script_bubbles, sanitize_bubbles).await
        }
    };

    match outcome {
        Some(outcome) => println!("{}", serde_json::to_string_pretty(&outcome)?),
        None => info!("Session ended without an outcome"),
    }
    info!(
        "Record: {}, cues played: {}",
        serde_json::to_string(&progress.record(config.game))?,
        cues.played.len()
    );

    Ok(())
}

/// Drive one session on a fixed tick until it ends, is interrupted or hits the frame cap
async fn run<S: Simulation>(
    mut scheduler: FrameScheduler<'_, S>,
    config: &EngineConfig,
    script: fn(u64, &InputWriter<S::Input>),
    sanitize: fn(&mut S),
) -> Option<GameOutcome> {
    let latch: InputLatch<S::Input> = InputLatch::new();
    let writer = latch.writer();
    let mut surface = FrameRecorder::new(Vec2::new(800.0, 600.0));

    let stop = scheduler.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            stop.stop();
        }
    });

    let mut ticker = interval(Duration::from_secs_f64(1.0 / config.frame_rate as f64));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let frame = scheduler.frames();
        if frame >= config.max_frames {
            info!("Frame cap of {} reached", config.max_frames);
            scheduler.stop();
            return None;
        }
        script(frame, &writer);

        let status = scheduler.on_frame_latched(&latch, &mut surface);
        sanitize(scheduler.session_mut());

        match status {
            FrameStatus::Continue => {}
            FrameStatus::Finished(outcome) => return Some(outcome),
            FrameStatus::Stopped => {
                info!("Stopped after {} frames", scheduler.frames());
                return None;
            }
        }
    }
}

/// Circle slowly and split every four seconds
fn script_divide(frame: u64, writer: &InputWriter<DivideInput>) {
    let angle = frame as f32 * 0.01;
    writer.update(|input| {
        input.joystick = Vec2::from_angle(angle);
        if frame % 240 == 239 {
            input.split = true;
        }
    });
}

/// Sweep the aim back and forth and fire twice a second
fn script_bubbles(frame: u64, writer: &InputWriter<BubbleInput>) {
    let sweep = (frame as f32 * 0.05).sin();
    writer.update(|input| {
        input.aim = sweep * 1.2;
        if frame % 30 == 0 {
            input.launch = true;
        }
    });
}

/// Fix NaN/Infinity cell state so one bad frame cannot corrupt the world
fn sanitize_divide(session: &mut DivideSession) {
    let world = session.world_mut();
    let boundary = world.boundary;
    for cell in &mut world.cells {
        if !cell.position.is_finite() {
            warn!("Fixed non-finite position for cell {}", cell.id);
            cell.position = boundary.center();
        }
        if !cell.velocity.is_finite() {
            warn!("Fixed non-finite velocity for cell {}", cell.id);
            cell.velocity = Vec2::ZERO;
        }
        if !cell.mass().is_finite() || cell.mass() <= 0.0 {
            warn!("Fixed invalid mass for cell {}", cell.id);
            cell.set_mass(mass::STARTING);
        }
    }
}

/// Drop a shot or falling bubble that went non-finite
fn sanitize_bubbles(session: &mut BubbleSession) {
    let game = session.game_mut();
    let bad_shot = game
        .shooting
        .as_ref()
        .filter(|shot| !shot.position.is_finite() || !shot.velocity.is_finite())
        .map(|shot| shot.id);
    if let Some(id) = bad_shot {
        warn!("Discarded non-finite shot {}", id);
        game.shooting = None;
    }
    game.falling.retain(|b| {
        let finite = b.position.is_finite() && b.velocity.is_finite();
        if !finite {
            warn!("Discarded non-finite falling bubble {}", b.id);
        }
        finite
    });
}
