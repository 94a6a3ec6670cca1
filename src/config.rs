use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::difficulty::Difficulty;
use crate::divide::constants::{pellet, physics, world};
use crate::divide::state::Boundary;
use crate::progress::GameKind;

/// Shape of the divide-io world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorldShape {
    Rect,
    Circle,
}

impl WorldShape {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "rect" | "square" => Some(WorldShape::Rect),
            "circle" | "round" => Some(WorldShape::Circle),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("world size must be positive and finite, got {0}")]
    WorldSize(f32),
    #[error("frame rate must be 1-240, got {0}")]
    FrameRate(u32),
    #[error("max_frames must be at least 1")]
    MaxFrames,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Which mini-game the runner plays
    pub game: GameKind,
    pub difficulty: Difficulty,
    /// Divide-io world shape
    pub world_shape: WorldShape,
    /// Rect side or circle diameter
    pub world_size: f32,
    /// Pellet population the divide-io world is kept at
    pub pellet_count: usize,
    /// Fixed seed for reproducible sessions; entropy when unset
    pub rng_seed: Option<u64>,
    pub frame_rate: u32,
    /// Runner stops after this many frames even if the game has not ended
    pub max_frames: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            game: GameKind::Divide,
            difficulty: Difficulty::Medium,
            world_shape: WorldShape::Rect,
            world_size: world::SIZE,
            pellet_count: pellet::TARGET_COUNT,
            rng_seed: None,
            frame_rate: physics::FRAME_RATE,
            max_frames: 3600,
        }
    }
}

impl EngineConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(game) = std::env::var("GAME") {
            match GameKind::parse(&game) {
                Some(parsed) => config.game = parsed,
                None => tracing::warn!("Invalid GAME '{}', using default", game),
            }
        }

        if let Ok(difficulty) = std::env::var("DIFFICULTY") {
            match Difficulty::parse(&difficulty) {
                Some(parsed) => config.difficulty = parsed,
                None => tracing::warn!("Invalid DIFFICULTY '{}', using default", difficulty),
            }
        }

        if let Ok(shape) = std::env::var("WORLD_SHAPE") {
            match WorldShape::parse(&shape) {
                Some(parsed) => config.world_shape = parsed,
                None => tracing::warn!("Invalid WORLD_SHAPE '{}', using default", shape),
            }
        }

        if let Ok(size) = std::env::var("WORLD_SIZE") {
            if let Ok(parsed) = size.parse::<f32>() {
                if parsed.is_finite() && (500.0..=20000.0).contains(&parsed) {
                    config.world_size = parsed;
                } else {
                    tracing::warn!("WORLD_SIZE must be 500-20000, using default");
                }
            } else {
                tracing::warn!("Invalid WORLD_SIZE '{}', using default", size);
            }
        }

        if let Ok(count) = std::env::var("PELLET_COUNT") {
            if let Ok(parsed) = count.parse::<usize>() {
                if parsed <= 10000 {
                    config.pellet_count = parsed;
                } else {
                    tracing::warn!("PELLET_COUNT must be 0-10000, using default");
                }
            } else {
                tracing::warn!("Invalid PELLET_COUNT '{}', using default", count);
            }
        }

        if let Ok(seed) = std::env::var("RNG_SEED") {
            if let Ok(parsed) = seed.parse::<u64>() {
                config.rng_seed = Some(parsed);
            } else {
                tracing::warn!("Invalid RNG_SEED '{}', using entropy", seed);
            }
        }

        if let Ok(rate) = std::env::var("FRAME_RATE") {
            if let Ok(parsed) = rate.parse::<u32>() {
                if (1..=240).contains(&parsed) {
                    config.frame_rate = parsed;
                } else {
                    tracing::warn!("FRAME_RATE must be 1-240, using default");
                }
            } else {
                tracing::warn!("Invalid FRAME_RATE '{}', using default", rate);
            }
        }

        if let Ok(frames) = std::env::var("MAX_FRAMES") {
            if let Ok(parsed) = frames.parse::<u64>() {
                if parsed > 0 {
                    config.max_frames = parsed;
                } else {
                    tracing::warn!("MAX_FRAMES must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid MAX_FRAMES '{}', using default", frames);
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.world_size.is_finite() || self.world_size <= 0.0 {
            return Err(ConfigError::WorldSize(self.world_size));
        }
        if self.frame_rate == 0 || self.frame_rate > 240 {
            return Err(ConfigError::FrameRate(self.frame_rate));
        }
        if self.max_frames == 0 {
            return Err(ConfigError::MaxFrames);
        }
        Ok(())
    }

    /// Divide-io boundary described by this config
    pub fn boundary(&self) -> Boundary {
        match self.world_shape {
            WorldShape::Rect => Boundary::square(self.world_size),
            WorldShape::Circle => Boundary::round(self.world_size),
        }
    }
}
