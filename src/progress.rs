//! Progress / high-score boundary
//!
//! The surrounding app owns persistence. The engine only reports results after a
//! session ends, through "update if greater" calls.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Which mini-game a result belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Divide,
    Bubbles,
}

impl GameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Divide => "divide",
            GameKind::Bubbles => "bubbles",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "divide" | "divide-io" | "divideio" => Some(GameKind::Divide),
            "bubbles" | "magic-bubbles" | "magicbubbles" => Some(GameKind::Bubbles),
            _ => None,
        }
    }
}

/// Store for per-game records
pub trait ProgressStore {
    /// Returns true if the stored high score was raised
    fn update_high_score_if_greater(&mut self, game: GameKind, score: u64) -> bool;

    /// Returns true if the stored max level was raised
    fn update_max_level_if_greater(&mut self, game: GameKind, level: u32) -> bool;
}

/// Per-game record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub high_score: u64,
    pub max_level: u32,
}

/// In-process store, used by the headless runner and tests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryProgress {
    records: HashMap<GameKind, GameRecord>,
}

impl MemoryProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, game: GameKind) -> GameRecord {
        self.records.get(&game).copied().unwrap_or_default()
    }
}

impl ProgressStore for MemoryProgress {
    fn update_high_score_if_greater(&mut self, game: GameKind, score: u64) -> bool {
        let record = self.records.entry(game).or_default();
        if score > record.high_score {
            record.high_score = score;
            true
        } else {
            false
        }
    }

    fn update_max_level_if_greater(&mut self, game: GameKind, level: u32) -> bool {
        let record = self.records.entry(game).or_default();
        if level > record.max_level {
            record.max_level = level;
            true
        } else {
            false
        }
    }
}
