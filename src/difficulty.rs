//! Difficulty presets
//!
//! The engines never branch on the preset itself; they only read the settings
//! structs produced here.

use serde::{Deserialize, Serialize};

/// Difficulty levels offered by the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" | "normal" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Level number reported to the progress store (1-based)
    pub fn level(&self) -> u32 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    pub fn divide_settings(&self) -> DivideSettings {
        match self {
            Difficulty::Easy => DivideSettings {
                bot_count: 5,
                bot_aggression: 0.3,
                bot_split_chance: 0.005,
            },
            Difficulty::Medium => DivideSettings {
                bot_count: 8,
                bot_aggression: 0.6,
                bot_split_chance: 0.015,
            },
            Difficulty::Hard => DivideSettings {
                bot_count: 12,
                bot_aggression: 0.9,
                bot_split_chance: 0.03,
            },
        }
    }

    pub fn bubble_settings(&self) -> BubbleSettings {
        match self {
            Difficulty::Easy => BubbleSettings {
                time_limit_secs: 180,
                color_count: 3,
                rows: 4,
                initial_speed: 10.0,
            },
            Difficulty::Medium => BubbleSettings {
                time_limit_secs: 150,
                color_count: 4,
                rows: 5,
                initial_speed: 12.0,
            },
            Difficulty::Hard => BubbleSettings {
                time_limit_secs: 120,
                color_count: 6,
                rows: 6,
                initial_speed: 14.0,
            },
        }
    }
}

/// Divide-io bot population parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DivideSettings {
    /// Number of bots spawned at session start
    pub bot_count: usize,
    /// Probability (0.0-1.0) that a bot commits to chasing a prey candidate
    pub bot_aggression: f32,
    /// Per-frame probability of an opportunistic split while closing in on prey
    pub bot_split_chance: f32,
}

impl Default for DivideSettings {
    fn default() -> Self {
        Difficulty::default().divide_settings()
    }
}

/// Magic-bubbles board parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BubbleSettings {
    /// Session length; running out of time is a loss
    pub time_limit_secs: u32,
    /// Number of palette colours in play (clamped to the palette size)
    pub color_count: usize,
    /// Pre-filled rows at session start
    pub rows: usize,
    /// Launch speed in px/frame
    pub initial_speed: f32,
}

impl Default for BubbleSettings {
    fn default() -> Self {
        Difficulty::default().bubble_settings()
    }
}
