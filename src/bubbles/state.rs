//! Magic-bubbles entities

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::bubbles::constants::{geometry, PALETTE_SIZE};
use crate::render::Color;
use crate::util::vec2::Vec2;

pub type BubbleId = u32;

/// The fixed bubble palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BubbleColor {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

impl BubbleColor {
    pub const ALL: [BubbleColor; PALETTE_SIZE] = [
        BubbleColor::Red,
        BubbleColor::Orange,
        BubbleColor::Yellow,
        BubbleColor::Green,
        BubbleColor::Blue,
        BubbleColor::Purple,
    ];

    /// Uniform pick from the first `color_count` palette entries (clamped to 1..=6)
    pub fn random(rng: &mut impl Rng, color_count: usize) -> Self {
        let count = clamp_color_count(color_count);
        Self::ALL[rng.gen_range(0..count)]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BubbleColor::Red => "red",
            BubbleColor::Orange => "orange",
            BubbleColor::Yellow => "yellow",
            BubbleColor::Green => "green",
            BubbleColor::Blue => "blue",
            BubbleColor::Purple => "purple",
        }
    }

    pub fn fill(&self) -> Color {
        match self {
            BubbleColor::Red => Color::rgb(244, 67, 54),
            BubbleColor::Orange => Color::rgb(255, 152, 0),
            BubbleColor::Yellow => Color::rgb(255, 235, 59),
            BubbleColor::Green => Color::rgb(76, 175, 80),
            BubbleColor::Blue => Color::rgb(33, 150, 243),
            BubbleColor::Purple => Color::rgb(156, 39, 176),
        }
    }
}

/// Requested colour counts outside the palette are clamped, never rejected
pub fn clamp_color_count(color_count: usize) -> usize {
    color_count.clamp(1, PALETTE_SIZE)
}

/// Where a bubble is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BubbleState {
    /// Launched and moving under its own velocity
    InFlight,
    /// Occupying exactly one grid cell
    Fixed { row: usize, col: usize },
    /// Cut off from the ceiling, dropping out of the field
    Falling,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bubble {
    pub id: BubbleId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: BubbleColor,
    pub state: BubbleState,
}

impl Bubble {
    pub fn in_flight(id: BubbleId, position: Vec2, velocity: Vec2, color: BubbleColor) -> Self {
        Self {
            id,
            position,
            velocity,
            color,
            state: BubbleState::InFlight,
        }
    }

    pub fn radius(&self) -> f32 {
        geometry::RADIUS
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self.state, BubbleState::Fixed { .. })
    }

    pub fn is_falling(&self) -> bool {
        self.state == BubbleState::Falling
    }

    /// (row, col) while fixed
    pub fn grid_cell(&self) -> Option<(usize, usize)> {
        match self.state {
            BubbleState::Fixed { row, col } => Some((row, col)),
            _ => None,
        }
    }

    /// Release from the grid with the given velocity
    pub fn start_falling(&mut self, velocity: Vec2) {
        self.state = BubbleState::Falling;
        self.velocity = velocity;
    }
}
