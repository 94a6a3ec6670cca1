//! Minigame Engine Library
//!
//! Frame-driven simulation cores for two casual mini-games:
//!
//! - `divide` - divide-io: grow a cell by eating pellets and smaller cells, split and merge
//! - `bubbles` - magic-bubbles: shoot coloured bubbles into a grid, pop groups of three
//!
//! Rendering, sound and score persistence are collaborators behind the traits in
//! [`render`], [`audio`] and [`progress`]; [`frame::FrameScheduler`] drives a session
//! from the host's frame callback.

pub mod audio;
pub mod bubbles;
pub mod config;
pub mod difficulty;
pub mod divide;
pub mod frame;
pub mod progress;
pub mod render;
pub mod util;

pub use bubbles::{BubbleInput, BubbleSession};
pub use config::EngineConfig;
pub use difficulty::Difficulty;
pub use divide::{DivideInput, DivideSession};
pub use frame::{FrameScheduler, FrameStatus, GameOutcome, Simulation};
