//! Magic-bubbles: aim, shoot, pop groups of three, drop what comes loose

pub mod constants;
pub mod grid;
pub mod matching;
pub mod session;
pub mod state;

pub use session::{BubbleInput, BubbleSession};
