//! Divide-io: grow by eating pellets and smaller cells, split to lunge, merge back

pub mod constants;
pub mod leaderboard;
pub mod session;
pub mod spatial;
pub mod state;
pub mod systems;

pub use session::{DivideInput, DivideSession};
