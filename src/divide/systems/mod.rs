//! Divide-io systems
//!
//! Free functions over [`DivideWorld`](crate::divide::state::DivideWorld), run in a fixed
//! order by the session: input, ai, physics, merge, predation, pellets.

pub mod ai;
pub mod collision;
pub mod pellets;
pub mod physics;

use serde::Serialize;

use crate::audio::SoundCue;
use crate::divide::state::CellId;
use crate::frame::CueSource;

/// Something that happened during a divide-io frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DivideEvent {
    /// A cell ate one or more pellets
    Collected {
        cell: CellId,
        pellets: u32,
        by_player: bool,
    },
    Split {
        parent: CellId,
        child: CellId,
        by_player: bool,
    },
    /// Two sibling cells recombined
    Merged {
        survivor: CellId,
        absorbed: CellId,
        by_player: bool,
    },
    /// A cell was engulfed by a bigger cell of another owner
    Eaten {
        predator: CellId,
        prey: CellId,
        prey_mass: f32,
        predator_is_player: bool,
        prey_is_player: bool,
    },
}

impl CueSource for DivideEvent {
    fn cue(&self) -> Option<SoundCue> {
        // Only the player's own actions are audible
        match *self {
            DivideEvent::Collected { by_player: true, .. } => Some(SoundCue::Collect),
            DivideEvent::Split { by_player: true, .. } => Some(SoundCue::Split),
            DivideEvent::Eaten {
                predator_is_player: true,
                ..
            } => Some(SoundCue::Pop),
            _ => None,
        }
    }
}
