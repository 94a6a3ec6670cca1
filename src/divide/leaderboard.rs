//! Per-owner ranking
//!
//! Recomputed every frame from the live cells; an owner's score is the total
//! mass of all its cells.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::divide::state::{DivideWorld, Owner};

/// One owner's standing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub owner: Owner,
    pub name: String,
    pub rank: u32,
    pub total_mass: f32,
    pub cell_count: usize,
    pub is_player: bool,
}

/// Full ranking, best first
#[derive(Debug, Clone, Default, Serialize)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Rank every owner that still has cells
    pub fn compute(world: &DivideWorld) -> Self {
        let mut totals: FxHashMap<Owner, LeaderboardEntry> = FxHashMap::default();
        for cell in &world.cells {
            let entry = totals.entry(cell.owner).or_insert_with(|| LeaderboardEntry {
                owner: cell.owner,
                name: cell.name.clone(),
                rank: 0,
                total_mass: 0.0,
                cell_count: 0,
                is_player: cell.is_player(),
            });
            entry.total_mass += cell.mass();
            entry.cell_count += 1;
        }

        let mut entries: Vec<LeaderboardEntry> = totals.into_values().collect();

        // Sort by: mass (desc), then owner id so ties are stable
        entries.sort_by(|a, b| {
            b.total_mass
                .partial_cmp(&a.total_mass)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.owner.id.cmp(&b.owner.id))
        });

        for (i, entry) in entries.iter_mut().enumerate() {
            entry.rank = (i + 1) as u32;
        }

        Self { entries }
    }

    /// The best `n` entries
    pub fn top(&self, n: usize) -> &[LeaderboardEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn leader(&self) -> Option<&LeaderboardEntry> {
        self.entries.first()
    }

    pub fn player_rank(&self) -> Option<u32> {
        self.entries.iter().find(|e| e.is_player).map(|e| e.rank)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
