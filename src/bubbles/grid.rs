//! Bubble grid and world <-> grid mapping
//!
//! Square cells of one bubble diameter; row 0 hangs from the ceiling. The grid
//! owns every fixed bubble, so a bubble's `Fixed { row, col }` always matches
//! the slot that holds it.

use serde::Serialize;
use smallvec::SmallVec;

use crate::bubbles::constants::geometry::{DIAMETER, RADIUS};
use crate::bubbles::state::{Bubble, BubbleState};
use crate::util::vec2::Vec2;

/// Grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

impl GridPos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Clone)]
pub struct BubbleGrid {
    rows: usize,
    columns: usize,
    slots: Vec<Option<Bubble>>,
}

impl BubbleGrid {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            slots: vec![None; rows * columns],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Flat slot index, `None` when out of range
    pub fn index(&self, pos: GridPos) -> Option<usize> {
        (pos.row < self.rows && pos.col < self.columns).then(|| pos.row * self.columns + pos.col)
    }

    pub fn get(&self, pos: GridPos) -> Option<&Bubble> {
        self.index(pos).and_then(|i| self.slots[i].as_ref())
    }

    pub fn is_occupied(&self, pos: GridPos) -> bool {
        self.get(pos).is_some()
    }

    /// Put `bubble` into an empty slot, snapping it to the slot centre.
    /// Hands the bubble back when the slot is taken or out of range.
    pub fn place(&mut self, pos: GridPos, mut bubble: Bubble) -> Result<(), Bubble> {
        let Some(index) = self.index(pos) else {
            return Err(bubble);
        };
        if self.slots[index].is_some() {
            return Err(bubble);
        }
        bubble.state = BubbleState::Fixed {
            row: pos.row,
            col: pos.col,
        };
        bubble.position = Self::cell_center(pos);
        bubble.velocity = Vec2::ZERO;
        self.slots[index] = Some(bubble);
        Ok(())
    }

    /// Remove and return the bubble at `pos`
    pub fn take(&mut self, pos: GridPos) -> Option<Bubble> {
        let index = self.index(pos)?;
        self.slots[index].take()
    }

    /// World position of a slot centre
    pub fn cell_center(pos: GridPos) -> Vec2 {
        Vec2::new(
            pos.col as f32 * DIAMETER + RADIUS,
            pos.row as f32 * DIAMETER + RADIUS,
        )
    }

    /// Slot containing `point`. Columns and negative rows are clamped into
    /// the grid; a point below the last row is overflow (`None`).
    pub fn world_to_grid(&self, point: Vec2) -> Option<GridPos> {
        if self.columns == 0 || !point.is_finite() {
            return None;
        }
        let col = (point.x / DIAMETER).floor().max(0.0) as usize;
        let row = (point.y / DIAMETER).floor().max(0.0) as usize;
        if row >= self.rows {
            return None;
        }
        Some(GridPos::new(row, col.min(self.columns - 1)))
    }

    /// Slot for a bubble that stopped at `point`: the slot under it, else the
    /// slot directly above. `None` means the shot cannot be placed (overflow).
    pub fn fixation_slot(&self, point: Vec2) -> Option<GridPos> {
        let pos = self.world_to_grid(point)?;
        if !self.is_occupied(pos) {
            return Some(pos);
        }
        let above = GridPos::new(pos.row.checked_sub(1)?, pos.col);
        (!self.is_occupied(above)).then_some(above)
    }

    /// In-range up/down/left/right neighbours
    pub fn neighbours(&self, pos: GridPos) -> SmallVec<[GridPos; 4]> {
        let mut out = SmallVec::new();
        if pos.row > 0 {
            out.push(GridPos::new(pos.row - 1, pos.col));
        }
        if pos.row + 1 < self.rows {
            out.push(GridPos::new(pos.row + 1, pos.col));
        }
        if pos.col > 0 {
            out.push(GridPos::new(pos.row, pos.col - 1));
        }
        if pos.col + 1 < self.columns {
            out.push(GridPos::new(pos.row, pos.col + 1));
        }
        out
    }

    /// Occupied slots in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (GridPos, &Bubble)> {
        let columns = self.columns;
        self.slots.iter().enumerate().filter_map(move |(i, slot)| {
            slot.as_ref()
                .map(|b| (GridPos::new(i / columns, i % columns), b))
        })
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    /// Lowest bubble edge on the board, if any
    pub fn lowest_edge(&self) -> Option<f32> {
        self.iter()
            .map(|(_, b)| b.position.y + b.radius())
            .fold(None, |lowest, y| Some(lowest.map_or(y, |l: f32| l.max(y))))
    }
}
