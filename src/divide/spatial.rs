//! Uniform hash grid over cells
//!
//! Rebuilt each frame before pellet resolution. A point query visits the
//! point's grid square and its 8 neighbours, so the square size must be at least
//! the largest cell radius for every overlapping cell to be found.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::divide::state::Cell;
use crate::util::vec2::Vec2;

/// Smallest grid square (world units)
pub const MIN_GRID_SQUARE: f32 = 64.0;

/// Grid square key - (x, y) square coordinates
pub type SquareKey = (i32, i32);

/// What the grid stores per cell
#[derive(Debug, Clone, Copy)]
pub struct SpatialEntry {
    /// Index into the cell list the grid was built from
    pub index: usize,
    pub position: Vec2,
    pub radius: f32,
}

pub struct SpatialGrid {
    square_size: f32,
    inv_square_size: f32,
    squares: HashMap<SquareKey, SmallVec<[SpatialEntry; 4]>>,
}

const NEIGHBOUR_OFFSETS: [(i32, i32); 9] = [
    (-1, -1), (0, -1), (1, -1),
    (-1,  0), (0,  0), (1,  0),
    (-1,  1), (0,  1), (1,  1),
];

impl SpatialGrid {
    pub fn new(square_size: f32) -> Self {
        let square_size = square_size.max(MIN_GRID_SQUARE);
        Self {
            square_size,
            inv_square_size: 1.0 / square_size,
            squares: HashMap::with_capacity(64),
        }
    }

    /// Grid sized for the current largest cell
    pub fn build(cells: &[Cell]) -> Self {
        let max_radius = cells.iter().map(|c| c.radius()).fold(0.0, f32::max);
        let mut grid = Self::new(max_radius);
        for (index, cell) in cells.iter().enumerate() {
            grid.insert(SpatialEntry {
                index,
                position: cell.position,
                radius: cell.radius(),
            });
        }
        grid
    }

    pub fn square_size(&self) -> f32 {
        self.square_size
    }

    #[inline]
    fn square_of(&self, position: Vec2) -> SquareKey {
        (
            (position.x * self.inv_square_size).floor() as i32,
            (position.y * self.inv_square_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, entry: SpatialEntry) {
        let key = self.square_of(entry.position);
        self.squares.entry(key).or_default().push(entry);
    }

    /// Entries in the point's square and its neighbours (a superset of overlaps)
    pub fn query_point(&self, position: Vec2) -> impl Iterator<Item = &SpatialEntry> {
        let (sx, sy) = self.square_of(position);
        NEIGHBOUR_OFFSETS.iter().flat_map(move |&(dx, dy)| {
            self.squares
                .get(&(sx + dx, sy + dy))
                .into_iter()
                .flat_map(|entries| entries.iter())
        })
    }

    /// Lowest-index cell whose disc strictly contains `position`
    pub fn first_covering(&self, position: Vec2) -> Option<usize> {
        self.query_point(position)
            .filter(|e| e.position.distance_sq_to(position) < e.radius * e.radius)
            .map(|e| e.index)
            .min()
    }

    pub fn len(&self) -> usize {
        self.squares.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.squares.values().all(|s| s.is_empty())
    }
}
