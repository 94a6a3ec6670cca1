//! Breadth-first searches over the bubble grid
//!
//! Both searches use 4-way adjacency only (see `BubbleGrid::neighbours`).

use std::collections::VecDeque;

use bitvec::prelude::*;

use crate::bubbles::grid::{BubbleGrid, GridPos};

/// Every bubble connected to `start` through bubbles of the same colour,
/// `start` included. Empty when `start` is empty.
pub fn find_match(grid: &BubbleGrid, start: GridPos) -> Vec<GridPos> {
    let Some(color) = grid.get(start).map(|b| b.color) else {
        return Vec::new();
    };

    let mut visited = bitvec![0; grid.rows() * grid.columns()];
    let mut queue = VecDeque::new();
    let mut group = Vec::new();

    if let Some(index) = grid.index(start) {
        visited.set(index, true);
    }
    queue.push_back(start);

    while let Some(pos) = queue.pop_front() {
        group.push(pos);
        for next in grid.neighbours(pos) {
            let Some(index) = grid.index(next) else {
                continue;
            };
            if visited[index] {
                continue;
            }
            if grid.get(next).map_or(false, |b| b.color == color) {
                visited.set(index, true);
                queue.push_back(next);
            }
        }
    }

    group
}

/// Slots reachable from any bubble in the top row (bit set = hanging from the ceiling)
pub fn ceiling_connected(grid: &BubbleGrid) -> BitVec {
    let mut connected = bitvec![0; grid.rows() * grid.columns()];
    let mut queue = VecDeque::new();

    if grid.rows() == 0 {
        return connected;
    }
    for col in 0..grid.columns() {
        let pos = GridPos::new(0, col);
        if let (true, Some(index)) = (grid.is_occupied(pos), grid.index(pos)) {
            connected.set(index, true);
            queue.push_back(pos);
        }
    }

    while let Some(pos) = queue.pop_front() {
        for next in grid.neighbours(pos) {
            let Some(index) = grid.index(next) else {
                continue;
            };
            if !connected[index] && grid.is_occupied(next) {
                connected.set(index, true);
                queue.push_back(next);
            }
        }
    }

    connected
}

/// Occupied slots with no path to the top row
pub fn floating(grid: &BubbleGrid) -> Vec<GridPos> {
    let connected = ceiling_connected(grid);
    grid.iter()
        .map(|(pos, _)| pos)
        .filter(|&pos| grid.index(pos).map_or(false, |i| !connected[i]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bubbles::state::{Bubble, BubbleColor};
    use crate::util::vec2::Vec2;

    /// Build a grid from rows of colour letters ('.' = empty)
    fn grid_from(rows: &[&str]) -> BubbleGrid {
        let columns = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut grid = BubbleGrid::new(rows.len() + 2, columns);
        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                let color = match ch {
                    'R' => BubbleColor::Red,
                    'G' => BubbleColor::Green,
                    'B' => BubbleColor::Blue,
                    'Y' => BubbleColor::Yellow,
                    _ => continue,
                };
                let bubble = Bubble::in_flight(0, Vec2::ZERO, Vec2::ZERO, color);
                grid.place(GridPos::new(row, col), bubble).unwrap();
            }
        }
        grid
    }

    #[test]
    fn test_match_collects_whole_component() {
        let grid = grid_from(&["RRG", "GRB", "RRR"]);
        let mut group = find_match(&grid, GridPos::new(0, 0));
        group.sort();
        assert_eq!(group.len(), 6);
        assert!(group.contains(&GridPos::new(2, 0)));
        assert!(!group.contains(&GridPos::new(0, 2)));
    }

    #[test]
    fn test_diagonals_do_not_connect() {
        let grid = grid_from(&["R.", ".R"]);
        assert_eq!(find_match(&grid, GridPos::new(0, 0)).len(), 1);
    }

    #[test]
    fn test_match_from_empty_slot() {
        let grid = grid_from(&["R."]);
        assert!(find_match(&grid, GridPos::new(0, 1)).is_empty());
    }

    #[test]
    fn test_ceiling_connectivity_ignores_color() {
        let grid = grid_from(&["R...", "G...", "B.Y.", "...."]);
        let connected = ceiling_connected(&grid);
        assert!(connected[0]);
        assert!(connected[4]);
        assert!(connected[8]);
        // Yellow at (2, 2) hangs from nothing
        assert!(!connected[10]);
        assert_eq!(floating(&grid), vec![GridPos::new(2, 2)]);
    }

    #[test]
    fn test_nothing_floats_on_a_solid_board() {
        let grid = grid_from(&["RGBY", "R..Y", "RRRY"]);
        assert!(floating(&grid).is_empty());
    }

    #[test]
    fn test_everything_floats_without_a_top_row() {
        let grid = grid_from(&["....", ".RG.", "..B."]);
        assert_eq!(floating(&grid).len(), 3);
    }
}
