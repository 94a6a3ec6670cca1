use tracing::trace;

use crate::divide::constants::pellet;
use crate::divide::spatial::SpatialGrid;
use crate::divide::state::DivideWorld;
use crate::divide::systems::DivideEvent;

/// Let cells eat the pellets under them. Returns the number of pellets eaten.
///
/// A pellet goes to the lowest-index cell whose disc contains it. Mass gains
/// are applied after the scan so one frame's growth doesn't change who wins later pellets.
pub fn resolve_consumption(world: &mut DivideWorld, events: &mut Vec<DivideEvent>) -> usize {
    if world.cells.is_empty() || world.pellets.is_empty() {
        return 0;
    }

    let grid = SpatialGrid::build(&world.cells);
    let mut eaten_by = vec![0u32; world.cells.len()];
    let before = world.pellets.len();

    world.pellets.retain(|p| match grid.first_covering(p.position) {
        Some(index) => {
            eaten_by[index] += 1;
            false
        }
        None => true,
    });

    for (cell, &count) in world.cells.iter_mut().zip(&eaten_by) {
        if count == 0 {
            continue;
        }
        cell.add_mass(count as f32 * pellet::MASS);
        events.push(DivideEvent::Collected {
            cell: cell.id,
            pellets: count,
            by_player: cell.is_player(),
        });
    }

    before - world.pellets.len()
}

/// Top the pellet population back up to the world's target. Returns how many were spawned.
pub fn replenish(world: &mut DivideWorld) -> usize {
    let missing = world.pellet_target.saturating_sub(world.pellets.len());
    for _ in 0..missing {
        world.spawn_pellet();
    }
    if missing > 0 {
        trace!("Spawned {} pellets", missing);
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::divide::constants::mass;
    use crate::divide::state::{Boundary, Owner, Pellet, PALETTE, PLAYER_COLOR};
    use crate::util::vec2::Vec2;

    fn create_world(target: usize) -> DivideWorld {
        DivideWorld::new(Boundary::square(2000.0), target, Some(3))
    }

    fn pellet_at(x: f32, y: f32) -> Pellet {
        Pellet {
            position: Vec2::new(x, y),
            color: PALETTE[0],
        }
    }

    #[test]
    fn test_pellet_under_cell_is_eaten() {
        let mut world = create_world(0);
        let id = world.spawn_player("p".into());
        world.pellets.push(pellet_at(0.0, 0.0));
        world.pellets.push(pellet_at(500.0, 500.0));
        let mut events = Vec::new();

        assert_eq!(resolve_consumption(&mut world, &mut events), 1);

        assert_eq!(world.pellets.len(), 1);
        let cell = world.get_cell(id).unwrap();
        assert_eq!(cell.mass(), mass::STARTING + pellet::MASS);
        assert_eq!(
            events,
            vec![DivideEvent::Collected {
                cell: id,
                pellets: 1,
                by_player: true
            }]
        );
    }

    #[test]
    fn test_overlapping_cells_first_one_wins() {
        let mut world = create_world(0);
        let first = world.spawn_cell(Owner::bot(1), Vec2::new(0.0, 0.0), 100.0, PLAYER_COLOR, "a".into());
        let second = world.spawn_cell(Owner::bot(2), Vec2::new(4.0, 0.0), 100.0, PLAYER_COLOR, "b".into());
        world.pellets.push(pellet_at(2.0, 0.0));
        let mut events = Vec::new();

        resolve_consumption(&mut world, &mut events);

        assert_eq!(world.get_cell(first).unwrap().mass(), 102.0);
        assert_eq!(world.get_cell(second).unwrap().mass(), 100.0);
    }

    #[test]
    fn test_several_pellets_one_event() {
        let mut world = create_world(0);
        let id = world.spawn_player("p".into());
        for i in 0..5 {
            world.pellets.push(pellet_at(i as f32, 0.0));
        }
        let mut events = Vec::new();

        assert_eq!(resolve_consumption(&mut world, &mut events), 5);
        assert_eq!(world.get_cell(id).unwrap().mass(), mass::STARTING + 10.0);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_no_cells_no_consumption() {
        let mut world = create_world(0);
        world.pellets.push(pellet_at(0.0, 0.0));
        let mut events = Vec::new();
        assert_eq!(resolve_consumption(&mut world, &mut events), 0);
        assert_eq!(world.pellets.len(), 1);
    }

    #[test]
    fn test_replenish_reaches_target_without_overshoot() {
        let mut world = create_world(50);
        assert_eq!(replenish(&mut world), 50);
        assert_eq!(world.pellets.len(), 50);
        assert_eq!(replenish(&mut world), 0);

        world.pellets.truncate(20);
        assert_eq!(replenish(&mut world), 30);
        assert_eq!(world.pellets.len(), 50);
    }

    #[test]
    fn test_replenished_pellets_are_inside_the_world() {
        let mut world = DivideWorld::new(Boundary::round(800.0), 200, Some(9));
        replenish(&mut world);
        for p in &world.pellets {
            assert!(world.boundary.contains(p.position, p.radius()));
        }
    }
}
