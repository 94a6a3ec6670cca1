use rustc_hash::FxHashMap;
use tracing::debug;

use crate::divide::constants::physics::{COHESION, FRICTION, STEER_BLEND};
use crate::divide::constants::split::MAX_CELLS_PER_OWNER;
use crate::divide::state::{Cell, CellId, DivideWorld, Owner};
use crate::divide::systems::DivideEvent;
use crate::util::vec2::Vec2;

/// Advance every cell one step (cooldown, friction, integrate, boundary)
pub fn update(world: &mut DivideWorld) {
    let boundary = world.boundary;
    for cell in &mut world.cells {
        cell.update(&boundary, FRICTION);
    }
    world.frame += 1;
}

/// Blend a cell's velocity toward `desired` and clamp it to the cell's speed limit.
///
/// A cell already coasting above its limit (fresh split impulse) is left alone so
/// friction can bleed the extra speed off.
pub fn steer(cell: &mut Cell, desired: Vec2) {
    let max_speed = cell.max_speed();
    if cell.velocity.length_sq() > max_speed * max_speed {
        return;
    }
    cell.velocity = cell.velocity.lerp(desired, STEER_BLEND).clamp_length(max_speed);
}

/// Steer every player cell along the joystick and handle the split trigger
pub fn apply_player_input(
    world: &mut DivideWorld,
    joystick: Vec2,
    split: bool,
    events: &mut Vec<DivideEvent>,
) {
    let direction = joystick.clamp_length(1.0);
    for cell in world.cells.iter_mut().filter(|c| c.is_player()) {
        let desired = direction * cell.max_speed();
        steer(cell, desired);
    }

    if split {
        split_owner(world, Owner::PLAYER, direction, events);
    }
}

/// Split every cell of `owner` that is big enough, without exceeding the per-owner cap.
/// Returns the number of new cells.
pub fn split_owner(
    world: &mut DivideWorld,
    owner: Owner,
    direction: Vec2,
    events: &mut Vec<DivideEvent>,
) -> usize {
    let ids: Vec<CellId> = world.cells_of(owner).map(|c| c.id).collect();
    let mut count = ids.len();
    let mut created = 0;

    for id in ids {
        if count >= MAX_CELLS_PER_OWNER {
            debug!("Owner {:?} at the cell cap, skipping remaining splits", owner);
            break;
        }
        if let Some(child) = world.split_cell(id, direction) {
            events.push(DivideEvent::Split {
                parent: id,
                child,
                by_player: owner.is_player(),
            });
            count += 1;
            created += 1;
        }
    }

    created
}

/// Pull cells that may merge again toward their owner's centroid
pub fn apply_cohesion(world: &mut DivideWorld) {
    // owner -> (mass-weighted position sum, total mass, cell count)
    let mut groups: FxHashMap<Owner, (Vec2, f32, usize)> = FxHashMap::default();
    for cell in &world.cells {
        let entry = groups.entry(cell.owner).or_insert((Vec2::ZERO, 0.0, 0));
        entry.0 += cell.position * cell.mass();
        entry.1 += cell.mass();
        entry.2 += 1;
    }

    for cell in world.cells.iter_mut().filter(|c| c.can_merge()) {
        let Some(&(weighted, total, count)) = groups.get(&cell.owner) else {
            continue;
        };
        if count < 2 || total <= 0.0 {
            continue;
        }
        let centroid = weighted / total;
        if let Some(pull) = (centroid - cell.position).try_normalize(1e-3) {
            cell.velocity += pull * COHESION;
        }
    }
}

/// Total kinetic energy of the world (diagnostics, benches)
pub fn kinetic_energy(world: &DivideWorld) -> f32 {
    world
        .cells
        .iter()
        .map(|c| 0.5 * c.mass() * c.velocity.length_sq())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::divide::constants::{physics, split};
    use crate::divide::state::{Boundary, PLAYER_COLOR};

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn create_world() -> DivideWorld {
        DivideWorld::new(Boundary::square(3000.0), 0, Some(11))
    }

    #[test]
    fn test_update_advances_frame_and_applies_friction() {
        let mut world = create_world();
        let id = world.spawn_player("p".into());
        world.get_cell_mut(id).unwrap().velocity = Vec2::new(2.0, 0.0);

        update(&mut world);

        let cell = world.get_cell(id).unwrap();
        assert_eq!(world.frame, 1);
        assert!(approx_eq(cell.velocity.x, 2.0 * physics::FRICTION));
        assert!(approx_eq(cell.position.x, 2.0 * physics::FRICTION));
    }

    #[test]
    fn test_steer_respects_speed_limit() {
        let mut cell = Cell::new(1, Owner::PLAYER, Vec2::ZERO, 100.0, PLAYER_COLOR, "p".into());
        let max_speed = cell.max_speed();
        for _ in 0..100 {
            steer(&mut cell, Vec2::new(1000.0, 0.0));
        }
        assert!(cell.velocity.length() <= max_speed + 1e-4);
        assert!(cell.velocity.x > 0.0);
    }

    #[test]
    fn test_steer_leaves_coasting_cells_alone() {
        let mut cell = Cell::new(1, Owner::PLAYER, Vec2::ZERO, 100.0, PLAYER_COLOR, "p".into());
        let fast = Vec2::new(cell.max_speed() * 3.0, 0.0);
        cell.velocity = fast;
        steer(&mut cell, Vec2::new(0.0, 1.0));
        assert_eq!(cell.velocity, fast);
    }

    #[test]
    fn test_bigger_cells_steer_slower() {
        let mut small = Cell::new(1, Owner::PLAYER, Vec2::ZERO, 50.0, PLAYER_COLOR, "s".into());
        let mut big = Cell::new(2, Owner::bot(1), Vec2::ZERO, 800.0, PLAYER_COLOR, "b".into());
        for _ in 0..60 {
            let desired = Vec2::new(small.max_speed(), 0.0);
            steer(&mut small, desired);
            let desired = Vec2::new(big.max_speed(), 0.0);
            steer(&mut big, desired);
        }
        assert!(small.velocity.length() > big.velocity.length());
    }

    #[test]
    fn test_joystick_magnitude_is_clamped() {
        let mut world = create_world();
        let id = world.spawn_player("p".into());
        let mut events = Vec::new();
        for _ in 0..200 {
            apply_player_input(&mut world, Vec2::new(50.0, 0.0), false, &mut events);
        }
        let cell = world.get_cell(id).unwrap();
        assert!(cell.velocity.length() <= cell.max_speed() + 1e-4);
        assert!(events.is_empty());
    }

    #[test]
    fn test_split_trigger_splits_every_player_cell() {
        let mut world = create_world();
        world.spawn_cell(Owner::PLAYER, Vec2::ZERO, 200.0, PLAYER_COLOR, "p".into());
        world.spawn_cell(Owner::PLAYER, Vec2::new(300.0, 0.0), 200.0, PLAYER_COLOR, "p".into());
        world.spawn_cell(Owner::bot(1), Vec2::new(-300.0, 0.0), 200.0, PLAYER_COLOR, "b".into());

        let mut events = Vec::new();
        apply_player_input(&mut world, Vec2::new(0.0, 1.0), true, &mut events);

        assert_eq!(world.player_cells().count(), 4);
        assert_eq!(world.bot_cells().count(), 1);
        assert_eq!(events.len(), 2);
        assert!(approx_eq(world.player_mass(), 400.0));
    }

    #[test]
    fn test_split_respects_cell_cap() {
        let mut world = create_world();
        for i in 0..split::MAX_CELLS_PER_OWNER - 1 {
            world.spawn_cell(Owner::PLAYER, Vec2::new(i as f32 * 50.0, 0.0), 100.0, PLAYER_COLOR, "p".into());
        }
        let mut events = Vec::new();
        let created = split_owner(&mut world, Owner::PLAYER, Vec2::new(1.0, 0.0), &mut events);
        assert_eq!(created, 1);
        assert_eq!(world.player_cells().count(), split::MAX_CELLS_PER_OWNER);
    }

    #[test]
    fn test_split_of_small_cells_is_noop() {
        let mut world = create_world();
        world.spawn_cell(Owner::PLAYER, Vec2::ZERO, split::MIN_MASS - 1.0, PLAYER_COLOR, "p".into());
        let mut events = Vec::new();
        apply_player_input(&mut world, Vec2::ZERO, true, &mut events);
        assert_eq!(world.cells.len(), 1);
        assert!(events.is_empty());
    }

    #[test]
    fn test_cohesion_pulls_siblings_together() {
        let mut world = create_world();
        let left = world.spawn_cell(Owner::PLAYER, Vec2::new(-100.0, 0.0), 100.0, PLAYER_COLOR, "p".into());
        let right = world.spawn_cell(Owner::PLAYER, Vec2::new(100.0, 0.0), 100.0, PLAYER_COLOR, "p".into());
        let lonely = world.spawn_cell(Owner::bot(1), Vec2::new(500.0, 0.0), 100.0, PLAYER_COLOR, "b".into());

        apply_cohesion(&mut world);

        assert!(world.get_cell(left).unwrap().velocity.x > 0.0);
        assert!(world.get_cell(right).unwrap().velocity.x < 0.0);
        assert_eq!(world.get_cell(lonely).unwrap().velocity, Vec2::ZERO);
    }

    #[test]
    fn test_cohesion_waits_for_cooldown() {
        let mut world = create_world();
        let left = world.spawn_cell(Owner::PLAYER, Vec2::new(-100.0, 0.0), 100.0, PLAYER_COLOR, "p".into());
        world.spawn_cell(Owner::PLAYER, Vec2::new(100.0, 0.0), 100.0, PLAYER_COLOR, "p".into());
        world.get_cell_mut(left).unwrap().merge_cooldown = 10;

        apply_cohesion(&mut world);

        assert_eq!(world.get_cell(left).unwrap().velocity, Vec2::ZERO);
    }

    #[test]
    fn test_kinetic_energy() {
        let mut world = create_world();
        let id = world.spawn_player("p".into());
        assert_eq!(kinetic_energy(&world), 0.0);
        world.get_cell_mut(id).unwrap().velocity = Vec2::new(2.0, 0.0);
        assert!(approx_eq(kinetic_energy(&world), 200.0));
    }
}
