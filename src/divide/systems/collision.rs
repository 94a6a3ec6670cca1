//! Merge and predation passes
//!
//! Both passes scan pairs in creation order, flag losers in a bitset and only
//! remove them once the scan is over, so indices stay valid throughout. A
//! survivor's mass grows immediately and later pairs see the new radius.

use bitvec::prelude::*;
use tracing::debug;

use crate::divide::constants::collision::{MERGE_DISTANCE_FACTOR, PREDATOR_RATIO, PREY_SHRINK_FACTOR};
use crate::divide::state::{Cell, DivideWorld};
use crate::divide::systems::DivideEvent;

/// Recombine same-owner cells whose cooldowns have run out. Returns the number of merges.
pub fn resolve_merges(world: &mut DivideWorld, events: &mut Vec<DivideEvent>) -> usize {
    let count = world.cells.len();
    let mut removed = bitvec![0; count];
    let mut merges = 0;

    for i in 0..count {
        for j in (i + 1)..count {
            if removed[i] {
                break;
            }
            if removed[j] {
                continue;
            }

            let (a, b) = (&world.cells[i], &world.cells[j]);
            if a.owner != b.owner || !a.can_merge() || !b.can_merge() {
                continue;
            }
            let reach = (a.radius() + b.radius()) * MERGE_DISTANCE_FACTOR;
            if a.position.distance_sq_to(b.position) >= reach * reach {
                continue;
            }

            // Equal masses resolve to the earlier cell
            let (survivor, absorbed) = if b.mass() > a.mass() { (j, i) } else { (i, j) };
            let absorbed_mass = world.cells[absorbed].mass();
            world.cells[survivor].add_mass(absorbed_mass);
            removed.set(absorbed, true);
            merges += 1;

            let survivor_cell = &world.cells[survivor];
            debug!(
                "Cell {} merged into {} (mass now {:.1})",
                world.cells[absorbed].id,
                survivor_cell.id,
                survivor_cell.mass()
            );
            events.push(DivideEvent::Merged {
                survivor: survivor_cell.id,
                absorbed: world.cells[absorbed].id,
                by_player: survivor_cell.is_player(),
            });
        }
    }

    commit_removals(&mut world.cells, &removed);
    merges
}

/// Let bigger cells engulf smaller cells of other owners. Returns the number of cells eaten.
pub fn resolve_predation(world: &mut DivideWorld, events: &mut Vec<DivideEvent>) -> usize {
    let count = world.cells.len();
    let mut removed = bitvec![0; count];
    let mut eaten = 0;

    for i in 0..count {
        for j in (i + 1)..count {
            if removed[i] {
                break;
            }
            if removed[j] {
                continue;
            }

            let (a, b) = (&world.cells[i], &world.cells[j]);
            if a.owner == b.owner {
                continue;
            }
            let Some(a_is_predator) = predation_pair(a, b) else {
                continue;
            };
            let (predator, prey) = if a_is_predator { (i, j) } else { (j, i) };

            let prey_mass = world.cells[prey].mass();
            world.cells[predator].add_mass(prey_mass);
            removed.set(prey, true);
            eaten += 1;

            let (hunter, victim) = (&world.cells[predator], &world.cells[prey]);
            debug!(
                "{} (cell {}) ate {} (cell {}, mass {:.1})",
                hunter.name, hunter.id, victim.name, victim.id, prey_mass
            );
            events.push(DivideEvent::Eaten {
                predator: hunter.id,
                prey: victim.id,
                prey_mass,
                predator_is_player: hunter.is_player(),
                prey_is_player: victim.is_player(),
            });
        }
    }

    commit_removals(&mut world.cells, &removed);
    eaten
}

/// Decide whether `a` and `b` interact. `Some(true)` means `a` eats `b`,
/// `Some(false)` means `b` eats `a`.
fn predation_pair(a: &Cell, b: &Cell) -> Option<bool> {
    let distance = a.position.distance_to(b.position);
    if distance >= a.radius().max(b.radius()) {
        return None;
    }

    let a_eats = a.mass() >= b.mass() * PREDATOR_RATIO;
    let b_eats = b.mass() >= a.mass() * PREDATOR_RATIO;
    let (predator, prey, a_is_predator) = match (a_eats, b_eats) {
        (true, _) => (a, b, true),
        (false, true) => (b, a, false),
        // Near-equal masses never interact
        (false, false) => return None,
    };

    let engulf_distance = predator.radius() - prey.radius() * PREY_SHRINK_FACTOR;
    (distance < engulf_distance).then_some(a_is_predator)
}

fn commit_removals(cells: &mut Vec<Cell>, removed: &BitVec) {
    if removed.not_any() {
        return;
    }
    let mut index = 0;
    cells.retain(|_| {
        let keep = !removed[index];
        index += 1;
        keep
    });
}
