/// Motion constants. Everything is per frame at 60 fps.
pub mod physics {
    /// Simulation frame rate the per-frame constants are tuned for
    pub const FRAME_RATE: u32 = 60;
    /// Isotropic friction, applied as: velocity *= FRICTION
    pub const FRICTION: f32 = 0.92;
    /// Speed limit numerator: max_speed = BASE_SPEED / radius
    pub const BASE_SPEED: f32 = 150.0;
    /// Fraction of the gap to the desired velocity closed each frame
    pub const STEER_BLEND: f32 = 0.2;
    /// Pull toward the owner's centroid once a cell may merge again
    pub const COHESION: f32 = 0.05;
}

/// Mass-related constants
pub mod mass {
    /// Starting mass for the player and every bot
    pub const STARTING: f32 = 100.0;
    /// Smallest viable cell
    pub const MINIMUM: f32 = 18.0;
    /// Radius scaling factor: radius = sqrt(mass / PI) * RADIUS_SCALE
    pub const RADIUS_SCALE: f32 = 4.0;
}

/// Splitting constants
pub mod split {
    /// A cell needs at least this much mass to split (twice the minimum viable mass)
    pub const MIN_MASS: f32 = super::mass::MINIMUM * 2.0;
    /// Frames before split siblings may merge again (~5s at 60 fps)
    pub const MERGE_COOLDOWN_FRAMES: u32 = 300;
    /// Ejected cell spawns this many parent radii from the parent's centre
    pub const EJECTION_OFFSET_FACTOR: f32 = 1.0;
    /// Ejection impulse numerator: impulse = IMPULSE / sqrt(child_mass)
    pub const IMPULSE: f32 = 120.0;
    /// Direction hints shorter than this are treated as "no direction"
    pub const DIRECTION_EPSILON: f32 = 0.01;
    /// Splits stop once an owner controls this many cells
    pub const MAX_CELLS_PER_OWNER: usize = 16;
}

/// Merge and predation constants
pub mod collision {
    /// Same-owner cells merge when distance < MERGE_DISTANCE_FACTOR * (rA + rB)
    pub const MERGE_DISTANCE_FACTOR: f32 = 0.5;
    /// Predator must be at least this many times the prey's mass
    pub const PREDATOR_RATIO: f32 = 1.15;
    /// Prey is eaten when distance < r_pred - r_prey * PREY_SHRINK_FACTOR
    pub const PREY_SHRINK_FACTOR: f32 = 0.4;
}

/// Food pellets
pub mod pellet {
    /// Mass gained per pellet
    pub const MASS: f32 = 2.0;
    /// Fixed pellet radius
    pub const RADIUS: f32 = 5.0;
    /// Pellet population the world is topped back up to
    pub const TARGET_COUNT: usize = 300;
}

/// Bot AI constants
pub mod ai {
    /// Frames between target re-evaluations
    pub const DECISION_INTERVAL_FRAMES: u32 = 30;
    /// Bots see other cells within radius * PERCEPTION_MULTIPLIER
    pub const PERCEPTION_MULTIPLIER: f32 = 10.0;
    /// Mass ratio separating threats and prey from equals
    pub const AGGRESSION_THRESHOLD: f32 = 1.15;
    /// A threat closer than radius * PANIC_MULTIPLIER makes the bot flee
    pub const PANIC_MULTIPLIER: f32 = 6.0;
    /// Opportunistic splits only happen within radius * SPLIT_CLOSING_FACTOR of the prey
    pub const SPLIT_CLOSING_FACTOR: f32 = 5.0;
    /// Per-frame chance of picking a new wander heading when idle
    pub const WANDER_PROBABILITY: f64 = 0.01;
}

/// World constants
pub mod world {
    /// Side of the square world, or diameter of the round one
    pub const SIZE: f32 = 3000.0;
}

/// Leaderboard / HUD
pub mod hud {
    /// Entries shown on the leaderboard
    pub const LEADERBOARD_SIZE: usize = 10;
    /// Camera smoothing per frame
    pub const CAMERA_LERP: f32 = 0.1;
    /// Radius at which the camera zoom is 1.0
    pub const ZOOM_REFERENCE_RADIUS: f32 = 64.0;
    pub const ZOOM_MIN: f32 = 0.3;
    pub const ZOOM_MAX: f32 = 1.5;
}

/// Mass at or below zero would break the radius/speed laws
const MASS_FLOOR: f32 = 1e-3;

/// Calculate radius from mass
#[inline]
pub fn mass_to_radius(mass: f32) -> f32 {
    debug_assert!(mass > 0.0, "cell mass must stay positive, got {mass}");
    (mass.max(MASS_FLOOR) / std::f32::consts::PI).sqrt() * mass::RADIUS_SCALE
}

/// Speed limit for a cell of the given radius; bigger is slower
#[inline]
pub fn speed_for_radius(radius: f32) -> f32 {
    debug_assert!(radius > 0.0, "cell radius must stay positive, got {radius}");
    physics::BASE_SPEED / radius.max(MASS_FLOOR)
}

/// Ejection speed of a freshly split child; heavier children fly slower
#[inline]
pub fn split_impulse(child_mass: f32) -> f32 {
    split::IMPULSE / child_mass.max(MASS_FLOOR).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mass_to_radius() {
        // sqrt(100 / PI) * 4 ~= 22.57
        let radius = mass_to_radius(100.0);
        assert!((radius - 22.567_583).abs() < 0.001);
    }

    #[test]
    fn test_radius_strictly_increases_with_mass() {
        let masses = [1.0, 18.0, 36.0, 100.0, 500.0, 5000.0];
        for pair in masses.windows(2) {
            assert!(mass_to_radius(pair[0]) < mass_to_radius(pair[1]));
        }
    }

    #[test]
    fn test_speed_decreases_with_radius() {
        let small = speed_for_radius(mass_to_radius(50.0));
        let large = speed_for_radius(mass_to_radius(500.0));
        assert!(small > large);
        assert!((speed_for_radius(10.0) - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_heavier_children_eject_slower() {
        assert!(split_impulse(50.0) > split_impulse(200.0));
        assert!((split_impulse(100.0) - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_split_threshold_is_twice_minimum() {
        assert_eq!(split::MIN_MASS, mass::MINIMUM * 2.0);
        assert!(mass::STARTING >= split::MIN_MASS);
    }

    #[test]
    fn test_merge_needs_closer_contact_than_touching() {
        assert!(collision::MERGE_DISTANCE_FACTOR < 1.0);
        assert!(collision::PREDATOR_RATIO > 1.0);
    }
}
