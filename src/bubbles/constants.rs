/// Field geometry (px)
pub mod geometry {
    pub const RADIUS: f32 = 20.0;
    pub const DIAMETER: f32 = RADIUS * 2.0;
    pub const COLUMNS: usize = 10;
    pub const FIELD_WIDTH: f32 = COLUMNS as f32 * DIAMETER;
    pub const FIELD_HEIGHT: f32 = 640.0;
    /// Grid rows that fit in the field
    pub const CAPACITY_ROWS: usize = (FIELD_HEIGHT / DIAMETER) as usize;
    /// A fixed bubble whose bottom edge passes this line loses the game
    pub const LOSE_LINE_Y: f32 = 560.0;
    /// Where shots start
    pub const LAUNCHER_Y: f32 = FIELD_HEIGHT - RADIUS;
}

/// Points
pub mod scoring {
    /// Per bubble removed by a match
    pub const POP: u64 = 10;
    /// Per bubble dropped because it lost its path to the ceiling
    pub const DROP: u64 = 5;
    /// Smallest same-colour group that pops
    pub const MATCH_MIN: usize = 3;
}

/// Shot and falling motion (per frame at 60 fps)
pub mod motion {
    /// Aim is limited to this many radians either side of straight up (80 degrees)
    pub const MAX_AIM_ANGLE: f32 = 80.0 * std::f32::consts::PI / 180.0;
    /// No single flight sub-step moves further than this
    pub const MAX_SUBSTEP: f32 = super::geometry::RADIUS * 0.5;
    pub const FALL_GRAVITY: f32 = 0.5;
    /// Slowest usable launch speed; lower or non-finite settings are raised to it
    pub const MIN_LAUNCH_SPEED: f32 = 1.0;
    /// Dropped bubbles get a random sideways nudge up to this speed
    pub const DROP_LATERAL_SPEED: f32 = 1.5;
}

/// Palette size; colour counts are clamped to this
pub const PALETTE_SIZE: usize = 6;
