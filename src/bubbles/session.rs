//! Magic-bubbles session
//!
//! One shot in flight at a time. A shot that touches the ceiling or a fixed
//! bubble snaps into the grid, pops its same-colour group when it is big
//! enough, and drops whatever lost its path to the ceiling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::audio::SoundCue;
use crate::bubbles::constants::geometry::{
    CAPACITY_ROWS, COLUMNS, DIAMETER, FIELD_HEIGHT, FIELD_WIDTH, LAUNCHER_Y, LOSE_LINE_Y, RADIUS,
};
use crate::bubbles::constants::{motion, scoring};
use crate::bubbles::grid::{BubbleGrid, GridPos};
use crate::bubbles::matching::{find_match, floating};
use crate::bubbles::state::{clamp_color_count, Bubble, BubbleColor, BubbleId};
use crate::difficulty::{BubbleSettings, Difficulty};
use crate::frame::input::FrameInput;
use crate::frame::{CueSource, FrameReport, GameOutcome, Simulation};
use crate::progress::GameKind;
use crate::render::{Camera, Color, DrawCommand, RenderSurface, TextAlign};
use crate::util::vec2::Vec2;

/// Player controls for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BubbleInput {
    /// Radians from straight up, negative aims left. Clamped to the aim arc.
    pub aim: f32,
    /// Fire the queued bubble
    pub launch: bool,
}

impl FrameInput for BubbleInput {
    fn clear_triggers(&mut self) {
        self.launch = false;
    }
}

/// Something that happened during a magic-bubbles frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BubbleEvent {
    Shot { color: BubbleColor },
    Fixed { pos: GridPos, color: BubbleColor },
    /// A same-colour group was removed
    Popped { count: usize, points: u64 },
    /// Bubbles cut off from the ceiling started falling
    Dropped { count: usize, points: u64 },
    /// The shot could not be placed
    Overflow,
}

impl CueSource for BubbleEvent {
    fn cue(&self) -> Option<SoundCue> {
        match self {
            BubbleEvent::Shot { .. } => Some(SoundCue::Shoot),
            BubbleEvent::Popped { .. } => Some(SoundCue::Pop),
            _ => None,
        }
    }
}

/// Everything a magic-bubbles session mutates
#[derive(Debug, Clone)]
pub struct BubbleGame {
    pub grid: BubbleGrid,
    /// At most one bubble in flight
    pub shooting: Option<Bubble>,
    /// Colour of the bubble that fires next
    pub next: BubbleColor,
    pub falling: Vec<Bubble>,
    pub score: u64,
    pub is_game_over: bool,
    pub is_game_won: bool,
    pub settings: BubbleSettings,
}

impl BubbleGame {
    pub fn is_finished(&self) -> bool {
        self.is_game_over || self.is_game_won
    }
}

pub struct BubbleSession {
    game: BubbleGame,
    difficulty: Difficulty,
    rng: StdRng,
    aim: f32,
    frames: u64,
    time_limit_frames: u64,
    frame_rate: u32,
    next_id: BubbleId,
}

impl BubbleSession {
    /// Fresh board with the difficulty's pre-filled rows
    pub fn new(difficulty: Difficulty, seed: Option<u64>, frame_rate: u32) -> Self {
        let settings = difficulty.bubble_settings();
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut grid = BubbleGrid::new(CAPACITY_ROWS, COLUMNS);
        let rows = settings.rows.min(CAPACITY_ROWS);
        let mut id = 1;
        for row in 0..rows {
            for col in 0..COLUMNS {
                let color = BubbleColor::random(&mut rng, settings.color_count);
                let bubble = Bubble::in_flight(id, Vec2::ZERO, Vec2::ZERO, color);
                id += 1;
                let placed = grid.place(GridPos::new(row, col), bubble);
                debug_assert!(placed.is_ok(), "fresh grid slot ({}, {}) was taken", row, col);
            }
        }

        info!(
            "Bubble session ready: {} rows, {} colours, {}s",
            rows,
            clamp_color_count(settings.color_count),
            settings.time_limit_secs
        );
        Self::from_parts(grid, settings, difficulty, rng, frame_rate)
    }

    /// Session over a prepared grid
    pub fn with_grid(
        grid: BubbleGrid,
        settings: BubbleSettings,
        difficulty: Difficulty,
        seed: Option<u64>,
        frame_rate: u32,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::from_parts(grid, settings, difficulty, rng, frame_rate)
    }

    /// Queue the first bubble from `rng` as it stands after any board generation
    fn from_parts(
        grid: BubbleGrid,
        mut settings: BubbleSettings,
        difficulty: Difficulty,
        mut rng: StdRng,
        frame_rate: u32,
    ) -> Self {
        if settings.color_count != clamp_color_count(settings.color_count) {
            warn!(
                "Colour count {} outside the palette, using {}",
                settings.color_count,
                clamp_color_count(settings.color_count)
            );
        }
        if !settings.initial_speed.is_finite() || settings.initial_speed < motion::MIN_LAUNCH_SPEED {
            warn!(
                "Launch speed {} would never land, using {}",
                settings.initial_speed,
                motion::MIN_LAUNCH_SPEED
            );
            settings.initial_speed = motion::MIN_LAUNCH_SPEED;
        }
        let next = BubbleColor::random(&mut rng, settings.color_count);
        let next_id = grid.iter().map(|(_, b)| b.id).max().unwrap_or(0) + 1;

        Self {
            game: BubbleGame {
                grid,
                shooting: None,
                next,
                falling: Vec::new(),
                score: 0,
                is_game_over: false,
                is_game_won: false,
                settings,
            },
            difficulty,
            rng,
            aim: 0.0,
            frames: 0,
            time_limit_frames: settings.time_limit_secs as u64 * frame_rate.max(1) as u64,
            frame_rate: frame_rate.max(1),
            next_id,
        }
    }

    pub fn game(&self) -> &BubbleGame {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut BubbleGame {
        &mut self.game
    }

    pub fn aim(&self) -> f32 {
        self.aim
    }

    pub fn launcher() -> Vec2 {
        Vec2::new(FIELD_WIDTH * 0.5, LAUNCHER_Y)
    }

    /// Whole seconds left on the clock
    pub fn time_remaining_secs(&self) -> u64 {
        let left = self.time_limit_frames.saturating_sub(self.frames);
        (left + self.frame_rate as u64 - 1) / self.frame_rate as u64
    }

    /// Point the launcher; the angle is clamped to the aim arc
    pub fn set_aim(&mut self, angle: f32) {
        if angle.is_finite() {
            self.aim = angle.clamp(-motion::MAX_AIM_ANGLE, motion::MAX_AIM_ANGLE);
        }
    }

    /// Fire the queued bubble. No-op while a shot is in flight or the game is over.
    pub fn launch(&mut self) -> Option<BubbleEvent> {
        if self.game.shooting.is_some() || self.game.is_finished() {
            return None;
        }

        let color = self.game.next;
        let velocity = Vec2::new(self.aim.sin(), -self.aim.cos()) * self.game.settings.initial_speed;
        self.game.shooting = Some(Bubble::in_flight(self.next_id, Self::launcher(), velocity, color));
        self.next_id += 1;
        self.game.next = BubbleColor::random(&mut self.rng, self.game.settings.color_count);

        debug!("Launched {} bubble at {:.2} rad", color.as_str(), self.aim);
        Some(BubbleEvent::Shot { color })
    }

    /// Move the shot in sub-steps no longer than half a radius; fix it on contact
    fn advance_shot(&mut self, events: &mut Vec<BubbleEvent>) {
        let Some(mut shot) = self.game.shooting.take() else {
            return;
        };

        let distance = shot.velocity.length();
        let steps = ((distance / motion::MAX_SUBSTEP).ceil() as usize).max(1);
        let step = shot.velocity / steps as f32;

        for _ in 0..steps {
            shot.position += step;
            bounce_off_walls(&mut shot);

            let hit_ceiling = shot.position.y <= RADIUS;
            let hit_bubble = self
                .game
                .grid
                .iter()
                .any(|(_, fixed)| fixed.position.distance_sq_to(shot.position) < DIAMETER * DIAMETER);
            if hit_ceiling || hit_bubble {
                self.fix_shot(shot, events);
                return;
            }
        }

        self.game.shooting = Some(shot);
    }

    /// Snap the shot into the grid and resolve matches, or end the game on overflow
    fn fix_shot(&mut self, shot: Bubble, events: &mut Vec<BubbleEvent>) {
        let Some(pos) = self.game.grid.fixation_slot(shot.position) else {
            info!("Grid overflow at {:?}, game over", shot.position);
            self.game.is_game_over = true;
            events.push(BubbleEvent::Overflow);
            return;
        };

        let color = shot.color;
        if self.game.grid.place(pos, shot).is_err() {
            // fixation_slot only returns free slots
            self.game.is_game_over = true;
            events.push(BubbleEvent::Overflow);
            return;
        }
        events.push(BubbleEvent::Fixed { pos, color });
        self.resolve_match(pos, events);
    }

    fn resolve_match(&mut self, pos: GridPos, events: &mut Vec<BubbleEvent>) {
        let group = find_match(&self.game.grid, pos);
        if group.len() < scoring::MATCH_MIN {
            return;
        }

        for &member in &group {
            self.game.grid.take(member);
        }
        let points = group.len() as u64 * scoring::POP;
        self.game.score += points;
        debug!("Popped {} bubbles (+{})", group.len(), points);
        events.push(BubbleEvent::Popped {
            count: group.len(),
            points,
        });

        let loose = floating(&self.game.grid);
        if loose.is_empty() {
            return;
        }
        for member in &loose {
            if let Some(mut bubble) = self.game.grid.take(*member) {
                let lateral = self
                    .rng
                    .gen_range(-motion::DROP_LATERAL_SPEED..=motion::DROP_LATERAL_SPEED);
                bubble.start_falling(Vec2::new(lateral, 0.0));
                self.game.falling.push(bubble);
            }
        }
        let points = loose.len() as u64 * scoring::DROP;
        self.game.score += points;
        debug!("Dropped {} floating bubbles (+{})", loose.len(), points);
        events.push(BubbleEvent::Dropped {
            count: loose.len(),
            points,
        });
    }

    /// Gravity on dropped bubbles; forget them once they leave the field
    fn advance_falling(&mut self) {
        for bubble in &mut self.game.falling {
            bubble.velocity.y += motion::FALL_GRAVITY;
            bubble.position += bubble.velocity;
        }
        self.game
            .falling
            .retain(|b| b.position.y - b.radius() <= FIELD_HEIGHT);
    }

    /// Win on an empty board, lose on the lose line or the clock
    fn check_terminal(&mut self) {
        if self.game.is_finished() {
            return;
        }
        if self.game.grid.is_empty() {
            info!("Board cleared, score {}", self.game.score);
            self.game.is_game_won = true;
            return;
        }
        if self.game.grid.lowest_edge().map_or(false, |y| y > LOSE_LINE_Y) {
            info!("Bubbles crossed the lose line");
            self.game.is_game_over = true;
            return;
        }
        if self.frames >= self.time_limit_frames {
            info!("Time is up");
            self.game.is_game_over = true;
        }
    }

    fn draw(&self, surface: &mut dyn RenderSurface) {
        let viewport = surface.viewport();
        surface.draw(DrawCommand::Clear {
            color: Color::BACKGROUND,
        });

        // Fit the whole field in the viewport
        let scale = (viewport.x / FIELD_WIDTH).min(viewport.y / FIELD_HEIGHT);
        surface.draw(DrawCommand::PushCamera {
            camera: Camera {
                center: Vec2::new(FIELD_WIDTH * 0.5, FIELD_HEIGHT * 0.5),
                scale,
            },
        });

        surface.draw(DrawCommand::Line {
            from: Vec2::new(0.0, LOSE_LINE_Y),
            to: Vec2::new(FIELD_WIDTH, LOSE_LINE_Y),
            color: Color::rgba(244, 67, 54, 128),
            width: 2.0,
        });

        let fixed = self.game.grid.iter().map(|(_, b)| b);
        for bubble in fixed.chain(&self.game.falling).chain(&self.game.shooting) {
            draw_bubble(surface, bubble.position, bubble.color);
        }

        if self.game.shooting.is_none() && !self.game.is_finished() {
            self.draw_aim_guide(surface);
            draw_bubble(surface, Self::launcher(), self.game.next);
        }
        surface.draw(DrawCommand::PopCamera);

        surface.draw(DrawCommand::Text {
            position: Vec2::new(16.0, 28.0),
            text: format!("Score: {}", self.game.score),
            size: 20.0,
            color: Color::BLACK,
            align: TextAlign::Left,
        });
        let secs = self.time_remaining_secs();
        surface.draw(DrawCommand::Text {
            position: Vec2::new(viewport.x - 16.0, 28.0),
            text: format!("Time: {}:{:02}", secs / 60, secs % 60),
            size: 20.0,
            color: Color::BLACK,
            align: TextAlign::Right,
        });
    }

    /// Dashed line along the aim, reflecting off the side walls
    fn draw_aim_guide(&self, surface: &mut dyn RenderSurface) {
        const DASH: f32 = 10.0;
        const GAP: f32 = 10.0;
        const MAX_DASHES: usize = 30;

        let mut direction = Vec2::new(self.aim.sin(), -self.aim.cos());
        let mut point = Self::launcher();
        for _ in 0..MAX_DASHES {
            let end = point + direction * DASH;
            surface.draw(DrawCommand::Line {
                from: point,
                to: end,
                color: Color::rgba(0, 0, 0, 80),
                width: 2.0,
            });
            point = end + direction * GAP;
            if point.x < RADIUS || point.x > FIELD_WIDTH - RADIUS {
                direction.x = -direction.x;
            }
            if point.y <= RADIUS {
                break;
            }
        }
    }
}

fn bounce_off_walls(shot: &mut Bubble) {
    if shot.position.x < RADIUS {
        shot.position.x = RADIUS;
        shot.velocity.x = shot.velocity.x.abs();
    } else if shot.position.x > FIELD_WIDTH - RADIUS {
        shot.position.x = FIELD_WIDTH - RADIUS;
        shot.velocity.x = -shot.velocity.x.abs();
    }
}

fn draw_bubble(surface: &mut dyn RenderSurface, center: Vec2, color: BubbleColor) {
    let fill = color.fill();
    surface.draw(DrawCommand::Circle {
        center,
        radius: RADIUS,
        fill,
        stroke: Some(fill.darken(0.75)),
    });
}

impl Simulation for BubbleSession {
    type Input = BubbleInput;
    type Event = BubbleEvent;

    fn game(&self) -> GameKind {
        GameKind::Bubbles
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn entity_count(&self) -> usize {
        self.game.grid.len() + self.game.falling.len() + usize::from(self.game.shooting.is_some())
    }

    fn frame(&mut self, input: &BubbleInput, surface: &mut dyn RenderSurface) -> FrameReport<BubbleEvent> {
        let mut events = Vec::new();

        if !self.game.is_finished() {
            self.set_aim(input.aim);
            if input.launch {
                events.extend(self.launch());
            }

            self.advance_shot(&mut events);
            self.advance_falling();
            self.frames += 1;
            self.check_terminal();
        }

        self.draw(surface);

        let mut report = FrameReport::running(events);
        if self.game.is_finished() {
            report.outcome = Some(GameOutcome::Bubbles {
                won: self.game.is_game_won,
                score: self.game.score,
            });
        }
        report
    }
}
