//! Divide-io session
//!
//! Owns the world and the bot brains and runs the per-frame pipeline:
//! input, ai + physics, merges, predation, pellets, derived state, draw,
//! terminal check.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::difficulty::Difficulty;
use crate::divide::constants::hud;
use crate::divide::leaderboard::Leaderboard;
use crate::divide::state::{Boundary, DivideWorld, Owner};
use crate::divide::systems::ai::{generate_bot_name, AiManager, AiPersonality};
use crate::divide::systems::{collision, pellets, physics, DivideEvent};
use crate::frame::input::FrameInput;
use crate::frame::{FrameReport, GameOutcome, Simulation};
use crate::progress::GameKind;
use crate::render::{Camera, Color, DrawCommand, RenderSurface, TextAlign};
use crate::util::vec2::Vec2;

/// Player controls for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DivideInput {
    /// Movement direction, magnitude 0..=1 (longer vectors are clamped)
    pub joystick: Vec2,
    /// Split every player cell this frame
    pub split: bool,
}

impl FrameInput for DivideInput {
    fn clear_triggers(&mut self) {
        self.split = false;
    }
}

/// One cell on the minimap, in world-normalised coordinates (0..1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MinimapDot {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub is_player: bool,
}

const MINIMAP_SIZE: f32 = 120.0;
const HUD_MARGIN: f32 = 16.0;

pub struct DivideSession {
    world: DivideWorld,
    ai: AiManager,
    difficulty: Difficulty,
    camera: Camera,
    leaderboard: Leaderboard,
    minimap: Vec<MinimapDot>,
    peak_player_mass: f32,
}

impl DivideSession {
    /// Fresh session: one player at the centre, difficulty-sized bot population, full pellets
    pub fn new(difficulty: Difficulty, boundary: Boundary, pellet_target: usize, seed: Option<u64>) -> Self {
        let settings = difficulty.divide_settings();
        let mut world = DivideWorld::new(boundary, pellet_target, seed);
        world.spawn_player("You".to_string());

        let fallback = AiPersonality::from_settings(&settings, &mut world.rng);
        let mut ai = AiManager::new(fallback);
        for _ in 0..settings.bot_count {
            let name = generate_bot_name(&mut world.rng);
            let id = world.spawn_bot(name);
            let personality = AiPersonality::from_settings(&settings, &mut world.rng);
            ai.register(id, personality);
        }
        pellets::replenish(&mut world);

        info!(
            "Divide session ready: {} bots, {} pellets, {:?}",
            settings.bot_count,
            world.pellets.len(),
            boundary
        );
        Self::from_parts(world, ai, difficulty)
    }

    /// Session over a prepared world; bot cells get the difficulty's personality
    pub fn with_world(world: DivideWorld, difficulty: Difficulty) -> Self {
        let settings = difficulty.divide_settings();
        let mut ai = AiManager::new(AiPersonality {
            aggression: settings.bot_aggression,
            split_chance: settings.bot_split_chance,
        });
        ai.sync(&world);
        Self::from_parts(world, ai, difficulty)
    }

    fn from_parts(world: DivideWorld, ai: AiManager, difficulty: Difficulty) -> Self {
        let mut session = Self {
            peak_player_mass: world.player_mass(),
            world,
            ai,
            difficulty,
            camera: Camera::default(),
            leaderboard: Leaderboard::default(),
            minimap: Vec::new(),
        };
        if let Some(center) = session.world.owner_centroid(Owner::PLAYER) {
            session.camera = Camera {
                center,
                scale: session.target_zoom(),
            };
        }
        session.derive();
        session
    }

    pub fn world(&self) -> &DivideWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut DivideWorld {
        &mut self.world
    }

    pub fn ai(&self) -> &AiManager {
        &self.ai
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn minimap(&self) -> &[MinimapDot] {
        &self.minimap
    }

    pub fn player_rank(&self) -> Option<u32> {
        self.leaderboard.player_rank()
    }

    /// Peak total player mass, rounded down
    pub fn score(&self) -> u64 {
        self.peak_player_mass.max(0.0).floor() as u64
    }

    /// Steps 1-5: input, ai + physics, merges, predation, pellets
    fn step(&mut self, input: &DivideInput) -> Vec<DivideEvent> {
        let mut events = Vec::new();
        let joystick = if input.joystick.is_finite() {
            input.joystick
        } else {
            Vec2::ZERO
        };

        physics::apply_player_input(&mut self.world, joystick, input.split, &mut events);

        self.ai.update(&mut self.world, &mut events);
        physics::apply_cohesion(&mut self.world);
        physics::update(&mut self.world);

        collision::resolve_merges(&mut self.world, &mut events);
        collision::resolve_predation(&mut self.world, &mut events);

        pellets::resolve_consumption(&mut self.world, &mut events);
        pellets::replenish(&mut self.world);

        self.ai.sync(&self.world);

        for event in &events {
            if let DivideEvent::Eaten {
                prey_is_player: true,
                prey,
                predator,
                ..
            } = event
            {
                debug!("Player cell {} eaten by cell {}", prey, predator);
            }
        }

        events
    }

    /// Step 6: leaderboard, score, camera, minimap
    fn derive(&mut self) {
        self.leaderboard = Leaderboard::compute(&self.world);
        self.peak_player_mass = self.peak_player_mass.max(self.world.player_mass());

        if let Some(target) = self.world.owner_centroid(Owner::PLAYER) {
            let zoom = self.target_zoom();
            self.camera.center = self.camera.center.lerp(target, hud::CAMERA_LERP);
            self.camera.scale += (zoom - self.camera.scale) * hud::CAMERA_LERP;
        }

        let extent = self.world.boundary.half_extent();
        let span = (extent.x * 2.0).max(extent.y * 2.0);
        self.minimap = self
            .world
            .cells
            .iter()
            .map(|cell| MinimapDot {
                x: (cell.position.x + extent.x) / (extent.x * 2.0),
                y: (cell.position.y + extent.y) / (extent.y * 2.0),
                radius: cell.radius() / span,
                is_player: cell.is_player(),
            })
            .collect();
    }

    /// Bigger player blobs zoom the view out
    fn target_zoom(&self) -> f32 {
        let total_radius: f32 = self.world.player_cells().map(|c| c.radius()).sum();
        if total_radius <= 0.0 {
            return self.camera.scale;
        }
        (hud::ZOOM_REFERENCE_RADIUS / total_radius)
            .powf(0.4)
            .clamp(hud::ZOOM_MIN, hud::ZOOM_MAX)
    }

    /// Step 7
    fn draw(&self, surface: &mut dyn RenderSurface) {
        let viewport = surface.viewport();
        surface.draw(DrawCommand::Clear {
            color: Color::BACKGROUND,
        });

        surface.draw(DrawCommand::PushCamera {
            camera: self.camera,
        });
        self.draw_boundary(surface);

        for pellet in &self.world.pellets {
            surface.draw(DrawCommand::Circle {
                center: pellet.position,
                radius: pellet.radius(),
                fill: pellet.color,
                stroke: None,
            });
        }

        // Small cells first so big ones are drawn on top
        let mut cells: Vec<_> = self.world.cells.iter().collect();
        cells.sort_by(|a, b| a.mass().partial_cmp(&b.mass()).unwrap_or(std::cmp::Ordering::Equal));
        for cell in cells {
            surface.draw(DrawCommand::Circle {
                center: cell.position,
                radius: cell.radius(),
                fill: cell.color,
                stroke: Some(cell.color.darken(0.8)),
            });
            surface.draw(DrawCommand::Text {
                position: cell.position,
                text: cell.name.clone(),
                size: (cell.radius() * 0.4).max(12.0),
                color: Color::WHITE,
                align: TextAlign::Center,
            });
        }
        surface.draw(DrawCommand::PopCamera);

        self.draw_hud(surface, viewport);
    }

    fn draw_boundary(&self, surface: &mut dyn RenderSurface) {
        match self.world.boundary {
            Boundary::Rect { width, height } => {
                let (hw, hh) = (width * 0.5, height * 0.5);
                let corners = [
                    Vec2::new(-hw, -hh),
                    Vec2::new(hw, -hh),
                    Vec2::new(hw, hh),
                    Vec2::new(-hw, hh),
                ];
                for i in 0..corners.len() {
                    surface.draw(DrawCommand::Line {
                        from: corners[i],
                        to: corners[(i + 1) % corners.len()],
                        color: Color::GRID,
                        width: 4.0,
                    });
                }
            }
            Boundary::Circle { radius } => {
                surface.draw(DrawCommand::Circle {
                    center: Vec2::ZERO,
                    radius,
                    fill: Color::rgba(255, 255, 255, 0),
                    stroke: Some(Color::GRID),
                });
            }
        }
    }

    fn draw_hud(&self, surface: &mut dyn RenderSurface, viewport: Vec2) {
        surface.draw(DrawCommand::Text {
            position: Vec2::new(HUD_MARGIN, HUD_MARGIN + 12.0),
            text: format!("Score: {}", self.score()),
            size: 20.0,
            color: Color::BLACK,
            align: TextAlign::Left,
        });

        let right = viewport.x - HUD_MARGIN;
        surface.draw(DrawCommand::Text {
            position: Vec2::new(right, HUD_MARGIN + 12.0),
            text: "Leaderboard".to_string(),
            size: 18.0,
            color: Color::BLACK,
            align: TextAlign::Right,
        });
        for (i, entry) in self.leaderboard.top(hud::LEADERBOARD_SIZE).iter().enumerate() {
            let color = if entry.is_player {
                Color::rgb(0, 150, 136)
            } else {
                Color::BLACK
            };
            surface.draw(DrawCommand::Text {
                position: Vec2::new(right, HUD_MARGIN + 36.0 + i as f32 * 18.0),
                text: format!("{}. {}", entry.rank, entry.name),
                size: 14.0,
                color,
                align: TextAlign::Right,
            });
        }

        let origin = viewport - Vec2::new(MINIMAP_SIZE + HUD_MARGIN, MINIMAP_SIZE + HUD_MARGIN);
        for dot in &self.minimap {
            surface.draw(DrawCommand::Circle {
                center: origin + Vec2::new(dot.x, dot.y) * MINIMAP_SIZE,
                radius: (dot.radius * MINIMAP_SIZE).max(1.5),
                fill: if dot.is_player {
                    Color::rgb(0, 150, 136)
                } else {
                    Color::rgba(0, 0, 0, 96)
                },
                stroke: None,
            });
        }
    }
}

impl Simulation for DivideSession {
    type Input = DivideInput;
    type Event = DivideEvent;

    fn game(&self) -> GameKind {
        GameKind::Divide
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn entity_count(&self) -> usize {
        self.world.cells.len() + self.world.pellets.len()
    }

    fn frame(&mut self, input: &DivideInput, surface: &mut dyn RenderSurface) -> FrameReport<DivideEvent> {
        let events = self.step(input);
        self.derive();
        self.draw(surface);

        let mut report = FrameReport::running(events);
        if !self.world.has_player() {
            report.outcome = Some(GameOutcome::Divide { score: self.score() });
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{CueLog, SoundCue};
    use crate::divide::constants::{mass, pellet, split};
    use crate::divide::state::{Pellet, PALETTE, PLAYER_COLOR};
    use crate::frame::{FrameScheduler, FrameStatus};
    use crate::progress::{MemoryProgress, ProgressStore};
    use crate::render::FrameRecorder;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-2
    }

    fn empty_world() -> DivideWorld {
        DivideWorld::new(Boundary::square(3000.0), 0, Some(17))
    }

    fn recorder() -> FrameRecorder {
        FrameRecorder::new(Vec2::new(800.0, 600.0))
    }

    #[test]
    fn test_player_eats_pellet_underneath() {
        let mut world = empty_world();
        let player = world.spawn_player("You".into());
        world.pellets.push(Pellet {
            position: Vec2::ZERO,
            color: PALETTE[2],
        });
        let mut session = DivideSession::with_world(world, Difficulty::Medium);

        let report = session.frame(&DivideInput::default(), &mut recorder());

        let cell = session.world().get_cell(player).unwrap();
        assert_eq!(cell.mass(), mass::STARTING + pellet::MASS);
        assert!(session.world().pellets.is_empty());
        assert!(report.outcome.is_none());
        assert!(report
            .events
            .iter()
            .any(|e| matches!(e, DivideEvent::Collected { by_player: true, .. })));
    }

    #[test]
    fn test_bot_runs_from_bigger_cell() {
        let mut world = empty_world();
        let bot = world.spawn_cell(Owner::bot(1), Vec2::ZERO, 500.0, PALETTE[0], "bot".into());
        world.spawn_cell(Owner::PLAYER, Vec2::new(150.0, 0.0), 700.0, PLAYER_COLOR, "You".into());
        let mut session = DivideSession::with_world(world, Difficulty::Hard);

        session.frame(&DivideInput::default(), &mut recorder());

        let cell = session.world().get_cell(bot).unwrap();
        assert!(cell.velocity.x < 0.0);
        assert!(cell.position.x < 0.0);
    }

    #[test]
    fn test_split_then_merge_back_conserves_mass() {
        let mut world = empty_world();
        world.spawn_cell(Owner::PLAYER, Vec2::ZERO, 200.0, PLAYER_COLOR, "You".into());
        let mut session = DivideSession::with_world(world, Difficulty::Easy);
        let mut surface = recorder();

        let report = session.frame(
            &DivideInput {
                joystick: Vec2::ZERO,
                split: true,
            },
            &mut surface,
        );
        assert_eq!(session.world().player_cells().count(), 2);
        assert!(report.events.iter().any(|e| matches!(e, DivideEvent::Split { by_player: true, .. })));

        for _ in 0..(split::MERGE_COOLDOWN_FRAMES * 3) {
            session.frame(&DivideInput::default(), &mut surface);
            assert!(approx_eq(session.world().player_mass(), 200.0));
        }
        assert_eq!(session.world().player_cells().count(), 1);
    }

    #[test]
    fn test_game_ends_when_player_is_eaten() {
        let mut world = empty_world();
        world.spawn_cell(Owner::PLAYER, Vec2::ZERO, 100.0, PLAYER_COLOR, "You".into());
        world.spawn_cell(Owner::bot(1), Vec2::new(5.0, 0.0), 400.0, PALETTE[3], "bot".into());
        let mut session = DivideSession::with_world(world, Difficulty::Easy);

        let report = session.frame(&DivideInput::default(), &mut recorder());

        assert_eq!(report.outcome, Some(GameOutcome::Divide { score: 100 }));
        // The bot may have split at its prey; either way the mass went to it
        let bot_mass: f32 = session.world().bot_cells().map(|c| c.mass()).sum();
        assert!(approx_eq(bot_mass, 500.0));
    }

    #[test]
    fn test_score_tracks_peak_mass() {
        let mut world = empty_world();
        world.spawn_player("You".into());
        for i in 0..10 {
            world.pellets.push(Pellet {
                position: Vec2::new(i as f32, 0.0),
                color: PALETTE[0],
            });
        }
        let mut session = DivideSession::with_world(world, Difficulty::Easy);
        session.frame(&DivideInput::default(), &mut recorder());
        assert_eq!(session.score(), 120);

        // Losing mass later doesn't lower the score
        let id = session.world().player_cells().next().unwrap().id;
        session.world_mut().get_cell_mut(id).unwrap().set_mass(50.0);
        session.frame(&DivideInput::default(), &mut recorder());
        assert_eq!(session.score(), 120);
    }

    #[test]
    fn test_new_session_populates_world() {
        let session = DivideSession::new(Difficulty::Hard, Boundary::round(3000.0), 120, Some(4));
        let settings = Difficulty::Hard.divide_settings();

        assert_eq!(session.world().player_cells().count(), 1);
        assert_eq!(session.world().bot_cells().count(), settings.bot_count);
        assert_eq!(session.world().pellets.len(), 120);
        assert_eq!(session.ai().len(), settings.bot_count);
        assert_eq!(session.leaderboard().len(), settings.bot_count + 1);
        assert_eq!(session.minimap().len(), settings.bot_count + 1);
        assert!(session
            .minimap()
            .iter()
            .all(|d| (0.0..=1.0).contains(&d.x) && (0.0..=1.0).contains(&d.y)));
    }

    #[test]
    fn test_camera_follows_player() {
        let mut world = empty_world();
        world.spawn_player("You".into());
        let mut session = DivideSession::with_world(world, Difficulty::Easy);
        let input = DivideInput {
            joystick: Vec2::new(1.0, 0.0),
            split: false,
        };
        let mut surface = recorder();
        for _ in 0..60 {
            session.frame(&input, &mut surface);
        }
        let camera = session.camera();
        assert!(camera.center.x > 0.0);
        assert!(camera.scale >= hud::ZOOM_MIN && camera.scale <= hud::ZOOM_MAX);
    }

    #[test]
    fn test_frame_draws_world_and_hud() {
        let mut session = DivideSession::new(Difficulty::Easy, Boundary::square(2000.0), 30, Some(2));
        let mut surface = recorder();
        session.frame(&DivideInput::default(), &mut surface);

        assert_eq!(surface.frames(), 1);
        assert!(matches!(surface.commands()[0], DrawCommand::Clear { .. }));
        assert!(surface.texts().any(|t| t.starts_with("Score:")));
        assert!(surface.texts().any(|t| t == "Leaderboard"));
        // pellets + cells + minimap dots
        let cells = session.world().cells.len();
        assert!(surface.circle_count() >= session.world().pellets.len() + cells * 2);
    }

    #[test]
    fn test_non_finite_joystick_is_ignored() {
        let mut world = empty_world();
        let id = world.spawn_player("You".into());
        let mut session = DivideSession::with_world(world, Difficulty::Easy);
        let input = DivideInput {
            joystick: Vec2::new(f32::NAN, 1.0),
            split: false,
        };
        session.frame(&input, &mut recorder());
        assert!(session.world().get_cell(id).unwrap().position.is_finite());
    }

    #[test]
    fn test_scheduler_records_high_score() {
        let mut world = empty_world();
        world.spawn_cell(Owner::PLAYER, Vec2::ZERO, 100.0, PLAYER_COLOR, "You".into());
        world.spawn_cell(Owner::bot(1), Vec2::new(5.0, 0.0), 400.0, PALETTE[3], "bot".into());
        let session = DivideSession::with_world(world, Difficulty::Easy);
        let mut progress = MemoryProgress::new();
        let mut surface = recorder();

        {
            let mut scheduler = FrameScheduler::new(session, 60).with_progress(&mut progress);
            let status = scheduler.on_frame(&DivideInput::default(), &mut surface);
            assert_eq!(status, FrameStatus::Finished(GameOutcome::Divide { score: 100 }));
            assert!(!scheduler.on_frame(&DivideInput::default(), &mut surface).wants_next_frame());
        }

        assert_eq!(progress.record(GameKind::Divide).high_score, 100);
        assert_eq!(progress.record(GameKind::Divide).max_level, 0);
        assert!(!progress.update_high_score_if_greater(GameKind::Divide, 100));
    }

    #[test]
    fn test_player_split_plays_a_cue() {
        let mut world = empty_world();
        world.spawn_cell(Owner::PLAYER, Vec2::ZERO, 200.0, PLAYER_COLOR, "You".into());
        let session = DivideSession::with_world(world, Difficulty::Easy);
        let mut cues = CueLog::default();
        let mut surface = recorder();

        {
            let mut scheduler = FrameScheduler::new(session, 60).with_audio(&mut cues);
            let input = DivideInput {
                joystick: Vec2::new(0.0, -1.0),
                split: true,
            };
            assert!(scheduler.on_frame(&input, &mut surface).wants_next_frame());
        }

        assert_eq!(cues.count(SoundCue::Split), 1);
    }
}
