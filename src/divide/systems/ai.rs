use hashbrown::{HashMap, HashSet};
use rand::Rng;
use tracing::debug;

use crate::difficulty::DivideSettings;
use crate::divide::constants::ai::*;
use crate::divide::constants::split::MAX_CELLS_PER_OWNER;
use crate::divide::state::{Cell, CellId, DivideWorld};
use crate::divide::systems::physics::steer;
use crate::divide::systems::DivideEvent;
use crate::util::vec2::Vec2;

/// AI behavior mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiBehavior {
    /// Drift on a random heading
    Wander,
    /// Run from a bigger cell
    Flee,
    /// Hunt a smaller cell
    Chase,
    /// Head for a pellet
    Feed,
}

/// What the bot is currently steering toward (or away from)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AiTarget {
    Cell(CellId),
    Point(Vec2),
}

/// AI personality traits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiPersonality {
    /// Chance (0.0-1.0) of committing to a prey candidate at each decision
    pub aggression: f32,
    /// Per-frame chance of splitting at prey that is within closing distance
    pub split_chance: f32,
}

impl AiPersonality {
    /// Difficulty settings with a little per-bot variance in aggression
    pub fn from_settings(settings: &DivideSettings, rng: &mut impl Rng) -> Self {
        let jitter = rng.gen_range(-0.1..0.1);
        Self {
            aggression: (settings.bot_aggression + jitter).clamp(0.0, 1.0),
            split_chance: settings.bot_split_chance.clamp(0.0, 1.0),
        }
    }
}

impl Default for AiPersonality {
    fn default() -> Self {
        Self {
            aggression: 0.5,
            split_chance: 0.01,
        }
    }
}

/// AI state for one bot cell
#[derive(Debug, Clone)]
pub struct AiState {
    pub behavior: AiBehavior,
    pub target: Option<AiTarget>,
    /// Frames until the next target re-evaluation
    pub decision_timer: u32,
    /// Wander velocity as a fraction of max speed
    pub heading: Vec2,
    pub personality: AiPersonality,
}

impl AiState {
    pub fn new(personality: AiPersonality) -> Self {
        Self {
            behavior: AiBehavior::Wander,
            target: None,
            decision_timer: 0,
            heading: Vec2::ZERO,
            personality,
        }
    }
}

impl Default for AiState {
    fn default() -> Self {
        Self::new(AiPersonality::default())
    }
}

/// Nearest interesting cells around a bot
#[derive(Debug, Default)]
struct Perception {
    /// (id, position, distance)
    threat: Option<(CellId, Vec2, f32)>,
    /// (id, distance)
    prey: Option<(CellId, f32)>,
}

/// AI manager for all bot cells
pub struct AiManager {
    states: HashMap<CellId, AiState>,
    /// Personality for bot cells that show up without one
    fallback: AiPersonality,
}

impl AiManager {
    pub fn new(fallback: AiPersonality) -> Self {
        Self {
            states: HashMap::new(),
            fallback,
        }
    }

    pub fn register(&mut self, cell: CellId, personality: AiPersonality) {
        self.states.insert(cell, AiState::new(personality));
    }

    pub fn unregister(&mut self, cell: CellId) {
        self.states.remove(&cell);
    }

    pub fn get(&self, cell: CellId) -> Option<&AiState> {
        self.states.get(&cell)
    }

    pub fn get_mut(&mut self, cell: CellId) -> Option<&mut AiState> {
        self.states.get_mut(&cell)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Forget cells that were merged or eaten and adopt bot cells that have no state yet
    pub fn sync(&mut self, world: &DivideWorld) {
        let fallback = self.fallback;
        let alive: HashSet<CellId> = world.bot_cells().map(|c| c.id).collect();
        self.states.retain(|id, _| alive.contains(id));
        for id in alive {
            self.states
                .entry(id)
                .or_insert_with(|| AiState::new(fallback));
        }
    }

    /// Run one frame of decisions and steering for every bot cell
    pub fn update(&mut self, world: &mut DivideWorld, events: &mut Vec<DivideEvent>) {
        let fallback = self.fallback;
        let bot_ids: Vec<CellId> = world.bot_cells().map(|c| c.id).collect();

        for id in bot_ids {
            let Some(index) = world.cells.iter().position(|c| c.id == id) else {
                continue;
            };
            let state = self
                .states
                .entry(id)
                .or_insert_with(|| AiState::new(fallback));

            let Some(direction) = think(state, index, world) else {
                continue;
            };
            let personality = state.personality;

            // Opportunistic split at the prey
            let owner = world.cells[index].owner;
            if world.cells_of(owner).count() >= MAX_CELLS_PER_OWNER {
                continue;
            }
            if let Some(child) = world.split_cell(id, direction) {
                debug!("Bot cell {} split at its prey (child {})", id, child);
                let mut child_state = AiState::new(personality);
                child_state.behavior = AiBehavior::Chase;
                child_state.target = self.states.get(&id).and_then(|s| s.target);
                self.states.insert(child, child_state);
                events.push(DivideEvent::Split {
                    parent: id,
                    child,
                    by_player: false,
                });
            }
        }
    }
}

/// Decide and steer for one bot. Returns a split direction when the bot wants to split.
fn think(state: &mut AiState, index: usize, world: &mut DivideWorld) -> Option<Vec2> {
    let perception = perceive(&world.cells[index], world);
    let bot = &world.cells[index];
    let position = bot.position;
    let radius = bot.radius();
    let max_speed = bot.max_speed();

    // Threats are checked every frame and override everything else
    if let Some((threat_id, threat_position, distance)) = perception.threat {
        if distance < radius * PANIC_MULTIPLIER {
            let away = match (position - threat_position).try_normalize(1e-3) {
                Some(away) => away,
                None => Vec2::from_angle(world.rng.gen_range(0.0..std::f32::consts::TAU)),
            };
            state.behavior = AiBehavior::Flee;
            state.target = Some(AiTarget::Cell(threat_id));
            world.cells[index].velocity = away * max_speed;
            return None;
        }
    }
    if state.behavior == AiBehavior::Flee {
        state.behavior = AiBehavior::Wander;
        state.target = None;
        state.decision_timer = 0;
    }

    state.decision_timer = state.decision_timer.saturating_sub(1);
    if state.decision_timer == 0 {
        state.decision_timer = DECISION_INTERVAL_FRAMES;
        decide(state, &perception, nearest_pellet(position, world), &mut world.rng);
    }

    match (state.behavior, state.target) {
        (AiBehavior::Chase, Some(AiTarget::Cell(target_id))) => {
            let Some(target) = world.get_cell(target_id).map(|c| c.position) else {
                // Prey is gone; pick something else next frame
                state.behavior = AiBehavior::Wander;
                state.target = None;
                state.decision_timer = 0;
                return None;
            };
            let to_target = target - position;
            let distance = to_target.length();
            let direction = to_target.try_normalize(1e-3)?;
            steer(&mut world.cells[index], direction * max_speed);

            let closing = distance < radius * SPLIT_CLOSING_FACTOR;
            if closing && world.cells[index].can_split() && world.rng.gen::<f32>() < state.personality.split_chance {
                return Some(direction);
            }
            None
        }
        (AiBehavior::Feed, Some(AiTarget::Point(point))) => {
            let to_point = point - position;
            if to_point.length() < radius {
                state.decision_timer = 0;
            }
            if let Some(direction) = to_point.try_normalize(1e-3) {
                steer(&mut world.cells[index], direction * max_speed);
            }
            None
        }
        _ => {
            if world.rng.gen_bool(WANDER_PROBABILITY) {
                let angle = world.rng.gen_range(0.0..std::f32::consts::TAU);
                let speed = world.rng.gen_range(0.3..1.0);
                state.heading = Vec2::from_angle(angle) * speed;
            }
            let desired = state.heading * max_speed;
            steer(&mut world.cells[index], desired);
            None
        }
    }
}

/// Pick a prey (gated by aggression), else the nearest pellet, else wander
fn decide(state: &mut AiState, perception: &Perception, pellet: Option<Vec2>, rng: &mut impl Rng) {
    if let Some((prey_id, _)) = perception.prey {
        if rng.gen::<f32>() < state.personality.aggression {
            state.behavior = AiBehavior::Chase;
            state.target = Some(AiTarget::Cell(prey_id));
            return;
        }
    }

    match pellet {
        Some(point) => {
            state.behavior = AiBehavior::Feed;
            state.target = Some(AiTarget::Point(point));
        }
        None => {
            state.behavior = AiBehavior::Wander;
            state.target = None;
        }
    }
}

/// Nearest threat and nearest prey candidate within perception range
fn perceive(bot: &Cell, world: &DivideWorld) -> Perception {
    let range = bot.radius() * PERCEPTION_MULTIPLIER;
    let mut perception = Perception::default();

    for other in &world.cells {
        if other.owner == bot.owner {
            continue;
        }
        let distance = bot.position.distance_to(other.position);
        if distance > range {
            continue;
        }

        if other.mass() > bot.mass() * AGGRESSION_THRESHOLD {
            if perception.threat.map_or(true, |(_, _, d)| distance < d) {
                perception.threat = Some((other.id, other.position, distance));
            }
        } else if bot.mass() > other.mass() * AGGRESSION_THRESHOLD
            && perception.prey.map_or(true, |(_, d)| distance < d)
        {
            perception.prey = Some((other.id, distance));
        }
    }

    perception
}

fn nearest_pellet(position: Vec2, world: &DivideWorld) -> Option<Vec2> {
    world
        .pellets
        .iter()
        .map(|p| (p.position, p.position.distance_sq_to(position)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(p, _)| p)
}

/// Generate bot names
pub fn generate_bot_name(rng: &mut impl Rng) -> String {
    let prefixes = ["Bubbly", "Zippy", "Sunny", "Wobbly", "Sparkle", "Jolly", "Fuzzy", "Happy"];
    let suffixes = ["Blob", "Bean", "Drop", "Puff", "Dot", "Jelly", "Muffin", "Pop"];

    format!(
        "{}{}",
        prefixes[rng.gen_range(0..prefixes.len())],
        suffixes[rng.gen_range(0..suffixes.len())]
    )
}
