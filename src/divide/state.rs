//! Divide-io world state
//!
//! Cells (player and bot blobs), pellets and the world boundary. The world
//! owns every entity; systems borrow it mutably once per frame step.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::divide::constants::{mass, mass_to_radius, pellet, speed_for_radius, split, split_impulse};
use crate::render::Color;
use crate::util::vec2::Vec2;

/// Stable cell identifier (never reused within a session)
pub type CellId = u32;

/// Identifier shared by every cell one controller owns
pub type OwnerId = u32;

/// Who steers a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnerKind {
    Player,
    Bot,
}

/// Controller of a cell. Cells with equal owners are siblings and may merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner {
    pub kind: OwnerKind,
    pub id: OwnerId,
}

impl Owner {
    /// The single human player
    pub const PLAYER: Owner = Owner {
        kind: OwnerKind::Player,
        id: 0,
    };

    pub fn bot(id: OwnerId) -> Self {
        Self {
            kind: OwnerKind::Bot,
            id,
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == OwnerKind::Player
    }
}

/// World edge policy. Both shapes are centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Boundary {
    /// Axis-aligned world spanning `[-width/2, width/2] x [-height/2, height/2]`
    Rect { width: f32, height: f32 },
    /// Round world of the given radius
    Circle { radius: f32 },
}

impl Boundary {
    pub fn square(size: f32) -> Self {
        Boundary::Rect {
            width: size,
            height: size,
        }
    }

    pub fn round(diameter: f32) -> Self {
        Boundary::Circle {
            radius: diameter * 0.5,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::ZERO
    }

    /// Half width and half height of the bounding box
    pub fn half_extent(&self) -> Vec2 {
        match *self {
            Boundary::Rect { width, height } => Vec2::new(width * 0.5, height * 0.5),
            Boundary::Circle { radius } => Vec2::new(radius, radius),
        }
    }

    /// Keep a circle of `radius` at `position` fully inside the world
    pub fn clamp(&self, position: Vec2, radius: f32) -> Vec2 {
        match *self {
            Boundary::Rect { width, height } => Vec2::new(
                clamp_axis(position.x, width * 0.5, radius),
                clamp_axis(position.y, height * 0.5, radius),
            ),
            Boundary::Circle {
                radius: world_radius,
            } => {
                let distance = position.length();
                if distance + radius > world_radius {
                    let allowed = (world_radius - radius).max(0.0);
                    position.normalize() * allowed
                } else {
                    position
                }
            }
        }
    }

    pub fn contains(&self, position: Vec2, radius: f32) -> bool {
        self.clamp(position, radius) == position
    }

    /// Uniform random point at least `margin` away from the edge
    pub fn random_point(&self, rng: &mut impl Rng, margin: f32) -> Vec2 {
        match *self {
            Boundary::Rect { width, height } => {
                let x = random_axis(rng, width * 0.5, margin);
                let y = random_axis(rng, height * 0.5, margin);
                Vec2::new(x, y)
            }
            Boundary::Circle { radius } => {
                let usable = (radius - margin).max(0.0);
                // sqrt keeps the area density uniform
                let r = usable * rng.gen::<f32>().sqrt();
                Vec2::from_angle(rng.gen_range(0.0..std::f32::consts::TAU)) * r
            }
        }
    }
}

fn clamp_axis(value: f32, half: f32, radius: f32) -> f32 {
    if radius >= half {
        0.0
    } else {
        value.clamp(-half + radius, half - radius)
    }
}

fn random_axis<R: Rng + ?Sized>(rng: &mut R, half: f32, margin: f32) -> f32 {
    if margin >= half {
        0.0
    } else {
        rng.gen_range(-half + margin..half - margin)
    }
}

/// One mass blob, player- or bot-controlled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub owner: Owner,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Always derived from `mass`; see [`Cell::set_mass`]
    mass: f32,
    radius: f32,
    /// Frames until this cell may merge with siblings again
    pub merge_cooldown: u32,
    pub color: Color,
    pub name: String,
}

impl Cell {
    pub fn new(id: CellId, owner: Owner, position: Vec2, mass: f32, color: Color, name: String) -> Self {
        Self {
            id,
            owner,
            position,
            velocity: Vec2::ZERO,
            mass,
            radius: mass_to_radius(mass),
            merge_cooldown: 0,
            color,
            name,
        }
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass;
        self.radius = mass_to_radius(mass);
    }

    pub fn add_mass(&mut self, amount: f32) {
        self.set_mass(self.mass + amount);
    }

    /// Current speed limit (px/frame)
    pub fn max_speed(&self) -> f32 {
        speed_for_radius(self.radius)
    }

    pub fn is_player(&self) -> bool {
        self.owner.is_player()
    }

    pub fn can_split(&self) -> bool {
        self.mass >= split::MIN_MASS
    }

    pub fn can_merge(&self) -> bool {
        self.merge_cooldown == 0
    }

    /// Advance one simulation step: cooldown, friction, integration, boundary
    pub fn update(&mut self, boundary: &Boundary, friction: f32) {
        self.merge_cooldown = self.merge_cooldown.saturating_sub(1);
        self.velocity *= friction;
        self.position += self.velocity;
        self.position = boundary.clamp(self.position, self.radius);
    }

    /// Split in two. Returns the ejected half, or `None` when too small.
    ///
    /// Direction preference: the hint, then the current heading, then a random angle.
    pub fn split(&mut self, direction_hint: Vec2, child_id: CellId, rng: &mut impl Rng) -> Option<Cell> {
        if !self.can_split() {
            return None;
        }

        let direction = direction_hint
            .try_normalize(split::DIRECTION_EPSILON)
            .or_else(|| self.velocity.try_normalize(split::DIRECTION_EPSILON))
            .unwrap_or_else(|| Vec2::from_angle(rng.gen_range(0.0..std::f32::consts::TAU)));

        let half = self.mass * 0.5;
        self.set_mass(half);
        self.merge_cooldown = split::MERGE_COOLDOWN_FRAMES;

        let mut child = Cell::new(
            child_id,
            self.owner,
            self.position + direction * (self.radius * split::EJECTION_OFFSET_FACTOR),
            half,
            self.color,
            self.name.clone(),
        );
        child.velocity = self.velocity + direction * split_impulse(half);
        child.merge_cooldown = split::MERGE_COOLDOWN_FRAMES;
        Some(child)
    }
}

/// Static food item
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pellet {
    pub position: Vec2,
    pub color: Color,
}

impl Pellet {
    pub fn radius(&self) -> f32 {
        pellet::RADIUS
    }
}

/// Bright pellet/bot colours
pub const PALETTE: [Color; 8] = [
    Color::rgb(239, 83, 80),
    Color::rgb(255, 167, 38),
    Color::rgb(255, 238, 88),
    Color::rgb(102, 187, 106),
    Color::rgb(41, 182, 246),
    Color::rgb(92, 107, 192),
    Color::rgb(171, 71, 188),
    Color::rgb(236, 64, 122),
];

/// Player colour (not in the bot palette)
pub const PLAYER_COLOR: Color = Color::rgb(38, 198, 218);

/// Everything alive in a divide-io session
pub struct DivideWorld {
    /// Unified entity list in creation order; player/bot views filter on owner
    pub cells: Vec<Cell>,
    pub pellets: Vec<Pellet>,
    pub boundary: Boundary,
    /// Pellet population to top up to
    pub pellet_target: usize,
    /// Frames simulated so far
    pub frame: u64,
    pub rng: StdRng,
    next_cell_id: CellId,
    next_bot_owner: OwnerId,
}

impl DivideWorld {
    pub fn new(boundary: Boundary, pellet_target: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            cells: Vec::new(),
            pellets: Vec::with_capacity(pellet_target),
            boundary,
            pellet_target,
            frame: 0,
            rng,
            next_cell_id: 1,
            next_bot_owner: 1,
        }
    }

    pub fn alloc_cell_id(&mut self) -> CellId {
        let id = self.next_cell_id;
        self.next_cell_id += 1;
        id
    }

    pub fn alloc_bot_owner(&mut self) -> Owner {
        let id = self.next_bot_owner;
        self.next_bot_owner += 1;
        Owner::bot(id)
    }

    /// Add a cell created elsewhere (tests, split children)
    pub fn add_cell(&mut self, cell: Cell) -> CellId {
        let id = cell.id;
        self.next_cell_id = self.next_cell_id.max(id + 1);
        self.cells.push(cell);
        id
    }

    /// Create a cell at `position` and return its id
    pub fn spawn_cell(&mut self, owner: Owner, position: Vec2, mass: f32, color: Color, name: String) -> CellId {
        let id = self.alloc_cell_id();
        self.cells.push(Cell::new(id, owner, position, mass, color, name));
        id
    }

    /// Player cell at the world centre
    pub fn spawn_player(&mut self, name: String) -> CellId {
        let position = self.boundary.center();
        self.spawn_cell(Owner::PLAYER, position, mass::STARTING, PLAYER_COLOR, name)
    }

    /// Bot cell at a random spot away from the player
    pub fn spawn_bot(&mut self, name: String) -> CellId {
        let owner = self.alloc_bot_owner();
        let color = PALETTE[self.rng.gen_range(0..PALETTE.len())];
        let radius = mass_to_radius(mass::STARTING);
        let keep_away = radius * 8.0;
        let mut position = self.boundary.random_point(&mut self.rng, radius);
        for _ in 0..10 {
            if self.player_cells().all(|c| c.position.distance_to(position) > keep_away) {
                break;
            }
            position = self.boundary.random_point(&mut self.rng, radius);
        }
        self.spawn_cell(owner, position, mass::STARTING, color, name)
    }

    pub fn spawn_pellet(&mut self) {
        let position = self.boundary.random_point(&mut self.rng, pellet::RADIUS);
        let color = PALETTE[self.rng.gen_range(0..PALETTE.len())];
        self.pellets.push(Pellet { position, color });
    }

    pub fn get_cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id == id)
    }

    pub fn get_cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.iter_mut().find(|c| c.id == id)
    }

    pub fn remove_cell(&mut self, id: CellId) -> Option<Cell> {
        let index = self.cells.iter().position(|c| c.id == id)?;
        Some(self.cells.remove(index))
    }

    pub fn player_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.is_player())
    }

    pub fn bot_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| !c.is_player())
    }

    pub fn cells_of(&self, owner: Owner) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(move |c| c.owner == owner)
    }

    pub fn has_player(&self) -> bool {
        self.player_cells().next().is_some()
    }

    pub fn player_mass(&self) -> f32 {
        self.player_cells().map(|c| c.mass()).sum()
    }

    pub fn total_cell_mass(&self) -> f32 {
        self.cells.iter().map(|c| c.mass()).sum()
    }

    /// Mass-weighted centre of an owner's cells
    pub fn owner_centroid(&self, owner: Owner) -> Option<Vec2> {
        let mut weighted = Vec2::ZERO;
        let mut total = 0.0;
        for cell in self.cells_of(owner) {
            weighted += cell.position * cell.mass();
            total += cell.mass();
        }
        (total > 0.0).then(|| weighted / total)
    }

    /// Split the cell with `id`. No-op (returns `None`) when it is too small or gone.
    pub fn split_cell(&mut self, id: CellId, direction_hint: Vec2) -> Option<CellId> {
        let child_id = self.next_cell_id;
        let index = self.cells.iter().position(|c| c.id == id)?;
        let child = self.cells[index].split(direction_hint, child_id, &mut self.rng)?;
        self.next_cell_id += 1;
        self.cells.push(child);
        Some(child_id)
    }
}
