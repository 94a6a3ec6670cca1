//! Rendering surface boundary
//!
//! Sessions describe each frame as an ordered list of draw primitives. The host
//! (canvas, GPU renderer, test recorder) implements [`RenderSurface`] and turns
//! them into pixels. Nothing flows back through this interface.

use serde::{Deserialize, Serialize};

use crate::util::vec2::Vec2;

/// sRGB colour with alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const GRID: Color = Color::rgba(0, 0, 0, 24);
    pub const BACKGROUND: Color = Color::rgb(242, 247, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Darker variant used for outlines
    pub fn darken(&self, factor: f32) -> Self {
        let f = factor.clamp(0.0, 1.0);
        let scale = |c: u8| (c as f32 * (1.0 - f)).round() as u8;
        Self {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
            a: self.a,
        }
    }
}

/// View transform: world point `p` lands on screen at `(p - center) * scale + viewport / 2`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub center: Vec2,
    pub scale: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl Camera {
    pub fn world_to_screen(&self, point: Vec2, viewport: Vec2) -> Vec2 {
        (point - self.center) * self.scale + viewport * 0.5
    }

    pub fn screen_to_world(&self, point: Vec2, viewport: Vec2) -> Vec2 {
        (point - viewport * 0.5) / self.scale + self.center
    }
}

/// Horizontal text anchoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// A single draw primitive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    /// Fill the whole viewport
    Clear { color: Color },
    /// Subsequent world-space primitives use this transform
    PushCamera { camera: Camera },
    /// Return to screen space (HUD)
    PopCamera,
    Circle {
        center: Vec2,
        radius: f32,
        fill: Color,
        stroke: Option<Color>,
    },
    Line {
        from: Vec2,
        to: Vec2,
        color: Color,
        width: f32,
    },
    Text {
        position: Vec2,
        text: String,
        size: f32,
        color: Color,
        align: TextAlign,
    },
}

/// Destination for draw primitives
pub trait RenderSurface {
    /// Size of the drawable area in screen pixels
    fn viewport(&self) -> Vec2;

    fn draw(&mut self, command: DrawCommand);
}

/// Surface that records commands for the latest frame.
///
/// Used by the headless runner and by tests to inspect what a frame drew.
#[derive(Debug, Clone)]
pub struct FrameRecorder {
    viewport: Vec2,
    commands: Vec<DrawCommand>,
    frames: u64,
}

impl FrameRecorder {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            viewport,
            commands: Vec::with_capacity(512),
            frames: 0,
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of frames started (a frame starts at each `Clear`)
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn circle_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { .. }))
            .count()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl RenderSurface for FrameRecorder {
    fn viewport(&self) -> Vec2 {
        self.viewport
    }

    fn draw(&mut self, command: DrawCommand) {
        if matches!(command, DrawCommand::Clear { .. }) {
            self.commands.clear();
            self.frames += 1;
        }
        self.commands.push(command);
    }
}
