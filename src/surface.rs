//! Immediate-mode drawing surface abstraction.
//!
//! The particle field never talks to a concrete renderer. Every frame it
//! issues three kinds of calls against a [`DrawSurface`]: a clear, filled
//! circles for particles, and stroked line segments for links. Hosts supply
//! the implementation (the wgpu canvas on native, the 2D canvas context in
//! the browser, [`crate::raster::ImageSurface`] for snapshots), and tests use
//! [`RecordingSurface`] to inspect exactly what was drawn.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An sRGB colour with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity in `[0, 1]`.
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Fully opaque colour.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Same colour with a different opacity, clamped to `[0, 1]`.
    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: if a.is_finite() { a.clamp(0.0, 1.0) } else { 0.0 },
            ..self
        }
    }

    /// CSS colour string, e.g. `rgba(6, 182, 212, 0.4)`.
    pub fn to_css(self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }

    /// Normalized `[r, g, b, a]` channels for GPU upload.
    pub fn to_array(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a,
        ]
    }
}

/// A 2D raster target supporting the three primitives the field needs.
pub trait DrawSurface {
    /// Erase a rectangle to transparent (or the host's background).
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32);

    /// Fill a circle of `radius` around `center`.
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);

    /// Stroke a straight segment from `from` to `to`.
    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba);
}

impl<S: DrawSurface + ?Sized> DrawSurface for &mut S {
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        (**self).clear_rect(x, y, width, height);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        (**self).fill_circle(center, radius, color);
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        (**self).stroke_line(from, to, width, color);
    }
}

/// One recorded call against a [`RecordingSurface`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    Clear {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: Rgba,
    },
    Line {
        from: Vec2,
        to: Vec2,
        width: f32,
        color: Rgba,
    },
}

/// A surface that remembers every call instead of drawing.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls so far, in issue order.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drain the recorded calls.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear_history(&mut self) {
        self.commands.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Recorded line segments as `(from, to, color)`.
    pub fn lines(&self) -> Vec<(Vec2, Vec2, Rgba)> {
        self.commands
            .iter()
            .filter_map(|c| match *c {
                DrawCommand::Line { from, to, color, .. } => Some((from, to, color)),
                _ => None,
            })
            .collect()
    }

    /// Recorded circles as `(center, radius, color)`.
    pub fn circles(&self) -> Vec<(Vec2, f32, Rgba)> {
        self.commands
            .iter()
            .filter_map(|c| match *c {
                DrawCommand::Circle { center, radius, color } => Some((center, radius, color)),
                _ => None,
            })
            .collect()
    }

    pub fn clear_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Clear { .. }))
            .count()
    }
}

impl DrawSurface for RecordingSurface {
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.commands.push(DrawCommand::Clear { x, y, width, height });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::Circle { center, radius, color });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        self.commands.push(DrawCommand::Line { from, to, width, color });
    }
}
