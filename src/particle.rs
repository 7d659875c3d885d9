//! A single drifting point.
//!
//! Particles move at a constant velocity, wrap around the surface edges, and
//! are pushed away from the pointer while it is within range. Proximity to
//! the pointer also inflates the drawn radius, which then relaxes back to the
//! spawn radius by a fixed step per tick.

use glam::Vec2;
use rand::Rng;

use crate::config::FieldSettings;
use crate::pointer::Pointer;
use crate::sizer::SurfaceDimensions;
use crate::surface::{DrawSurface, Rgba};

/// Lower bound of the sampled density.
pub const MIN_DENSITY: f32 = 1.0;
/// Upper bound (exclusive) of the sampled density.
pub const MAX_DENSITY: f32 = 31.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    /// Current drawn radius; never below `base_size`.
    pub size: f32,
    /// Radius at spawn.
    pub base_size: f32,
    /// Per-tick displacement, fixed for the particle's lifetime.
    pub velocity: Vec2,
    /// Repulsion susceptibility in `[1, 31)`.
    pub density: f32,
}

impl Particle {
    /// Build a particle with explicit attributes. `base_size` is taken from `size`.
    pub fn new(position: Vec2, size: f32, velocity: Vec2, density: f32) -> Self {
        Self {
            position,
            size,
            base_size: size,
            velocity,
            density,
        }
    }

    /// A motionless particle, handy for placing points exactly.
    pub fn at(position: Vec2, size: f32) -> Self {
        Self::new(position, size, Vec2::ZERO, MIN_DENSITY)
    }

    /// Sample a particle. Without `at`, the position is uniform over the surface.
    pub fn spawn<R: Rng>(
        rng: &mut R,
        bounds: SurfaceDimensions,
        settings: &FieldSettings,
        at: Option<Vec2>,
    ) -> Self {
        let position = at.unwrap_or_else(|| {
            Vec2::new(
                rng.gen::<f32>() * bounds.width,
                rng.gen::<f32>() * bounds.height,
            )
        });
        let size = settings.min_size + rng.gen::<f32>() * (settings.max_size - settings.min_size);
        let velocity = Vec2::new(
            (rng.gen::<f32>() - 0.5) * settings.speed,
            (rng.gen::<f32>() - 0.5) * settings.speed,
        );
        let density = MIN_DENSITY + rng.gen::<f32>() * (MAX_DENSITY - MIN_DENSITY);
        Self::new(position, size, velocity, density)
    }

    /// Advance one tick: pointer repulsion and growth, relaxation, drift, wrap.
    pub fn update(&mut self, pointer: Option<&Pointer>, bounds: SurfaceDimensions, settings: &FieldSettings) {
        let previous = self.position;

        let mut repelled = false;
        if let Some(pointer) = pointer {
            let offset = self.position - pointer.position;
            let distance = offset.length();
            if distance < pointer.radius {
                let force = (pointer.radius - distance) / pointer.radius;
                if distance > 0.0 {
                    let away = offset / distance;
                    self.position += away * force * self.density * settings.repulsion_damping;
                }
                self.size = self.base_size + force * settings.size_growth;
                repelled = true;
            }
        }

        if !repelled && self.size > self.base_size {
            self.size = (self.size - settings.size_relax_step).max(self.base_size);
        }

        self.position += self.velocity;
        self.wrap(bounds);

        if !self.position.is_finite() {
            self.position = previous;
        }
        if !self.size.is_finite() || self.size < self.base_size {
            self.size = self.base_size;
        }
    }

    /// Toroidal wrap: leaving one side re-enters at the opposite bound.
    pub fn wrap(&mut self, bounds: SurfaceDimensions) {
        if self.position.x < 0.0 {
            self.position.x = bounds.width;
        }
        if self.position.x > bounds.width {
            self.position.x = 0.0;
        }
        if self.position.y < 0.0 {
            self.position.y = bounds.height;
        }
        if self.position.y > bounds.height {
            self.position.y = 0.0;
        }
    }

    pub fn draw<S: DrawSurface + ?Sized>(&self, surface: &mut S, color: Rgba) {
        surface.fill_circle(self.position, self.size, color);
    }
}
