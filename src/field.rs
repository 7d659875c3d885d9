//! The particle collection and its per-frame passes.
//!
//! A frame is three passes, always in this order:
//!
//! 1. [`ParticleField::update_all`] steps and draws every particle.
//! 2. [`ParticleField::draw_links`] strokes a line between every pair of
//!    particles closer than `line_distance`.
//! 3. [`ParticleField::draw_pointer_links`] strokes a line from the pointer to
//!    every particle inside its radius.
//!
//! The link pass is a plain O(n²) scan with no spatial partitioning, which is
//! why the seeded count is reduced on narrow viewports.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::FieldSettings;
use crate::particle::Particle;
use crate::pointer::Pointer;
use crate::sizer::SurfaceDimensions;
use crate::surface::DrawSurface;

/// Opacity of a link of length `distance` with cutoff `threshold`: 1 when
/// touching, falling linearly to 0 at the threshold. Distances at or beyond
/// the threshold are not linked and return `None`.
pub fn link_opacity(distance: f32, threshold: f32) -> Option<f32> {
    (distance < threshold).then(|| 1.0 - distance / threshold)
}

pub struct ParticleField {
    particles: Vec<Particle>,
    settings: FieldSettings,
    bounds: SurfaceDimensions,
    rng: StdRng,
}

impl ParticleField {
    /// An empty field with an entropy-seeded generator.
    pub fn new(settings: FieldSettings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    /// An empty field whose spawns are reproducible for a given seed.
    pub fn with_seed(settings: FieldSettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: FieldSettings, rng: StdRng) -> Self {
        Self {
            particles: Vec::new(),
            settings,
            bounds: SurfaceDimensions::default(),
            rng,
        }
    }

    /// A field over an explicit particle set.
    pub fn from_particles(settings: FieldSettings, bounds: SurfaceDimensions, particles: Vec<Particle>) -> Self {
        let mut field = Self::with_seed(settings, 0);
        field.bounds = bounds;
        field.particles = particles;
        field
    }

    /// Discard everything and spawn exactly `count` particles over `bounds`.
    pub fn init(&mut self, count: usize, bounds: SurfaceDimensions) {
        self.bounds = bounds;
        self.particles.clear();
        self.particles.reserve(count);
        for _ in 0..count {
            let particle = Particle::spawn(&mut self.rng, bounds, &self.settings, None);
            self.particles.push(particle);
        }
    }

    /// Re-seed for a surface, applying the narrow-viewport count reduction.
    /// Returns the number of particles spawned.
    pub fn reseed(&mut self, bounds: SurfaceDimensions, viewport_width: f32) -> usize {
        let count = self.settings.count_for_viewport(viewport_width);
        self.init(count, bounds);
        count
    }

    /// Step and draw every particle, in collection order.
    pub fn update_all<S: DrawSurface + ?Sized>(&mut self, pointer: Option<&Pointer>, surface: &mut S) {
        let color = self.settings.palette.particle;
        for particle in &mut self.particles {
            particle.update(pointer, self.bounds, &self.settings);
            particle.draw(surface, color);
        }
    }

    /// Stroke a link for every unordered pair closer than `line_distance`.
    pub fn draw_links<S: DrawSurface + ?Sized>(&self, surface: &mut S) {
        let threshold = self.settings.line_distance;
        let base = self.settings.palette.link;
        let scale = self.settings.link_max_opacity;
        let width = self.settings.line_width;

        for (i, a) in self.particles.iter().enumerate() {
            for b in &self.particles[i + 1..] {
                let distance = a.position.distance(b.position);
                if let Some(opacity) = link_opacity(distance, threshold) {
                    surface.stroke_line(a.position, b.position, width, base.with_alpha(opacity * scale));
                }
            }
        }
    }

    /// Stroke a link from each particle within the pointer's radius to the pointer.
    pub fn draw_pointer_links<S: DrawSurface + ?Sized>(&self, pointer: Option<&Pointer>, surface: &mut S) {
        let Some(pointer) = pointer else {
            return;
        };
        let base = self.settings.palette.pointer_link;
        let scale = self.settings.pointer_link_max_opacity;
        let width = self.settings.line_width;

        for particle in &self.particles {
            let distance = particle.position.distance(pointer.position);
            if let Some(opacity) = link_opacity(distance, pointer.radius) {
                surface.stroke_line(particle.position, pointer.position, width, base.with_alpha(opacity * scale));
            }
        }
    }

    /// Number of pairs the link pass will stroke right now.
    pub fn link_count(&self) -> usize {
        let threshold = self.settings.line_distance;
        let positions: Vec<Vec2> = self.particles.iter().map(|p| p.position).collect();
        let mut count = 0;
        for (i, a) in positions.iter().enumerate() {
            count += positions[i + 1..]
                .iter()
                .filter(|b| a.distance(**b) < threshold)
                .count();
        }
        count
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn bounds(&self) -> SurfaceDimensions {
        self.bounds
    }

    pub fn settings(&self) -> &FieldSettings {
        &self.settings
    }
}
