//! Tunable settings for the particle field.
//!
//! Defaults reproduce the stock header effect. Settings can be built in code
//! with the `with_*` methods or loaded from a JSON file where any missing key
//! falls back to its default:
//!
//! ```ignore
//! let settings = FieldSettings::default()
//!     .with_particle_count(120)
//!     .with_line_distance(100.0);
//!
//! let from_disk = FieldSettings::from_json_file("field.json")?;
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::surface::Rgba;

/// Colours used by the field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Particle fill, alpha included.
    pub particle: Rgba,
    /// Particle-to-particle link colour; alpha is computed per link.
    pub link: Rgba,
    /// Pointer-to-particle link colour; alpha is computed per link.
    pub pointer_link: Rgba,
    /// Clear colour for hosts that cannot present a transparent surface.
    pub background: Rgba,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            particle: Rgba::new(255, 255, 255, 0.6),
            link: Rgba::rgb(255, 255, 255),
            pointer_link: Rgba::rgb(6, 182, 212),
            background: Rgba::rgb(15, 23, 42),
        }
    }
}

/// Everything the field, tracker and sizer read at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSettings {
    /// Particles seeded on a wide viewport.
    pub particle_count: usize,
    /// Lower bound of the spawn radius.
    pub min_size: f32,
    /// Upper bound (exclusive) of the spawn radius.
    pub max_size: f32,
    /// Velocity components are sampled in `±speed / 2`.
    pub speed: f32,
    /// Particles closer than this are linked.
    pub line_distance: f32,
    /// Pointer interaction radius.
    pub pointer_radius: f32,
    /// Viewports narrower than this get the reduced count.
    pub narrow_viewport_width: f32,
    /// Count multiplier applied on narrow viewports.
    pub narrow_count_factor: f32,
    pub link_max_opacity: f32,
    pub pointer_link_max_opacity: f32,
    pub line_width: f32,
    /// Scales the repulsion displacement.
    pub repulsion_damping: f32,
    /// Extra radius at zero distance from the pointer.
    pub size_growth: f32,
    /// Radius lost per tick while relaxing back to the base size.
    pub size_relax_step: f32,
    pub palette: Palette,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            particle_count: 80,
            min_size: 1.0,
            max_size: 3.0,
            speed: 0.3,
            line_distance: 120.0,
            pointer_radius: 150.0,
            narrow_viewport_width: 768.0,
            narrow_count_factor: 0.5,
            link_max_opacity: 0.15,
            pointer_link_max_opacity: 0.4,
            line_width: 1.0,
            repulsion_damping: 0.5,
            size_growth: 2.0,
            size_relax_step: 0.1,
            palette: Palette::default(),
        }
    }
}

impl FieldSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a JSON file and validate them.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse settings from JSON text and validate them.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let settings: FieldSettings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject settings the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            self.min_size,
            self.max_size,
            self.speed,
            self.line_distance,
            self.pointer_radius,
            self.narrow_viewport_width,
            self.narrow_count_factor,
            self.link_max_opacity,
            self.pointer_link_max_opacity,
            self.line_width,
            self.repulsion_damping,
            self.size_growth,
            self.size_relax_step,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::Invalid("all numeric settings must be finite".into()));
        }
        if self.min_size < 0.0 || self.max_size < self.min_size {
            return Err(ConfigError::Invalid(format!(
                "size range [{}, {}) must be non-negative and ordered",
                self.min_size, self.max_size
            )));
        }
        if self.line_distance <= 0.0 {
            return Err(ConfigError::Invalid("line_distance must be positive".into()));
        }
        if self.pointer_radius <= 0.0 {
            return Err(ConfigError::Invalid("pointer_radius must be positive".into()));
        }
        if !(self.narrow_count_factor > 0.0 && self.narrow_count_factor <= 1.0) {
            return Err(ConfigError::Invalid("narrow_count_factor must be in (0, 1]".into()));
        }
        if self.speed < 0.0 || self.size_relax_step <= 0.0 {
            return Err(ConfigError::Invalid(
                "speed must be non-negative and size_relax_step positive".into(),
            ));
        }
        Ok(())
    }

    /// Number of particles to seed for a viewport of the given logical width.
    pub fn count_for_viewport(&self, viewport_width: f32) -> usize {
        if viewport_width < self.narrow_viewport_width {
            (self.particle_count as f32 * self.narrow_count_factor).floor() as usize
        } else {
            self.particle_count
        }
    }

    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.particle_count = count;
        self
    }

    pub fn with_size_range(mut self, min: f32, max: f32) -> Self {
        self.min_size = min;
        self.max_size = max;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_line_distance(mut self, distance: f32) -> Self {
        self.line_distance = distance;
        self
    }

    pub fn with_pointer_radius(mut self, radius: f32) -> Self {
        self.pointer_radius = radius;
        self
    }

    /// Change the narrow-viewport threshold and its count multiplier.
    pub fn with_narrow_viewport(mut self, width: f32, factor: f32) -> Self {
        self.narrow_viewport_width = width;
        self.narrow_count_factor = factor;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(FieldSettings::default().validate().is_ok());
    }

    #[test]
    fn test_narrow_viewport_boundary() {
        let settings = FieldSettings::default();
        assert_eq!(settings.count_for_viewport(767.0), 40);
        assert_eq!(settings.count_for_viewport(768.0), 80);
        assert_eq!(settings.count_for_viewport(1920.0), 80);
    }

    #[test]
    fn test_narrow_count_floors() {
        let settings = FieldSettings::default().with_particle_count(81);
        assert_eq!(settings.count_for_viewport(320.0), 40);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = FieldSettings::from_json_str(r#"{ "particle_count": 12 }"#).unwrap();
        assert_eq!(settings.particle_count, 12);
        assert_eq!(settings.line_distance, 120.0);
        assert_eq!(settings.palette, Palette::default());
    }

    #[test]
    fn test_json_round_trip_keeps_values() {
        let settings = FieldSettings::default().with_pointer_radius(90.0);
        let text = settings.to_json_string().unwrap();
        assert_eq!(FieldSettings::from_json_str(&text).unwrap(), settings);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let inverted = FieldSettings::default().with_size_range(3.0, 1.0);
        assert!(matches!(inverted.validate(), Err(ConfigError::Invalid(_))));

        let no_links = FieldSettings::default().with_line_distance(0.0);
        assert!(no_links.validate().is_err());

        let bad_factor = FieldSettings::default().with_narrow_viewport(768.0, 0.0);
        assert!(bad_factor.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = FieldSettings::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
