//! CPU rasterizer for headless rendering.
//!
//! [`ImageSurface`] draws into an `image::RgbaImage` with straight-alpha
//! "source over" blending and coverage-based anti-aliasing. It is not fast,
//! but it renders a frame of the stock field in well under a frame budget and
//! lets the demo binary write PNG snapshots without a window or GPU.

use std::path::Path;

use glam::Vec2;
use image::{Rgba as Pixel, RgbaImage};

use crate::error::SnapshotError;
use crate::surface::{DrawSurface, Rgba};

pub struct ImageSurface {
    image: RgbaImage,
    background: Rgba,
}

impl ImageSurface {
    /// A surface cleared to `background`.
    pub fn new(width: u32, height: u32, background: Rgba) -> Self {
        let mut surface = Self {
            image: RgbaImage::new(width, height),
            background,
        };
        surface.clear_rect(0.0, 0.0, width as f32, height as f32);
        surface
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Reallocate the backing image, discarding its contents.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width != self.image.width() || height != self.image.height() {
            *self = Self::new(width, height, self.background);
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        if self.image.width() == 0 || self.image.height() == 0 {
            return Err(SnapshotError::EmptySurface);
        }
        self.image.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }

    /// Blend `color` at `coverage` into one pixel.
    fn blend(&mut self, x: i64, y: i64, color: Rgba, coverage: f32) {
        if x < 0 || y < 0 || x >= self.image.width() as i64 || y >= self.image.height() as i64 {
            return;
        }
        let alpha = (color.a * coverage).clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        let dst_a = dst[3] as f32 / 255.0;
        let out_a = alpha + dst_a * (1.0 - alpha);
        if out_a <= 0.0 {
            return;
        }
        let mix = |src: u8, dst: u8| -> u8 {
            let v = (src as f32 * alpha + dst as f32 * dst_a * (1.0 - alpha)) / out_a;
            v.round().clamp(0.0, 255.0) as u8
        };
        *dst = Pixel([
            mix(color.r, dst[0]),
            mix(color.g, dst[1]),
            mix(color.b, dst[2]),
            (out_a * 255.0).round() as u8,
        ]);
    }

    /// Pixel range covering `[lo, hi]`, clipped to `0..limit`.
    fn span(lo: f32, hi: f32, limit: u32) -> std::ops::Range<i64> {
        let start = lo.floor().max(0.0) as i64;
        let end = (hi.ceil() as i64 + 1).min(limit as i64);
        start..end.max(start)
    }
}

impl DrawSurface for ImageSurface {
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let bg = self.background;
        let px = Pixel([bg.r, bg.g, bg.b, (bg.a * 255.0).round() as u8]);
        let xs = Self::span(x, x + width - 1.0, self.image.width());
        let ys = Self::span(y, y + height - 1.0, self.image.height());
        for py in ys {
            for qx in xs.clone() {
                self.image.put_pixel(qx as u32, py as u32, px);
            }
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        if radius.is_nan() || radius <= 0.0 || !center.is_finite() {
            return;
        }
        let xs = Self::span(center.x - radius - 1.0, center.x + radius + 1.0, self.image.width());
        let ys = Self::span(center.y - radius - 1.0, center.y + radius + 1.0, self.image.height());
        for py in ys {
            for px in xs.clone() {
                let pixel_center = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                let coverage = (radius - pixel_center.distance(center) + 0.5).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(px, py, color, coverage);
                }
            }
        }
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        if !from.is_finite() || !to.is_finite() || width.is_nan() || width <= 0.0 {
            return;
        }
        let half = width * 0.5;
        let min = from.min(to) - Vec2::splat(half + 1.0);
        let max = from.max(to) + Vec2::splat(half + 1.0);
        let segment = to - from;
        let length_sq = segment.length_squared();

        for py in Self::span(min.y, max.y, self.image.height()) {
            for px in Self::span(min.x, max.x, self.image.width()) {
                let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                let t = if length_sq > 0.0 {
                    ((p - from).dot(segment) / length_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let distance = p.distance(from + segment * t);
                let coverage = (half - distance + 0.5).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(px, py, color, coverage);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: Rgba = Rgba::rgb(0, 0, 0);

    #[test]
    fn test_new_is_cleared_to_background() {
        let surface = ImageSurface::new(4, 3, Rgba::rgb(10, 20, 30));
        assert!(surface.image().pixels().all(|p| *p == Pixel([10, 20, 30, 255])));
    }

    #[test]
    fn test_circle_paints_center_not_far_pixels() {
        let mut surface = ImageSurface::new(20, 20, BG);
        surface.fill_circle(Vec2::new(10.0, 10.0), 3.0, Rgba::WHITE);
        assert_eq!(surface.image().get_pixel(10, 10)[0], 255);
        assert_eq!(surface.image().get_pixel(0, 0)[0], 0);
        assert_eq!(surface.image().get_pixel(19, 10)[0], 0);
    }

    #[test]
    fn test_translucent_line_blends() {
        let mut surface = ImageSurface::new(20, 5, BG);
        surface.stroke_line(Vec2::new(0.0, 2.5), Vec2::new(20.0, 2.5), 1.0, Rgba::WHITE.with_alpha(0.5));
        let mid = surface.image().get_pixel(10, 2);
        assert!(mid[0] > 100 && mid[0] < 160, "got {:?}", mid);
        assert_eq!(surface.image().get_pixel(10, 0)[0], 0);
    }

    #[test]
    fn test_clear_rect_restores_region() {
        let mut surface = ImageSurface::new(10, 10, BG);
        surface.fill_circle(Vec2::new(5.0, 5.0), 4.0, Rgba::WHITE);
        surface.clear_rect(0.0, 0.0, 10.0, 10.0);
        assert!(surface.image().pixels().all(|p| *p == Pixel([0, 0, 0, 255])));
    }

    #[test]
    fn test_offscreen_and_degenerate_draws_are_ignored() {
        let mut surface = ImageSurface::new(8, 8, BG);
        surface.fill_circle(Vec2::new(-50.0, -50.0), 3.0, Rgba::WHITE);
        surface.fill_circle(Vec2::new(4.0, 4.0), 0.0, Rgba::WHITE);
        surface.stroke_line(Vec2::new(f32::NAN, 0.0), Vec2::ONE, 1.0, Rgba::WHITE);
        assert!(surface.image().pixels().all(|p| *p == Pixel([0, 0, 0, 255])));
    }

    #[test]
    fn test_empty_surface_cannot_be_saved() {
        let surface = ImageSurface::new(0, 0, BG);
        assert!(matches!(
            surface.save_png(std::env::temp_dir().join("driftfield-empty.png")),
            Err(SnapshotError::EmptySurface)
        ));
    }
}
