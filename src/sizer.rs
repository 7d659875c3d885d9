//! Drawing-surface sizing against the host container.

use glam::Vec2;

/// Width and height of the drawing surface, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceDimensions {
    pub width: f32,
    pub height: f32,
}

impl SurfaceDimensions {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Negative or non-finite extents collapse to zero.
    pub fn sanitized(self) -> Self {
        let clean = |v: f32| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        Self::new(clean(self.width), clean(self.height))
    }

    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// What the effect needs from the page or window hosting it.
pub trait ContainerHost {
    /// Rendered box of the container, or `None` if it does not exist.
    fn container_size(&self) -> Option<SurfaceDimensions>;

    /// Top-left of the container in the coordinate space of pointer events.
    fn container_origin(&self) -> Vec2;

    /// Logical viewport width, used for the narrow-viewport rule.
    fn viewport_width(&self) -> f32;

    /// Whether the page or window is currently hidden.
    fn is_hidden(&self) -> bool {
        false
    }

    /// Resize the drawing surface's backing store.
    fn apply_surface_size(&mut self, dims: SurfaceDimensions);
}

/// Tracks the current surface dimensions.
#[derive(Debug, Clone, Default)]
pub struct SurfaceSizer {
    dims: SurfaceDimensions,
}

impl SurfaceSizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dimensions(&self) -> SurfaceDimensions {
        self.dims
    }

    /// Read the container box and apply it to the surface.
    ///
    /// Returns `None` (leaving the previous dimensions in place) when the
    /// container is missing.
    pub fn resize<H: ContainerHost + ?Sized>(&mut self, host: &mut H) -> Option<SurfaceDimensions> {
        let dims = host.container_size()?.sanitized();
        host.apply_surface_size(dims);
        if dims != self.dims {
            log::debug!(
                "surface resized {}x{} -> {}x{}",
                self.dims.width,
                self.dims.height,
                dims.width,
                dims.height
            );
        }
        self.dims = dims;
        Some(dims)
    }
}
