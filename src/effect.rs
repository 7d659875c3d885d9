//! The assembled effect: one owner for the field, pointer, sizer and loop.
//!
//! Hosts forward four kinds of events (pointer, resize, visibility, fired
//! frame) and the effect routes them. Everything runs on the host's event
//! thread, one handler at a time, so nothing here is shared or locked.
//!
//! ```ignore
//! let field = ParticleField::new(FieldSettings::default());
//! let Some(mut effect) = ParticleEffect::start(field, &mut host, &mut scheduler) else {
//!     return; // no container, effect disabled
//! };
//!
//! // later, from the host's callbacks:
//! effect.handle_pointer(&event, &host);
//! effect.handle_resize(&mut host);
//! effect.handle_visibility(hidden, &mut scheduler);
//! effect.handle_frame(fired, &mut scheduler, &mut surface);
//! ```

use crate::field::ParticleField;
use crate::pointer::{Pointer, PointerEvent, PointerTracker};
use crate::render_loop::{render_frame, FrameHandle, FrameScheduler, RenderLoop};
use crate::sizer::{ContainerHost, SurfaceDimensions, SurfaceSizer};
use crate::surface::DrawSurface;

pub struct ParticleEffect {
    field: ParticleField,
    tracker: PointerTracker,
    sizer: SurfaceSizer,
    render_loop: RenderLoop,
}

impl ParticleEffect {
    /// Size the surface, seed the field and arm the loop.
    ///
    /// Returns `None` when the host has no container; the caller should then
    /// leave the page alone.
    pub fn start<H, F>(mut field: ParticleField, host: &mut H, scheduler: &mut F) -> Option<Self>
    where
        H: ContainerHost + ?Sized,
        F: FrameScheduler + ?Sized,
    {
        let mut sizer = SurfaceSizer::new();
        let Some(dims) = sizer.resize(host) else {
            log::info!("particle container not found; effect disabled");
            return None;
        };

        let count = field.reseed(dims, host.viewport_width());
        log::info!(
            "particle field seeded with {} particles on {}x{}",
            count,
            dims.width,
            dims.height
        );

        let tracker = PointerTracker::new(field.settings().pointer_radius);
        let mut render_loop = RenderLoop::new();
        if host.is_hidden() {
            render_loop.set_hidden(true, scheduler);
        }
        render_loop.start(scheduler);

        Some(Self {
            field,
            tracker,
            sizer,
            render_loop,
        })
    }

    /// Forward a pointer or touch event. Returns whether the pointer state changed.
    pub fn handle_pointer<H: ContainerHost + ?Sized>(&mut self, event: &PointerEvent, host: &H) -> bool {
        self.tracker.handle(event, host.container_origin())
    }

    /// Re-read the container box and re-seed the whole field.
    ///
    /// Returns the new particle count, or `None` if the container vanished.
    pub fn handle_resize<H: ContainerHost + ?Sized>(&mut self, host: &mut H) -> Option<usize> {
        let dims = self.sizer.resize(host)?;
        let count = self.field.reseed(dims, host.viewport_width());
        log::debug!("reseeded {} particles on {}x{}", count, dims.width, dims.height);
        Some(count)
    }

    pub fn handle_visibility<F: FrameScheduler + ?Sized>(&mut self, hidden: bool, scheduler: &mut F) {
        self.render_loop.set_hidden(hidden, scheduler);
    }

    /// Run the frame `fired` if it is the one the loop is waiting for.
    pub fn handle_frame<F, S>(&mut self, fired: FrameHandle, scheduler: &mut F, surface: &mut S) -> bool
    where
        F: FrameScheduler + ?Sized,
        S: DrawSurface + ?Sized,
    {
        let pointer = self.tracker.pointer();
        let dims = self.sizer.dimensions();
        let field = &mut self.field;
        self.render_loop.on_frame(fired, scheduler, || {
            render_frame(field, pointer.as_ref(), dims, surface);
        })
    }

    /// The frame the loop is waiting for, if any.
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.render_loop.pending()
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut ParticleField {
        &mut self.field
    }

    pub fn pointer(&self) -> Option<Pointer> {
        self.tracker.pointer()
    }

    pub fn dimensions(&self) -> SurfaceDimensions {
        self.sizer.dimensions()
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render_loop
    }

    pub fn ticks(&self) -> u64 {
        self.render_loop.ticks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldSettings;
    use crate::render_loop::ManualScheduler;
    use crate::surface::RecordingSurface;
    use glam::Vec2;

    struct PageHost {
        container: Option<SurfaceDimensions>,
        origin: Vec2,
        viewport: f32,
        hidden: bool,
    }

    impl ContainerHost for PageHost {
        fn container_size(&self) -> Option<SurfaceDimensions> {
            self.container
        }

        fn container_origin(&self) -> Vec2 {
            self.origin
        }

        fn viewport_width(&self) -> f32 {
            self.viewport
        }

        fn is_hidden(&self) -> bool {
            self.hidden
        }

        fn apply_surface_size(&mut self, _dims: SurfaceDimensions) {}
    }

    fn page(width: f32) -> PageHost {
        PageHost {
            container: Some(SurfaceDimensions::new(width, 500.0)),
            origin: Vec2::new(0.0, 64.0),
            viewport: width,
            hidden: false,
        }
    }

    #[test]
    fn test_missing_container_disables() {
        let mut host = page(1024.0);
        host.container = None;
        let mut scheduler = ManualScheduler::new();
        let field = ParticleField::with_seed(FieldSettings::default(), 1);
        assert!(ParticleEffect::start(field, &mut host, &mut scheduler).is_none());
        assert_eq!(scheduler.requested(), 0);
    }

    #[test]
    fn test_start_seeds_and_arms() {
        let mut host = page(1024.0);
        let mut scheduler = ManualScheduler::new();
        let field = ParticleField::with_seed(FieldSettings::default(), 1);
        let effect = ParticleEffect::start(field, &mut host, &mut scheduler).unwrap();
        assert_eq!(effect.field().len(), 80);
        assert_eq!(scheduler.outstanding(), 1);
        assert!(effect.pending_frame().is_some());
    }

    #[test]
    fn test_hidden_at_startup_waits_for_visibility() {
        let mut host = page(1024.0);
        host.hidden = true;
        let mut scheduler = ManualScheduler::new();
        let field = ParticleField::with_seed(FieldSettings::default(), 1);
        let mut effect = ParticleEffect::start(field, &mut host, &mut scheduler).unwrap();
        assert_eq!(scheduler.outstanding(), 0);

        effect.handle_visibility(false, &mut scheduler);
        assert_eq!(scheduler.outstanding(), 1);
    }

    #[test]
    fn test_pointer_is_container_relative() {
        let mut host = page(1024.0);
        let mut scheduler = ManualScheduler::new();
        let field = ParticleField::with_seed(FieldSettings::default(), 1);
        let mut effect = ParticleEffect::start(field, &mut host, &mut scheduler).unwrap();

        effect.handle_pointer(
            &PointerEvent::Move {
                client: Vec2::new(300.0, 100.0),
            },
            &host,
        );
        assert_eq!(effect.pointer().unwrap().position, Vec2::new(300.0, 36.0));
    }

    #[test]
    fn test_frame_clears_full_surface() {
        let mut host = page(640.0);
        let mut scheduler = ManualScheduler::new();
        let field = ParticleField::with_seed(FieldSettings::default(), 1);
        let mut effect = ParticleEffect::start(field, &mut host, &mut scheduler).unwrap();

        let mut surface = RecordingSurface::new();
        let fired = scheduler.fire_next().unwrap();
        assert!(effect.handle_frame(fired, &mut scheduler, &mut surface));
        assert_eq!(
            surface.commands()[0],
            crate::surface::DrawCommand::Clear {
                x: 0.0,
                y: 0.0,
                width: 640.0,
                height: 500.0
            }
        );
        assert_eq!(surface.circles().len(), 40);
        assert_eq!(effect.ticks(), 1);
    }
}
