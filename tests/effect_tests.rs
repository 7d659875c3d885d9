//! Integration tests for the assembled effect: startup, event routing and
//! the frame loop under visibility changes.

use driftfield::{
    ContainerHost, FieldSettings, FrameScheduler, ManualScheduler, ParticleEffect, ParticleField, PointerEvent,
    RecordingSurface, SurfaceDimensions, Vec2,
};

struct TestPage {
    container: Option<SurfaceDimensions>,
    viewport: f32,
    hidden: bool,
    applied: Vec<SurfaceDimensions>,
}

impl TestPage {
    fn new(width: f32, height: f32) -> Self {
        Self {
            container: Some(SurfaceDimensions::new(width, height)),
            viewport: width,
            hidden: false,
            applied: Vec::new(),
        }
    }
}

impl ContainerHost for TestPage {
    fn container_size(&self) -> Option<SurfaceDimensions> {
        self.container
    }

    fn container_origin(&self) -> Vec2 {
        Vec2::new(0.0, 80.0)
    }

    fn viewport_width(&self) -> f32 {
        self.viewport
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn apply_surface_size(&mut self, dims: SurfaceDimensions) {
        self.applied.push(dims);
    }
}

fn started(page: &mut TestPage, scheduler: &mut ManualScheduler) -> ParticleEffect {
    let field = ParticleField::with_seed(FieldSettings::default(), 2024);
    ParticleEffect::start(field, page, scheduler).expect("container present")
}

/// Fire every frame the scheduler has queued, up to `limit`, and return how
/// many actually ticked the effect.
fn pump(effect: &mut ParticleEffect, scheduler: &mut ManualScheduler, limit: usize) -> usize {
    let mut surface = RecordingSurface::new();
    let mut ticked = 0;
    for _ in 0..limit {
        let Some(fired) = scheduler.fire_next() else {
            break;
        };
        if effect.handle_frame(fired, scheduler, &mut surface) {
            ticked += 1;
        }
        surface.clear_history();
    }
    ticked
}

#[test]
fn test_startup_sizes_surface_then_seeds() {
    let mut page = TestPage::new(1024.0, 420.0);
    let mut scheduler = ManualScheduler::new();
    let effect = started(&mut page, &mut scheduler);

    assert_eq!(page.applied, vec![SurfaceDimensions::new(1024.0, 420.0)]);
    assert_eq!(effect.dimensions(), SurfaceDimensions::new(1024.0, 420.0));
    assert_eq!(effect.field().len(), 80);
    assert_eq!(scheduler.outstanding(), 1);
}

#[test]
fn test_missing_container_is_silent_noop() {
    let mut page = TestPage::new(1024.0, 420.0);
    page.container = None;
    let mut scheduler = ManualScheduler::new();
    let field = ParticleField::with_seed(FieldSettings::default(), 1);

    assert!(ParticleEffect::start(field, &mut page, &mut scheduler).is_none());
    assert!(page.applied.is_empty());
    assert_eq!(scheduler.requested(), 0);
}

#[test]
fn test_loop_runs_one_tick_per_frame() {
    let mut page = TestPage::new(800.0, 400.0);
    let mut scheduler = ManualScheduler::new();
    let mut effect = started(&mut page, &mut scheduler);

    assert_eq!(pump(&mut effect, &mut scheduler, 30), 30);
    assert_eq!(effect.ticks(), 30);
    // Each tick re-arms exactly one frame.
    assert_eq!(scheduler.outstanding(), 1);
}

#[test]
fn test_hidden_stops_ticks_and_restore_resumes_once() {
    let mut page = TestPage::new(800.0, 400.0);
    let mut scheduler = ManualScheduler::new();
    let mut effect = started(&mut page, &mut scheduler);
    pump(&mut effect, &mut scheduler, 5);

    effect.handle_visibility(true, &mut scheduler);
    assert_eq!(scheduler.outstanding(), 0);
    assert_eq!(pump(&mut effect, &mut scheduler, 10), 0);
    assert_eq!(effect.ticks(), 5);

    // Restoring twice in a row still yields a single loop.
    effect.handle_visibility(false, &mut scheduler);
    effect.handle_visibility(false, &mut scheduler);
    assert_eq!(scheduler.outstanding(), 1);

    assert_eq!(pump(&mut effect, &mut scheduler, 10), 10);
    assert_eq!(effect.ticks(), 15);
    assert_eq!(scheduler.outstanding(), 1);
}

#[test]
fn test_stale_frame_is_ignored() {
    let mut page = TestPage::new(800.0, 400.0);
    let mut scheduler = ManualScheduler::new();
    let mut effect = started(&mut page, &mut scheduler);

    let stale = effect.pending_frame().expect("armed");
    effect.handle_visibility(true, &mut scheduler);
    effect.handle_visibility(false, &mut scheduler);

    let mut surface = RecordingSurface::new();
    assert!(!effect.handle_frame(stale, &mut scheduler, &mut surface));
    assert!(surface.is_empty());
    assert_eq!(effect.ticks(), 0);
    assert_eq!(scheduler.outstanding(), 1);
}

#[test]
fn test_resize_reseeds_for_new_viewport() {
    let mut page = TestPage::new(1280.0, 480.0);
    let mut scheduler = ManualScheduler::new();
    let mut effect = started(&mut page, &mut scheduler);
    assert_eq!(effect.field().len(), 80);

    page.container = Some(SurfaceDimensions::new(767.0, 600.0));
    page.viewport = 767.0;
    assert_eq!(effect.handle_resize(&mut page), Some(40));
    assert_eq!(effect.field().len(), 40);
    assert_eq!(effect.dimensions(), SurfaceDimensions::new(767.0, 600.0));

    page.container = Some(SurfaceDimensions::new(768.0, 600.0));
    page.viewport = 768.0;
    assert_eq!(effect.handle_resize(&mut page), Some(80));
    assert_eq!(page.applied.len(), 3);
}

#[test]
fn test_pointer_lifecycle_drives_pointer_links() {
    let mut page = TestPage::new(800.0, 400.0);
    let mut scheduler = ManualScheduler::new();
    let mut effect = started(&mut page, &mut scheduler);
    let mut surface = RecordingSurface::new();

    assert!(effect.handle_pointer(
        &PointerEvent::TouchMove {
            touches: vec![Vec2::new(400.0, 280.0), Vec2::new(10.0, 90.0)],
        },
        &page,
    ));
    let pointer = effect.pointer().expect("active");
    assert_eq!(pointer.position, Vec2::new(400.0, 200.0));
    assert_eq!(pointer.radius, 150.0);

    let fired = scheduler.fire_next().expect("armed");
    effect.handle_frame(fired, &mut scheduler, &mut surface);
    let cyan = FieldSettings::default().palette.pointer_link;
    let to_pointer = surface
        .lines()
        .iter()
        .filter(|(_, to, c)| *to == pointer.position && (c.r, c.g, c.b) == (cyan.r, cyan.g, cyan.b))
        .count();
    assert!(to_pointer > 0);

    assert!(effect.handle_pointer(&PointerEvent::TouchEnd, &page));
    assert!(effect.pointer().is_none());

    surface.clear_history();
    let fired = scheduler.fire_next().expect("re-armed");
    effect.handle_frame(fired, &mut scheduler, &mut surface);
    assert!(surface
        .lines()
        .iter()
        .all(|(_, _, c)| (c.r, c.g, c.b) != (cyan.r, cyan.g, cyan.b)));
}

#[test]
fn test_cancel_of_unknown_handle_is_harmless() {
    let mut scheduler = ManualScheduler::new();
    let handle = scheduler.request_frame().expect("manual scheduler always grants");
    scheduler.cancel_frame(driftfield::FrameHandle(handle.0 + 100));
    assert_eq!(scheduler.outstanding(), 1);
    assert_eq!(scheduler.cancelled(), 0);
}
