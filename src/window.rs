//! Native host: a winit window rendering the field through [`GpuCanvas`].
//!
//! The window itself is the container. Cursor and touch events become
//! pointer events, occlusion and minimizing suspend the loop, and
//! `RedrawRequested` is the "next animation frame" that the loop schedules.

use std::sync::Arc;

use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{TouchPhase, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::config::FieldSettings;
use crate::effect::ParticleEffect;
use crate::error::RunError;
use crate::field::ParticleField;
use crate::gpu::GpuCanvas;
use crate::pointer::PointerEvent;
use crate::render_loop::{FrameHandle, FrameScheduler};
use crate::sizer::{ContainerHost, SurfaceDimensions};
use crate::time::FrameClock;

const TITLE: &str = "driftfield";

/// Frame scheduling on top of `Window::request_redraw`.
///
/// winit cannot retract a redraw once requested, so cancelling only forgets
/// the handle; the effect ignores the redraw when it arrives.
#[derive(Default)]
struct RedrawScheduler {
    window: Option<Arc<Window>>,
    next_id: u64,
    pending: Option<FrameHandle>,
}

impl RedrawScheduler {
    fn take_pending(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }
}

impl FrameScheduler for RedrawScheduler {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        let window = self.window.as_ref()?;
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        window.request_redraw();
        Some(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

/// The window seen as the effect's container.
struct WindowHost<'a> {
    window: &'a Window,
    canvas: &'a mut GpuCanvas,
    hidden: bool,
}

impl ContainerHost for WindowHost<'_> {
    fn container_size(&self) -> Option<SurfaceDimensions> {
        let size = self.window.inner_size();
        Some(SurfaceDimensions::new(size.width as f32, size.height as f32))
    }

    fn container_origin(&self) -> Vec2 {
        Vec2::ZERO
    }

    fn viewport_width(&self) -> f32 {
        let logical = self.window.inner_size().to_logical::<f64>(self.window.scale_factor());
        logical.width as f32
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn apply_surface_size(&mut self, dims: SurfaceDimensions) {
        self.canvas.resize(dims.width as u32, dims.height as u32);
    }
}

struct App {
    settings: FieldSettings,
    seed: Option<u64>,
    window: Option<Arc<Window>>,
    canvas: Option<GpuCanvas>,
    effect: Option<ParticleEffect>,
    scheduler: RedrawScheduler,
    clock: FrameClock,
    primary_touch: Option<u64>,
    occluded: bool,
    minimized: bool,
    error: Option<RunError>,
}

impl App {
    fn new(settings: FieldSettings, seed: Option<u64>) -> Self {
        Self {
            settings,
            seed,
            window: None,
            canvas: None,
            effect: None,
            scheduler: RedrawScheduler::default(),
            clock: FrameClock::new(),
            primary_touch: None,
            occluded: false,
            minimized: false,
            error: None,
        }
    }

    fn hidden(&self) -> bool {
        self.occluded || self.minimized
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), RunError> {
        let window_attrs = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 480));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let mut canvas = pollster::block_on(GpuCanvas::new(window.clone(), self.settings.palette.background))?;
        self.scheduler.window = Some(window.clone());

        let field = match self.seed {
            Some(seed) => ParticleField::with_seed(self.settings.clone(), seed),
            None => ParticleField::new(self.settings.clone()),
        };
        let mut host = WindowHost {
            window: &window,
            canvas: &mut canvas,
            hidden: self.hidden(),
        };
        self.effect = ParticleEffect::start(field, &mut host, &mut self.scheduler);

        self.window = Some(window);
        self.canvas = Some(canvas);
        Ok(())
    }

    fn pointer(&mut self, event: PointerEvent) {
        let (Some(effect), Some(window), Some(canvas)) =
            (self.effect.as_mut(), self.window.as_ref(), self.canvas.as_mut())
        else {
            return;
        };
        let host = WindowHost {
            window,
            canvas,
            hidden: self.occluded || self.minimized,
        };
        effect.handle_pointer(&event, &host);
    }

    fn visibility_changed(&mut self) {
        let hidden = self.hidden();
        if let Some(effect) = self.effect.as_mut() {
            effect.handle_visibility(hidden, &mut self.scheduler);
        }
        if !hidden {
            self.clock.resume();
        }
    }

    fn resized(&mut self, size: PhysicalSize<u32>) {
        let minimized = size.width == 0 || size.height == 0;
        if minimized != self.minimized {
            self.minimized = minimized;
            self.visibility_changed();
        }
        if minimized {
            return;
        }
        let hidden = self.hidden();
        let (Some(effect), Some(window), Some(canvas)) =
            (self.effect.as_mut(), self.window.as_ref(), self.canvas.as_mut())
        else {
            return;
        };
        let mut host = WindowHost { window, canvas, hidden };
        effect.handle_resize(&mut host);
    }

    fn touch(&mut self, id: u64, phase: TouchPhase, location: Vec2) {
        match phase {
            TouchPhase::Started | TouchPhase::Moved => {
                let primary = *self.primary_touch.get_or_insert(id);
                if primary == id {
                    self.pointer(PointerEvent::TouchMove {
                        touches: vec![location],
                    });
                }
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                if self.primary_touch == Some(id) {
                    self.primary_touch = None;
                    self.pointer(PointerEvent::TouchEnd);
                }
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(fired) = self.scheduler.take_pending() else {
            return;
        };
        let (Some(effect), Some(canvas)) = (self.effect.as_mut(), self.canvas.as_mut()) else {
            return;
        };
        if !effect.handle_frame(fired, &mut self.scheduler, &mut *canvas) {
            return;
        }

        match canvas.present() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost; reconfiguring");
                canvas.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory; exiting");
                event_loop.exit();
            }
            Err(e) => log::warn!("render error: {:?}", e),
        }

        if self.clock.tick() {
            log::debug!("{:.1} fps, {} particles", self.clock.fps(), effect.field().len());
            if let Some(window) = &self.window {
                window.set_title(&format!("{} - {:.0} fps", TITLE, self.clock.fps()));
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                log::error!("{}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                self.resized(physical_size);
            }
            WindowEvent::Occluded(occluded) => {
                if occluded != self.occluded {
                    self.occluded = occluded;
                    self.visibility_changed();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer(PointerEvent::Move {
                    client: Vec2::new(position.x as f32, position.y as f32),
                });
            }
            WindowEvent::CursorLeft { .. } => {
                self.pointer(PointerEvent::Leave);
            }
            WindowEvent::Touch(touch) => {
                let location = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                self.touch(touch.id, touch.phase, location);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }
}

/// Open a window and run the field until it is closed.
pub fn run(settings: FieldSettings, seed: Option<u64>) -> Result<(), RunError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(settings, seed);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
