//! # driftfield - pointer-reactive particle backdrop
//!
//! A field of slowly drifting dots that link to their neighbours with faint
//! lines, swell and scatter away from the pointer, and draw brighter links to
//! it. Built to sit behind a page header, but host-agnostic: the field draws
//! through [`DrawSurface`] and asks a [`FrameScheduler`] for frames, so the
//! same code runs in a browser canvas, a winit window, or headless.
//!
//! ## Quick Start
//!
//! ```ignore
//! use driftfield::prelude::*;
//!
//! let settings = FieldSettings::default().with_particle_count(120);
//! let field = ParticleField::new(settings);
//!
//! // `host` implements ContainerHost, `scheduler` implements FrameScheduler.
//! let mut effect = ParticleEffect::start(field, &mut host, &mut scheduler)
//!     .expect("container present");
//!
//! // From the host's callbacks:
//! effect.handle_pointer(&PointerEvent::Move { client: Vec2::new(40.0, 80.0) }, &host);
//! effect.handle_frame(fired, &mut scheduler, &mut surface);
//! ```
//!
//! ## Frame Anatomy
//!
//! Each frame clears the surface, then:
//!
//! 1. updates every particle (pointer repulsion, size relaxation, drift,
//!    edge wrapping) and draws it;
//! 2. links every pair of particles closer than `line_distance`, fading
//!    linearly with distance;
//! 3. links the pointer to every particle within `pointer_radius`.
//!
//! ## Hosts
//!
//! | Host | Surface | Scheduler |
//! |------|---------|-----------|
//! | Browser (`wasm32`) | 2D canvas context | `requestAnimationFrame` |
//! | Native window | [`GpuCanvas`](gpu::GpuCanvas) | winit redraw requests |
//! | Headless | [`ImageSurface`] | [`ManualScheduler`] |
//!
//! The [`scroll`] module carries the small page helpers that usually ship
//! next to the header: smooth anchor scrolling, the navbar style switch and
//! reveal-on-scroll.

pub mod config;
pub mod effect;
pub mod error;
pub mod field;
pub mod particle;
pub mod pointer;
pub mod raster;
pub mod render_loop;
pub mod scroll;
pub mod sizer;
pub mod surface;
pub mod time;

#[cfg(not(target_arch = "wasm32"))]
pub mod gpu;
#[cfg(not(target_arch = "wasm32"))]
pub mod window;

#[cfg(target_arch = "wasm32")]
mod web;

pub use config::{FieldSettings, Palette};
pub use effect::ParticleEffect;
pub use error::{ConfigError, SnapshotError};
pub use field::ParticleField;
pub use glam::Vec2;
pub use particle::Particle;
pub use pointer::{Pointer, PointerEvent, PointerState, PointerTracker};
pub use raster::ImageSurface;
pub use render_loop::{FrameHandle, FrameScheduler, ManualScheduler, RenderLoop};
pub use sizer::{ContainerHost, SurfaceDimensions, SurfaceSizer};
pub use surface::{DrawSurface, RecordingSurface, Rgba};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use driftfield::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{FieldSettings, Palette};
    pub use crate::effect::ParticleEffect;
    pub use crate::field::ParticleField;
    pub use crate::pointer::PointerEvent;
    pub use crate::render_loop::{FrameHandle, FrameScheduler};
    pub use crate::sizer::{ContainerHost, SurfaceDimensions};
    pub use crate::surface::{DrawSurface, Rgba};
    pub use crate::Vec2;
}
