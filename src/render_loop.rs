//! Frame cadence and visibility-driven suspension.
//!
//! The loop never owns a thread. A host-provided [`FrameScheduler`] asks the
//! platform for "call me on the next display refresh" and can revoke that
//! request. [`RenderLoop`] keeps at most one request outstanding, so
//! resuming after the page comes back never stacks a second loop. A frame
//! that fires with a handle the loop no longer expects is ignored, which
//! covers hosts whose cancel cannot retract a callback already in flight.

use std::collections::VecDeque;

use crate::field::ParticleField;
use crate::pointer::Pointer;
use crate::sizer::SurfaceDimensions;
use crate::surface::DrawSurface;

/// Opaque identifier of a scheduled frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Platform primitive for "run once on the next frame".
pub trait FrameScheduler {
    /// Request a frame. `None` means the platform refused; the loop then
    /// stays idle until the next resume.
    fn request_frame(&mut self) -> Option<FrameHandle>;

    /// Revoke a previously requested frame.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// One full frame: clear, step and draw particles, links, pointer links.
pub fn render_frame<S: DrawSurface + ?Sized>(
    field: &mut ParticleField,
    pointer: Option<&Pointer>,
    dims: SurfaceDimensions,
    surface: &mut S,
) {
    surface.clear_rect(0.0, 0.0, dims.width, dims.height);
    field.update_all(pointer, surface);
    field.draw_links(surface);
    field.draw_pointer_links(pointer, surface);
}

#[derive(Debug, Default)]
pub struct RenderLoop {
    pending: Option<FrameHandle>,
    hidden: bool,
    ticks: u64,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// The frame the loop is waiting for, if any.
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Frames run since creation.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Arm the loop unless it is hidden or already armed.
    pub fn start<F: FrameScheduler + ?Sized>(&mut self, scheduler: &mut F) {
        if self.hidden || self.pending.is_some() {
            return;
        }
        self.pending = scheduler.request_frame();
        if self.pending.is_none() {
            log::warn!("frame request refused; render loop idle");
        }
    }

    /// Revoke the pending frame, if any.
    pub fn stop<F: FrameScheduler + ?Sized>(&mut self, scheduler: &mut F) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel_frame(handle);
        }
    }

    /// React to a visibility change: suspend when hidden, resume when shown.
    pub fn set_hidden<F: FrameScheduler + ?Sized>(&mut self, hidden: bool, scheduler: &mut F) {
        if hidden == self.hidden {
            return;
        }
        self.hidden = hidden;
        if hidden {
            log::debug!("render loop suspended after {} ticks", self.ticks);
            self.stop(scheduler);
        } else {
            log::debug!("render loop resumed");
            self.start(scheduler);
        }
    }

    /// Handle a fired frame: run `frame` and reschedule.
    ///
    /// Returns `false` without running anything when `fired` is not the
    /// pending handle.
    pub fn on_frame<F, R>(&mut self, fired: FrameHandle, scheduler: &mut F, frame: R) -> bool
    where
        F: FrameScheduler + ?Sized,
        R: FnOnce(),
    {
        if self.pending != Some(fired) {
            log::trace!("ignoring stale frame {:?}", fired);
            return false;
        }
        self.pending = None;
        frame();
        self.ticks += 1;
        self.start(scheduler);
        true
    }
}

/// A scheduler driven by hand: frames fire only when told to.
///
/// Used by headless rendering and tests.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    queue: VecDeque<FrameHandle>,
    requested: u64,
    cancelled: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the oldest outstanding request.
    pub fn fire_next(&mut self) -> Option<FrameHandle> {
        self.queue.pop_front()
    }

    /// Requests not yet fired or cancelled.
    pub fn outstanding(&self) -> usize {
        self.queue.len()
    }

    pub fn requested(&self) -> u64 {
        self.requested
    }

    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        self.next_id += 1;
        self.requested += 1;
        let handle = FrameHandle(self.next_id);
        self.queue.push_back(handle);
        Some(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let before = self.queue.len();
        self.queue.retain(|h| *h != handle);
        if self.queue.len() != before {
            self.cancelled += 1;
        }
    }
}
