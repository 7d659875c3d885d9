//! Pointer tracking for mouse and touch input.
//!
//! The tracker is a two-state machine. Move and touch-move events put it in
//! the active state with container-relative coordinates; leave and touch-end
//! put it back to inactive. Hosts translate their native events into
//! [`PointerEvent`]s carrying absolute viewport coordinates together with the
//! container's top-left corner.

use glam::Vec2;

/// Pointer snapshot handed to the field each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    /// Container-relative position.
    pub position: Vec2,
    /// Interaction radius.
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PointerState {
    #[default]
    Inactive,
    Active(Vec2),
}

/// Input events, in absolute viewport coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Move { client: Vec2 },
    Leave,
    /// Active touch points, in the order the host reports them.
    TouchMove { touches: Vec<Vec2> },
    TouchEnd,
}

#[derive(Debug, Clone)]
pub struct PointerTracker {
    state: PointerState,
    radius: f32,
}

impl PointerTracker {
    pub fn new(radius: f32) -> Self {
        Self {
            state: PointerState::Inactive,
            radius,
        }
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, PointerState::Active(_))
    }

    /// Current pointer, or `None` while inactive.
    pub fn pointer(&self) -> Option<Pointer> {
        match self.state {
            PointerState::Active(position) => Some(Pointer {
                position,
                radius: self.radius,
            }),
            PointerState::Inactive => None,
        }
    }

    /// Apply an event. `container_origin` is the tracked container's top-left
    /// corner in the same coordinate space as the event.
    ///
    /// Returns whether the state changed.
    pub fn handle(&mut self, event: &PointerEvent, container_origin: Vec2) -> bool {
        let next = match event {
            PointerEvent::Move { client } => self.activate(*client, container_origin),
            PointerEvent::TouchMove { touches } => match touches.first() {
                Some(first) => self.activate(*first, container_origin),
                None => None,
            },
            PointerEvent::Leave | PointerEvent::TouchEnd => Some(PointerState::Inactive),
        };

        match next {
            Some(state) if state != self.state => {
                log::trace!("pointer {:?} -> {:?}", self.state, state);
                self.state = state;
                true
            }
            _ => false,
        }
    }

    fn activate(&self, client: Vec2, origin: Vec2) -> Option<PointerState> {
        let local = client - origin;
        // Garbage coordinates never reach the field.
        local.is_finite().then_some(PointerState::Active(local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_inactive() {
        let tracker = PointerTracker::new(150.0);
        assert_eq!(tracker.state(), PointerState::Inactive);
        assert!(tracker.pointer().is_none());
    }

    #[test]
    fn test_move_is_container_relative() {
        let mut tracker = PointerTracker::new(150.0);
        let changed = tracker.handle(
            &PointerEvent::Move {
                client: Vec2::new(120.0, 80.0),
            },
            Vec2::new(20.0, 30.0),
        );
        assert!(changed);
        assert_eq!(
            tracker.pointer(),
            Some(Pointer {
                position: Vec2::new(100.0, 50.0),
                radius: 150.0
            })
        );
    }

    #[test]
    fn test_leave_and_touch_end_deactivate() {
        let mut tracker = PointerTracker::new(150.0);
        let origin = Vec2::ZERO;
        tracker.handle(&PointerEvent::Move { client: Vec2::ONE }, origin);
        assert!(tracker.handle(&PointerEvent::Leave, origin));
        assert!(!tracker.is_active());

        tracker.handle(
            &PointerEvent::TouchMove {
                touches: vec![Vec2::ONE],
            },
            origin,
        );
        assert!(tracker.handle(&PointerEvent::TouchEnd, origin));
        assert!(!tracker.is_active());

        // Already inactive: no transition.
        assert!(!tracker.handle(&PointerEvent::Leave, origin));
    }

    #[test]
    fn test_touch_uses_first_point_only() {
        let mut tracker = PointerTracker::new(150.0);
        tracker.handle(
            &PointerEvent::TouchMove {
                touches: vec![Vec2::new(10.0, 10.0), Vec2::new(500.0, 500.0)],
            },
            Vec2::new(5.0, 5.0),
        );
        assert_eq!(tracker.state(), PointerState::Active(Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn test_empty_touch_list_is_ignored() {
        let mut tracker = PointerTracker::new(150.0);
        tracker.handle(&PointerEvent::Move { client: Vec2::ONE }, Vec2::ZERO);
        let changed = tracker.handle(&PointerEvent::TouchMove { touches: vec![] }, Vec2::ZERO);
        assert!(!changed);
        assert_eq!(tracker.state(), PointerState::Active(Vec2::ONE));
    }

    #[test]
    fn test_non_finite_coordinates_ignored() {
        let mut tracker = PointerTracker::new(150.0);
        let changed = tracker.handle(
            &PointerEvent::Move {
                client: Vec2::new(f32::NAN, 1.0),
            },
            Vec2::ZERO,
        );
        assert!(!changed);
        assert!(!tracker.is_active());
    }
}
