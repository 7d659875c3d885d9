//! Page-scroll helpers that sit next to the particle header.
//!
//! These are small state machines with no knowledge of the DOM: smooth
//! scrolling to in-page anchors, a navbar style switch that reacts to scroll
//! offset at most once per frame, and one-way "reveal on first sight"
//! marking. The browser bindings in the `web` module drive them.

use std::collections::HashSet;
use std::hash::Hash;

/// Smooth-scroll duration for anchor links.
pub const SMOOTH_SCROLL_DURATION_MS: f64 = 500.0;
/// Scroll offset beyond which the navbar switches to its scrolled style.
pub const NAVBAR_SCROLL_THRESHOLD: f64 = 50.0;
/// Class added to the navbar past the threshold.
pub const NAVBAR_SCROLLED_CLASS: &str = "scrolled";
/// Class added to elements once they enter the viewport.
pub const REVEAL_CLASS: &str = "visible";
/// Elements opted into reveal-on-scroll.
pub const REVEAL_SELECTOR: &str = ".reveal";

/// Cubic ease-in-out on `[0, 1]`.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Where an in-page link points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorTarget {
    /// `#top`: the start of the document.
    Top,
    /// Any other fragment, kept with its leading `#` so it works as a selector.
    Fragment(String),
}

impl AnchorTarget {
    /// Extract the target from a link's `href`. Links without a fragment, or
    /// with a bare `#`, are not in-page anchors.
    pub fn from_href(href: &str) -> Option<Self> {
        let start = href.find('#')?;
        let hash = &href[start..];
        match hash {
            "#" => None,
            "#top" => Some(AnchorTarget::Top),
            _ => Some(AnchorTarget::Fragment(hash.to_string())),
        }
    }

    /// The fragment to push to history.
    pub fn hash(&self) -> &str {
        match self {
            AnchorTarget::Top => "#top",
            AnchorTarget::Fragment(hash) => hash,
        }
    }
}

/// Document offset of an element, from the `offsetTop` of the element and
/// each of its offset parents.
pub fn document_offset<I: IntoIterator<Item = f64>>(offset_chain: I) -> f64 {
    offset_chain.into_iter().sum()
}

/// An eased scroll from one offset to another.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollAnimation {
    start: f64,
    distance: f64,
    duration_ms: f64,
    started_at: Option<f64>,
}

impl ScrollAnimation {
    pub fn new(start: f64, target: f64, duration_ms: f64) -> Self {
        Self {
            start,
            distance: target - start,
            duration_ms,
            started_at: None,
        }
    }

    /// Offset for a frame at `now_ms`, and whether another frame is needed.
    ///
    /// Timing starts at the first sampled frame.
    pub fn sample(&mut self, now_ms: f64) -> (f64, bool) {
        let started_at = *self.started_at.get_or_insert(now_ms);
        let elapsed = now_ms - started_at;
        let progress = if self.duration_ms > 0.0 {
            (elapsed / self.duration_ms).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let offset = self.start + self.distance * ease_in_out_cubic(progress);
        (offset, elapsed < self.duration_ms)
    }

    pub fn target(&self) -> f64 {
        self.start + self.distance
    }
}

/// Navbar appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavbarStyle {
    Top,
    Scrolled,
}

/// Scroll-driven navbar style switch, evaluated at most once per frame.
#[derive(Debug, Clone)]
pub struct NavbarStyler {
    threshold: f64,
    style: NavbarStyle,
    frame_pending: bool,
}

impl NavbarStyler {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            style: NavbarStyle::Top,
            frame_pending: false,
        }
    }

    pub fn style(&self) -> NavbarStyle {
        self.style
    }

    /// A scroll event arrived. Returns `true` if the caller should request an
    /// animation frame; further scrolls before that frame are coalesced.
    pub fn on_scroll(&mut self) -> bool {
        if self.frame_pending {
            return false;
        }
        self.frame_pending = true;
        true
    }

    /// The requested frame fired with the current scroll offset. Returns the
    /// new style if it changed.
    pub fn on_frame(&mut self, offset: f64) -> Option<NavbarStyle> {
        self.frame_pending = false;
        self.apply(offset)
    }

    /// Evaluate an offset immediately, e.g. on page load.
    pub fn apply(&mut self, offset: f64) -> Option<NavbarStyle> {
        let style = if offset > self.threshold {
            NavbarStyle::Scrolled
        } else {
            NavbarStyle::Top
        };
        if style == self.style {
            return None;
        }
        self.style = style;
        Some(style)
    }
}

impl Default for NavbarStyler {
    fn default() -> Self {
        Self::new(NAVBAR_SCROLL_THRESHOLD)
    }
}

/// One-way visibility marking keyed by element identity.
#[derive(Debug, Clone)]
pub struct RevealTracker<K> {
    revealed: HashSet<K>,
}

impl<K: Eq + Hash> RevealTracker<K> {
    pub fn new() -> Self {
        Self {
            revealed: HashSet::new(),
        }
    }

    /// Record an intersection report. Returns `true` exactly once per element:
    /// the first time it is seen intersecting.
    pub fn observe(&mut self, key: K, intersecting: bool) -> bool {
        intersecting && self.revealed.insert(key)
    }

    pub fn is_revealed(&self, key: &K) -> bool {
        self.revealed.contains(key)
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed.len()
    }
}

impl<K: Eq + Hash> Default for RevealTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints_and_midpoint() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-12);
        assert!((ease_in_out_cubic(0.25) - 0.0625).abs() < 1e-12);
        assert!((ease_in_out_cubic(0.75) - 0.9375).abs() < 1e-12);
    }

    #[test]
    fn test_anchor_parsing() {
        assert_eq!(AnchorTarget::from_href("/about"), None);
        assert_eq!(AnchorTarget::from_href("#"), None);
        assert_eq!(AnchorTarget::from_href("#top"), Some(AnchorTarget::Top));
        assert_eq!(
            AnchorTarget::from_href("/index.html#projects"),
            Some(AnchorTarget::Fragment("#projects".into()))
        );
        assert_eq!(AnchorTarget::Top.hash(), "#top");
    }

    #[test]
    fn test_document_offset_sums_chain() {
        assert_eq!(document_offset([120.0, 40.0, 8.0]), 168.0);
        assert_eq!(document_offset(Vec::<f64>::new()), 0.0);
    }

    #[test]
    fn test_scroll_animation_timeline() {
        let mut anim = ScrollAnimation::new(100.0, 1100.0, 500.0);
        assert_eq!(anim.sample(1000.0), (100.0, true));

        let (mid, more) = anim.sample(1250.0);
        assert!((mid - 600.0).abs() < 1e-9);
        assert!(more);

        let (end, more) = anim.sample(1500.0);
        assert_eq!(end, 1100.0);
        assert!(!more);

        // Late frames clamp to the target.
        assert_eq!(anim.sample(2000.0), (1100.0, false));
        assert_eq!(anim.target(), 1100.0);
    }

    #[test]
    fn test_scroll_animation_zero_duration() {
        let mut anim = ScrollAnimation::new(0.0, 300.0, 0.0);
        assert_eq!(anim.sample(5.0), (300.0, false));
    }

    #[test]
    fn test_navbar_throttles_to_frame() {
        let mut navbar = NavbarStyler::default();
        assert!(navbar.on_scroll());
        assert!(!navbar.on_scroll());
        assert!(!navbar.on_scroll());

        assert_eq!(navbar.on_frame(80.0), Some(NavbarStyle::Scrolled));
        assert!(navbar.on_scroll());
        assert_eq!(navbar.on_frame(120.0), None);
        assert!(navbar.on_scroll());
        assert_eq!(navbar.on_frame(50.0), Some(NavbarStyle::Top));
    }

    #[test]
    fn test_reveal_is_one_way() {
        let mut reveal = RevealTracker::new();
        assert!(!reveal.observe("card-1", false));
        assert!(reveal.observe("card-1", true));
        assert!(!reveal.observe("card-1", true));
        assert!(!reveal.observe("card-1", false));
        assert!(reveal.is_revealed(&"card-1"));
        assert_eq!(reveal.revealed_count(), 1);
    }
}
