//! Browser host: the header backdrop and the page scroll helpers.
//!
//! The page provides a `#header` element (the container) holding a
//! `#particle-canvas` canvas. Either one missing disables the particle
//! effect; the scroll helpers install independently.

use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, EventTarget, HtmlCanvasElement, HtmlElement,
    IntersectionObserver, IntersectionObserverEntry, MouseEvent, TouchEvent, Window,
};

use crate::config::FieldSettings;
use crate::effect::ParticleEffect;
use crate::field::ParticleField;
use crate::pointer::PointerEvent;
use crate::render_loop::{FrameHandle, FrameScheduler};
use crate::scroll::{
    document_offset, AnchorTarget, NavbarStyle, NavbarStyler, RevealTracker, ScrollAnimation, NAVBAR_SCROLLED_CLASS,
    REVEAL_CLASS, REVEAL_SELECTOR, SMOOTH_SCROLL_DURATION_MS,
};
use crate::sizer::{ContainerHost, SurfaceDimensions};
use crate::surface::{DrawSurface, Rgba};

const CONTAINER_ID: &str = "header";
const CANVAS_ID: &str = "particle-canvas";
const NAVBAR_SELECTOR: &str = ".navbar";
const ANCHOR_SELECTOR: &str = "a[href*='#']";

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// `CanvasRenderingContext2d` as a [`DrawSurface`].
struct Canvas2d {
    ctx: CanvasRenderingContext2d,
}

impl DrawSurface for Canvas2d {
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.ctx.clear_rect(x as f64, y as f64, width as f64, height as f64);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.ctx.begin_path();
        // Negative radii throw; skip the dot rather than the frame.
        if self
            .ctx
            .arc(center.x as f64, center.y as f64, radius as f64, 0.0, TAU)
            .is_err()
        {
            return;
        }
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill();
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        self.ctx.begin_path();
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(width as f64);
        self.ctx.move_to(from.x as f64, from.y as f64);
        self.ctx.line_to(to.x as f64, to.y as f64);
        self.ctx.stroke();
    }
}

/// The header element and its canvas.
struct PageHost {
    window: Window,
    document: Document,
    container: HtmlElement,
    canvas: HtmlCanvasElement,
}

impl ContainerHost for PageHost {
    fn container_size(&self) -> Option<SurfaceDimensions> {
        Some(SurfaceDimensions::new(
            self.container.offset_width() as f32,
            self.container.offset_height() as f32,
        ))
    }

    fn container_origin(&self) -> Vec2 {
        let rect = self.container.get_bounding_client_rect();
        Vec2::new(rect.left() as f32, rect.top() as f32)
    }

    fn viewport_width(&self) -> f32 {
        self.window
            .inner_width()
            .ok()
            .and_then(|w| w.as_f64())
            .unwrap_or_default() as f32
    }

    fn is_hidden(&self) -> bool {
        self.document.hidden()
    }

    fn apply_surface_size(&mut self, dims: SurfaceDimensions) {
        self.canvas.set_width(dims.width as u32);
        self.canvas.set_height(dims.height as u32);
    }
}

/// `requestAnimationFrame` scheduling. Handles are the browser's request ids,
/// so cancelling really revokes the callback.
struct RafScheduler {
    window: Window,
    callback: FrameCallback,
    pending: Option<FrameHandle>,
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        let callback = self.callback.borrow();
        let closure = callback.as_ref()?;
        match self.window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            Ok(id) => {
                let handle = FrameHandle(id as u64);
                self.pending = Some(handle);
                Some(handle)
            }
            Err(e) => {
                log::warn!("requestAnimationFrame failed: {:?}", e);
                None
            }
        }
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Err(e) = self.window.cancel_animation_frame(handle.0 as i32) {
            log::warn!("cancelAnimationFrame failed: {:?}", e);
        }
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

struct Backdrop {
    effect: ParticleEffect,
    host: PageHost,
    scheduler: RafScheduler,
    surface: Canvas2d,
}

type SharedBackdrop = Rc<RefCell<Option<Backdrop>>>;

fn listen<E>(target: &EventTarget, kind: &str, handler: impl FnMut(E) + 'static) -> Result<(), JsValue>
where
    E: FromWasmAbi + 'static,
{
    let closure = Closure::<dyn FnMut(E)>::new(handler);
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn with_backdrop(shared: &SharedBackdrop, f: impl FnOnce(&mut Backdrop)) {
    if let Some(backdrop) = shared.borrow_mut().as_mut() {
        f(backdrop);
    }
}

fn install_backdrop(window: &Window, document: &Document) -> Result<(), JsValue> {
    let container = document
        .get_element_by_id(CONTAINER_ID)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok());
    let canvas = document
        .get_element_by_id(CANVAS_ID)
        .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok());
    let (Some(container), Some(canvas)) = (container, canvas) else {
        log::info!("#{} or #{} missing; particle effect disabled", CONTAINER_ID, CANVAS_ID);
        return Ok(());
    };
    let Some(ctx) = canvas
        .get_context("2d")?
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
    else {
        log::info!("2d context unavailable; particle effect disabled");
        return Ok(());
    };

    let shared: SharedBackdrop = Rc::new(RefCell::new(None));
    let callback: FrameCallback = Rc::new(RefCell::new(None));
    {
        let shared = shared.clone();
        *callback.borrow_mut() = Some(Closure::new(move |_timestamp: f64| {
            with_backdrop(&shared, |b| {
                let Some(fired) = b.scheduler.pending.take() else {
                    return;
                };
                b.effect.handle_frame(fired, &mut b.scheduler, &mut b.surface);
            });
        }));
    }

    let mut host = PageHost {
        window: window.clone(),
        document: document.clone(),
        container: container.clone(),
        canvas,
    };
    let mut scheduler = RafScheduler {
        window: window.clone(),
        callback,
        pending: None,
    };
    let field = ParticleField::new(FieldSettings::default());
    let Some(effect) = ParticleEffect::start(field, &mut host, &mut scheduler) else {
        return Ok(());
    };
    *shared.borrow_mut() = Some(Backdrop {
        effect,
        host,
        scheduler,
        surface: Canvas2d { ctx },
    });

    let pointer = |shared: &SharedBackdrop, event: PointerEvent| {
        with_backdrop(shared, |b| {
            b.effect.handle_pointer(&event, &b.host);
        });
    };

    let s = shared.clone();
    listen(&container, "mousemove", move |e: MouseEvent| {
        let client = Vec2::new(e.client_x() as f32, e.client_y() as f32);
        pointer(&s, PointerEvent::Move { client });
    })?;
    let s = shared.clone();
    listen(&container, "mouseleave", move |_: MouseEvent| {
        pointer(&s, PointerEvent::Leave);
    })?;
    let s = shared.clone();
    listen(&container, "touchmove", move |e: TouchEvent| {
        let list = e.touches();
        let touches = (0..list.length())
            .filter_map(|i| list.get(i))
            .map(|t| Vec2::new(t.client_x() as f32, t.client_y() as f32))
            .collect();
        pointer(&s, PointerEvent::TouchMove { touches });
    })?;
    let s = shared.clone();
    listen(&container, "touchend", move |_: TouchEvent| {
        pointer(&s, PointerEvent::TouchEnd);
    })?;

    let s = shared.clone();
    listen(window, "resize", move |_: web_sys::Event| {
        with_backdrop(&s, |b| {
            b.effect.handle_resize(&mut b.host);
        });
    })?;
    let s = shared;
    listen(document, "visibilitychange", move |_: web_sys::Event| {
        with_backdrop(&s, |b| {
            let hidden = b.host.is_hidden();
            log::debug!("page {}", if hidden { "hidden" } else { "visible" });
            b.effect.handle_visibility(hidden, &mut b.scheduler);
        });
    })?;

    Ok(())
}

/// Drive one scroll animation to completion, one frame at a time.
fn animate_scroll(window: Window, mut animation: ScrollAnimation) {
    let win = window.clone();
    let step = Closure::once_into_js(move |now: f64| {
        let (offset, more) = animation.sample(now);
        win.scroll_to_with_x_and_y(0.0, offset);
        if more {
            animate_scroll(win, animation);
        }
    });
    if let Err(e) = window.request_animation_frame(step.unchecked_ref()) {
        log::warn!("requestAnimationFrame failed: {:?}", e);
    }
}

/// Document offset of `element` along its offset-parent chain.
fn element_offset(element: Element) -> f64 {
    let mut next = element.dyn_into::<HtmlElement>().ok();
    document_offset(std::iter::from_fn(move || {
        let current = next.take()?;
        next = current
            .offset_parent()
            .and_then(|parent| parent.dyn_into::<HtmlElement>().ok());
        Some(current.offset_top() as f64)
    }))
}

fn install_smooth_scroll(window: &Window, document: &Document) -> Result<(), JsValue> {
    let win = window.clone();
    let doc = document.clone();
    listen(document, "click", move |event: web_sys::Event| {
        let Some(link) = event
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .and_then(|el| el.closest(ANCHOR_SELECTOR).ok().flatten())
        else {
            return;
        };
        let Some(target) = link.get_attribute("href").as_deref().and_then(AnchorTarget::from_href) else {
            return;
        };
        let destination = match &target {
            AnchorTarget::Top => 0.0,
            AnchorTarget::Fragment(hash) => match doc.query_selector(hash) {
                Ok(Some(element)) => element_offset(element),
                _ => return,
            },
        };

        event.prevent_default();
        let start = win.scroll_y().unwrap_or_default();
        animate_scroll(
            win.clone(),
            ScrollAnimation::new(start, destination, SMOOTH_SCROLL_DURATION_MS),
        );
        if let Ok(history) = win.history() {
            if let Err(e) = history.push_state_with_url(&JsValue::NULL, "", Some(target.hash())) {
                log::debug!("pushState failed: {:?}", e);
            }
        }
    })
}

fn apply_navbar_style(navbar: &Element, style: NavbarStyle) {
    let classes = navbar.class_list();
    let result = match style {
        NavbarStyle::Scrolled => classes.add_1(NAVBAR_SCROLLED_CLASS),
        NavbarStyle::Top => classes.remove_1(NAVBAR_SCROLLED_CLASS),
    };
    if let Err(e) = result {
        log::debug!("navbar class update failed: {:?}", e);
    }
}

fn install_navbar(window: &Window, document: &Document) -> Result<(), JsValue> {
    let Some(navbar) = document.query_selector(NAVBAR_SELECTOR)? else {
        return Ok(());
    };
    let styler = Rc::new(RefCell::new(NavbarStyler::default()));
    if let Some(style) = styler.borrow_mut().apply(window.scroll_y().unwrap_or_default()) {
        apply_navbar_style(&navbar, style);
    }

    let win = window.clone();
    listen(window, "scroll", move |_: web_sys::Event| {
        if !styler.borrow_mut().on_scroll() {
            return;
        }
        let styler = styler.clone();
        let navbar = navbar.clone();
        let frame_window = win.clone();
        let on_frame = Closure::once_into_js(move |_now: f64| {
            let offset = frame_window.scroll_y().unwrap_or_default();
            if let Some(style) = styler.borrow_mut().on_frame(offset) {
                apply_navbar_style(&navbar, style);
            }
        });
        if let Err(e) = win.request_animation_frame(on_frame.unchecked_ref()) {
            log::warn!("requestAnimationFrame failed: {:?}", e);
        }
    })
}

fn install_reveal(document: &Document) -> Result<(), JsValue> {
    let nodes = document.query_selector_all(REVEAL_SELECTOR)?;
    let elements: Vec<Element> = (0..nodes.length())
        .filter_map(|i| nodes.get(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect();
    if elements.is_empty() {
        return Ok(());
    }

    let observed = elements.clone();
    let mut tracker = RevealTracker::new();
    let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
        move |entries: js_sys::Array, observer: IntersectionObserver| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                let target = entry.target();
                let Some(index) = observed.iter().position(|el| *el == target) else {
                    continue;
                };
                if tracker.observe(index, entry.is_intersecting()) {
                    if let Err(e) = target.class_list().add_1(REVEAL_CLASS) {
                        log::debug!("reveal class update failed: {:?}", e);
                    }
                    observer.unobserve(&target);
                }
            }
        },
    );
    let observer = IntersectionObserver::new(callback.as_ref().unchecked_ref())?;
    callback.forget();
    for element in &elements {
        observer.observe(element);
    }
    log::debug!("observing {} reveal elements", elements.len());
    Ok(())
}

/// Each installer runs on its own so one failing leaves the others in place.
fn install() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };
    report("particle backdrop", install_backdrop(&window, &document));
    report("smooth scroll", install_smooth_scroll(&window, &document));
    report("navbar", install_navbar(&window, &document));
    report("reveal", install_reveal(&document));
}

fn report(what: &str, result: Result<(), JsValue>) {
    if let Err(e) = result {
        log::warn!("{} not installed: {:?}", what, e);
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    if document.ready_state() == "loading" {
        let ready = Closure::once_into_js(install);
        report(
            "DOMContentLoaded hook",
            document.add_event_listener_with_callback("DOMContentLoaded", ready.unchecked_ref()),
        );
    } else {
        install();
    }
}
