//! Engine: routes input into strokes, history, scrolling, and zoom.
//!
//! [`EngineCore`] holds every piece of drawing state and has no browser
//! dependency, so it is driven directly from native tests with raw event
//! records. Its operations return [`Action`]s describing what the host must
//! do next (redraw, schedule an animation frame, persist a stroke).
//!
//! [`Engine`] wraps the core together with the `<canvas>` element and its 2D
//! context. It converts DOM events through [`crate::dom`], loads overlay
//! images, and drives scroll animations with `requestAnimationFrame`.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, info, warn};
use serde_json::json;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, PointerEvent, TouchEvent, WheelEvent};

use crate::builder::{StrokeBuilder, StrokeStyle};
use crate::classify;
use crate::config::{ConfigError, EngineConfig};
use crate::consts::{MAX_STROKE_WIDTH, MIN_STROKE_WIDTH, PINCH_THRESHOLD_PX, WHEEL_LOG_THRESHOLD_PX, ZOOM_STEP};
use crate::dom;
use crate::export::{ExportError, SessionTranscript};
use crate::geom::{self, Point};
use crate::history::History;
use crate::hit;
use crate::input::{InputState, RawPointerEvent, Tool, UiState};
use crate::overlay::{OverlayId, Overlays};
use crate::render::{self, Scene, Surface};
use crate::scroll::{AnimationToken, FrameStep, ScrollEnd, ScrollEngine};
use crate::session::{Counter, EventKind, Session};
use crate::stroke::StrokeId;
use crate::viewport::Viewport;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RenderNeeded,
    /// An animation started; call [`EngineCore::animation_frame`] once per frame.
    ScheduleFrame(AnimationToken),
    StrokeCommitted(StrokeId),
    StrokesErased(Vec<StrokeId>),
}

/// Map a client position to canvas space: surface offset, inverse zoom/pan, then page scroll.
fn locate(viewport: &Viewport, scroll_y: f64, client: Point) -> Point {
    let p = viewport.screen_to_canvas(viewport.get_coordinates(client));
    Point::new(p.x, p.y + scroll_y)
}

/// Core engine state: all logic that doesn't depend on the canvas element.
#[derive(Debug)]
pub struct EngineCore {
    pub session: Session,
    pub history: History,
    pub builder: StrokeBuilder,
    pub viewport: Viewport,
    pub scroll: ScrollEngine,
    pub ui: UiState,
    pub input: InputState,
    pub config: EngineConfig,
}

impl EngineCore {
    /// Start a fresh session at absolute time `now_ms`.
    #[must_use]
    pub fn new(config: EngineConfig, now_ms: f64) -> Self {
        let viewport = Viewport::default();
        Self {
            session: Session::new(now_ms),
            history: History::with_limit(config.history_limit),
            builder: StrokeBuilder::new(),
            scroll: ScrollEngine::new(config.page_height, viewport.height),
            viewport,
            ui: UiState::default(),
            input: InputState::default(),
            config,
        }
    }

    // --- Tool / style ---

    /// Switch tools. Logs and counts only an actual change.
    pub fn set_tool(&mut self, tool: Tool, now_ms: f64) -> bool {
        let previous = self.ui.tool;
        if previous == tool {
            return false;
        }
        self.ui.tool = tool;
        self.session.log_event(
            EventKind::ToolChange,
            now_ms,
            json!({ "tool": tool.as_str(), "previousTool": previous.as_str() }),
        );
        self.session.bump(Counter::ToolChange);
        true
    }

    pub fn set_color(&mut self, color: &str, now_ms: f64) -> bool {
        if self.ui.color == color {
            return false;
        }
        let previous = std::mem::replace(&mut self.ui.color, color.to_owned());
        self.session.log_event(EventKind::ColorChange, now_ms, json!({ "color": color, "previousColor": previous }));
        self.session.bump(Counter::ColorChange);
        true
    }

    /// Set the nominal stroke width, clamped to [1, 20]. Non-finite input is ignored.
    pub fn set_stroke_width(&mut self, width: f64, now_ms: f64) -> bool {
        if !width.is_finite() {
            return false;
        }
        let width = width.clamp(MIN_STROKE_WIDTH, MAX_STROKE_WIDTH);
        if (width - self.ui.stroke_width).abs() < f64::EPSILON {
            return false;
        }
        let previous = self.ui.stroke_width;
        self.ui.stroke_width = width;
        self.session.log_event(
            EventKind::StrokeWidthChange,
            now_ms,
            json!({ "strokeWidth": width, "previousStrokeWidth": previous }),
        );
        self.session.bump(Counter::WidthChange);
        true
    }

    // --- Pointer input ---

    /// Canvas-space position of a client-space point.
    #[must_use]
    pub fn canvas_point(&self, client: Point) -> Point {
        locate(&self.viewport, self.scroll.scroll_y(), client)
    }

    fn surface_touches(&self, raw: &RawPointerEvent) -> Vec<Point> {
        raw.touch_points().into_iter().map(|p| self.viewport.get_coordinates(p)).collect()
    }

    pub fn pointer_down(&mut self, raw: &RawPointerEvent) -> Vec<Action> {
        if raw.is_multi_touch() {
            return self.begin_pinch(raw);
        }

        match self.ui.tool.stroke_tool() {
            Some(tool) => {
                let position = self.canvas_point(raw.client);
                let Some(sample) = classify::classify(raw, position, self.session.capabilities_mut()) else {
                    return Vec::new();
                };
                let style = StrokeStyle { tool, color: self.ui.color.clone(), width: self.ui.stroke_width };
                self.builder.start(&mut self.session, &sample, &style);
                self.input = InputState::Drawing;
                vec![Action::RenderNeeded]
            }
            None => {
                let y = self.viewport.get_coordinates(raw.client).y;
                self.scroll.start_scroll(y, raw.time_ms);
                self.input = InputState::Scrolling;
                Vec::new()
            }
        }
    }

    pub fn pointer_move(&mut self, raw: &RawPointerEvent) -> Vec<Action> {
        match self.input {
            InputState::Idle => {
                if raw.is_multi_touch() {
                    return self.begin_pinch(raw);
                }
                Vec::new()
            }
            InputState::Drawing => {
                if raw.is_multi_touch() {
                    return self.begin_pinch(raw);
                }
                if self.extend_stroke(raw) { vec![Action::RenderNeeded] } else { Vec::new() }
            }
            InputState::Scrolling => {
                let y = self.viewport.get_coordinates(raw.client).y;
                if self.scroll.move_scroll(y, raw.time_ms) { vec![Action::RenderNeeded] } else { Vec::new() }
            }
            InputState::Pinching { .. } => self.pinch_move(raw),
        }
    }

    pub fn pointer_up(&mut self, raw: &RawPointerEvent) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::Idle => Vec::new(),
            InputState::Drawing => match self.builder.end(&mut self.session, &mut self.history, raw.time_ms) {
                Some(id) => vec![Action::StrokeCommitted(id), Action::RenderNeeded],
                None => Vec::new(),
            },
            InputState::Scrolling => self.end_drag(raw.time_ms),
            InputState::Pinching { start_zoom, .. } => {
                let zoom = self.viewport.zoom;
                self.session.log_event(EventKind::PinchZoom, raw.time_ms, json!({ "zoom": zoom, "startZoom": start_zoom }));
                self.session.bump(Counter::Zoom);
                debug!("engine: pinch ended at zoom {zoom:.2}");
                vec![Action::RenderNeeded]
            }
        }
    }

    /// Abort the current gesture. A stroke in progress is dropped without a trace.
    pub fn pointer_cancel(&mut self, _raw: &RawPointerEvent) -> Vec<Action> {
        if self.abort_gesture() { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    /// Feed the samples of a move event to the active stroke.
    fn extend_stroke(&mut self, raw: &RawPointerEvent) -> bool {
        let viewport = self.viewport;
        let scroll_y = self.scroll.scroll_y();
        let caps = self.session.capabilities_mut();
        if let Some(batch) = classify::classify_batch(raw, |sub| locate(&viewport, scroll_y, sub.client), caps)
            && !batch.is_empty()
        {
            return self.builder.add_coalesced_points(&self.session, &batch) > 0;
        }

        let position = locate(&viewport, scroll_y, raw.client);
        match classify::classify(raw, position, self.session.capabilities_mut()) {
            Some(sample) => self.builder.add_point(&self.session, &sample),
            None => false,
        }
    }

    /// Returns whether a stroke in progress was dropped.
    fn abort_gesture(&mut self) -> bool {
        match std::mem::take(&mut self.input) {
            InputState::Drawing => self.builder.cancel(),
            InputState::Scrolling => {
                self.scroll.cancel_drag();
                false
            }
            InputState::Idle | InputState::Pinching { .. } => false,
        }
    }

    fn begin_pinch(&mut self, raw: &RawPointerEvent) -> Vec<Action> {
        let dropped = self.abort_gesture();
        self.scroll.cancel_animation();
        self.input = InputState::Pinching { last_touches: self.surface_touches(raw), start_zoom: self.viewport.zoom };
        if dropped { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    fn pinch_move(&mut self, raw: &RawPointerEvent) -> Vec<Action> {
        let current = self.surface_touches(raw);
        let InputState::Pinching { last_touches, .. } = &mut self.input else {
            return Vec::new();
        };
        if !geom::is_pinch(&current, last_touches, PINCH_THRESHOLD_PX) {
            return Vec::new();
        }
        let ratio = geom::touch_distance(&current) / geom::touch_distance(last_touches);
        if !ratio.is_finite() || ratio <= 0.0 {
            return Vec::new();
        }
        let center = geom::touch_center(&current);
        *last_touches = current;
        self.viewport.set_zoom(self.viewport.zoom * ratio, center);
        vec![Action::RenderNeeded]
    }

    fn end_drag(&mut self, now_ms: f64) -> Vec<Action> {
        let actions = match self.scroll.end_scroll() {
            ScrollEnd::NotDragging => return Vec::new(),
            ScrollEnd::Stopped => Vec::new(),
            ScrollEnd::Momentum(token) => vec![Action::ScheduleFrame(token)],
        };
        let data = json!({
            "scrollY": self.scroll.scroll_y(),
            "scrollProgress": self.scroll.progress(),
        });
        self.session.log_event(EventKind::CanvasPan, now_ms, data);
        self.session.bump(Counter::Pan);
        actions
    }

    // --- Scrolling ---

    /// Apply a wheel delta. Large deltas are logged but never counted as pans.
    pub fn wheel(&mut self, delta_y: f64, now_ms: f64) -> Vec<Action> {
        if !delta_y.is_finite() {
            return Vec::new();
        }
        self.scroll.cancel_animation();
        let applied = self.scroll.wheel(delta_y);
        if delta_y.abs() > WHEEL_LOG_THRESHOLD_PX {
            let data = json!({
                "scrollY": self.scroll.scroll_y(),
                "deltaY": delta_y,
                "scrollProgress": self.scroll.progress(),
            });
            self.session.log_event(EventKind::CanvasPan, now_ms, data);
        }
        if applied.abs() > 0.0 { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    pub fn scroll_to(&mut self, target: f64, smooth: bool, now_ms: f64) -> Vec<Action> {
        match self.scroll.scroll_to(target, smooth, now_ms) {
            Some(token) => vec![Action::ScheduleFrame(token)],
            None => vec![Action::RenderNeeded],
        }
    }

    /// Advance the scroll animation identified by `token`.
    pub fn animation_frame(&mut self, token: AnimationToken, now_ms: f64) -> FrameStep {
        self.scroll.step(token, now_ms)
    }

    // --- Zoom / viewport ---

    pub fn zoom_in(&mut self, now_ms: f64) -> Vec<Action> {
        self.zoom_by(ZOOM_STEP, EventKind::ZoomIn, now_ms)
    }

    pub fn zoom_out(&mut self, now_ms: f64) -> Vec<Action> {
        self.zoom_by(-ZOOM_STEP, EventKind::ZoomOut, now_ms)
    }

    fn zoom_by(&mut self, step: f64, kind: EventKind, now_ms: f64) -> Vec<Action> {
        let before = self.viewport.zoom;
        let center = self.viewport.center();
        let zoom = self.viewport.set_zoom(before + step, Some(center));
        if (zoom - before).abs() < f64::EPSILON {
            return Vec::new();
        }
        self.session.log_event(kind, now_ms, json!({ "zoom": zoom }));
        self.session.bump(Counter::Zoom);
        vec![Action::RenderNeeded]
    }

    pub fn set_zoom(&mut self, zoom: f64, center: Option<Point>) -> Vec<Action> {
        self.viewport.set_zoom(zoom, center);
        vec![Action::RenderNeeded]
    }

    pub fn set_pan(&mut self, dx: f64, dy: f64) -> Vec<Action> {
        self.viewport.set_pan(dx, dy);
        vec![Action::RenderNeeded]
    }

    /// Track the surface size. The scroll range follows the new height.
    pub fn resize(&mut self, width: f64, height: f64) -> Vec<Action> {
        self.viewport.resize(width, height);
        self.scroll.set_viewport_height(self.viewport.height);
        vec![Action::RenderNeeded]
    }

    // --- History ---

    pub fn undo(&mut self, now_ms: f64) -> Vec<Action> {
        if self.history.undo(&mut self.session, now_ms) { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    pub fn redo(&mut self, now_ms: f64) -> Vec<Action> {
        if self.history.redo(&mut self.session, now_ms) { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    /// Hide everything visible as one undoable step.
    pub fn clear_all(&mut self, now_ms: f64) -> Vec<Action> {
        self.abort_gesture();
        let cleared = self.history.clear_all(&mut self.session, now_ms);
        info!("engine: cleared {cleared} strokes");
        vec![Action::RenderNeeded]
    }

    /// Invalidate the pen strokes under the eraser brush at a client position.
    pub fn erase_at(&mut self, client: Point, now_ms: f64) -> Vec<Action> {
        let center = self.canvas_point(client);
        let radius = self.config.eraser_size / 2.0;
        let ids = hit::find_strokes_in_area(&self.session, center, radius, self.history.cursor());
        if ids.is_empty() {
            return Vec::new();
        }
        self.session.invalidate(&ids);
        self.session.log_event(EventKind::StrokeErase, now_ms, json!({ "strokeIds": ids }));
        vec![Action::StrokesErased(ids), Action::RenderNeeded]
    }

    // --- Session ---

    pub fn focus_changed(&mut self, focused: bool, now_ms: f64) {
        let kind = if focused { EventKind::WindowFocus } else { EventKind::WindowBlur };
        self.session.log_event(kind, now_ms, json!({}));
    }

    /// Discard all strokes, history, and counters and start a new session.
    pub fn reset_session(&mut self, now_ms: f64) -> Vec<Action> {
        self.builder.cancel();
        self.input = InputState::Idle;
        self.session.reset(now_ms);
        self.history.reset();
        self.scroll.reset();
        self.viewport.reset();
        vec![Action::RenderNeeded]
    }

    pub fn end_session(&mut self, now_ms: f64) {
        self.session.end(now_ms);
    }

    /// Snapshot the session as a submission transcript.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a session timestamp cannot be formatted.
    pub fn export(&self, now_ms: f64) -> Result<SessionTranscript, ExportError> {
        SessionTranscript::from_session(&self.session, self.history.cursor(), now_ms)
    }

    // --- Render ---

    /// Draw a frame. Without a surface this is a no-op returning `false`.
    ///
    /// Surface failures are logged and reported as `false`.
    pub fn redraw<S: Surface>(&self, surface: Option<&mut S>, overlays: &Overlays<S::Image>) -> bool {
        let Some(surface) = surface else {
            return false;
        };
        let scene = Scene {
            session: &self.session,
            cursor: self.history.cursor(),
            viewport: &self.viewport,
            scroll_y: self.scroll.scroll_y(),
            live: self.builder.current(),
            overlays,
            eraser_size: self.config.eraser_size,
        };
        match render::redraw(surface, &scene) {
            Ok(()) => true,
            Err(err) => {
                warn!("render: {err}");
                false
            }
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.ui.tool
    }
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
    match canvas.get_context("2d") {
        Ok(Some(object)) => match object.dyn_into::<CanvasRenderingContext2d>() {
            Ok(context) => Some(context),
            Err(_) => {
                warn!("engine: 2d context has an unexpected type");
                None
            }
        },
        Ok(None) => {
            warn!("engine: canvas has no 2d context");
            None
        }
        Err(err) => {
            warn!("engine: getContext failed: {err:?}");
            None
        }
    }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    context: Option<CanvasRenderingContext2d>,
    pub core: EngineCore,
    overlays: Overlays<HtmlImageElement>,
}

impl Engine {
    /// Install the browser console logger at the level `config` asks for.
    pub fn init_logging(config: &EngineConfig) {
        if let Err(err) = console_log::init_with_level(config.log_level()) {
            warn!("logging already initialised: {err}");
        }
    }

    /// Parse configuration from the page's query string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a recognised parameter with an unusable value.
    pub fn config_from_location() -> Result<EngineConfig, ConfigError> {
        let query = match web_sys::window().map(|w| w.location().search()) {
            Some(Ok(query)) => query,
            Some(Err(_)) | None => String::new(),
        };
        EngineConfig::from_query(&query)
    }

    /// Create an engine bound to `canvas`. A missing 2D context disables drawing.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement, config: EngineConfig) -> Self {
        let context = context_2d(&canvas);
        let core = EngineCore::new(config, dom::now_ms());
        let mut engine = Self { canvas, context, core, overlays: Overlays::new() };
        engine.sync_geometry();
        engine
    }

    /// Re-read the canvas position and size after layout changes.
    pub fn sync_geometry(&mut self) -> Vec<Action> {
        let rect = self.canvas.get_bounding_client_rect();
        self.core.viewport.set_origin(Point::new(rect.left(), rect.top()));
        self.core.resize(f64::from(self.canvas.width()), f64::from(self.canvas.height()))
    }

    // --- Input events ---
    //
    // Hosts wire either pointer events or touch events for a given device,
    // never both, or every sample is recorded twice.

    pub fn on_pointer_down(&mut self, ev: &PointerEvent) -> Vec<Action> {
        self.core.pointer_down(&dom::pointer_event_to_raw(ev))
    }

    pub fn on_pointer_move(&mut self, ev: &PointerEvent) -> Vec<Action> {
        self.core.pointer_move(&dom::pointer_event_to_raw(ev))
    }

    pub fn on_pointer_up(&mut self, ev: &PointerEvent) -> Vec<Action> {
        self.core.pointer_up(&dom::pointer_event_to_raw(ev))
    }

    pub fn on_pointer_cancel(&mut self, ev: &PointerEvent) -> Vec<Action> {
        self.core.pointer_cancel(&dom::pointer_event_to_raw(ev))
    }

    pub fn on_touch_start(&mut self, ev: &TouchEvent) -> Vec<Action> {
        self.core.pointer_down(&dom::touch_event_to_raw(ev))
    }

    pub fn on_touch_move(&mut self, ev: &TouchEvent) -> Vec<Action> {
        self.core.pointer_move(&dom::touch_event_to_raw(ev))
    }

    pub fn on_touch_end(&mut self, ev: &TouchEvent) -> Vec<Action> {
        self.core.pointer_up(&dom::touch_event_to_raw(ev))
    }

    pub fn on_touch_cancel(&mut self, ev: &TouchEvent) -> Vec<Action> {
        self.core.pointer_cancel(&dom::touch_event_to_raw(ev))
    }

    pub fn on_wheel(&mut self, ev: &WheelEvent) -> Vec<Action> {
        let delta = dom::wheel_delta_y(ev, self.core.viewport.height);
        self.core.wheel(delta, dom::now_ms())
    }

    pub fn on_focus_change(&mut self, focused: bool) {
        self.core.focus_changed(focused, dom::now_ms());
    }

    // --- Render ---

    /// Draw the current state to the canvas.
    pub fn render(&mut self) -> bool {
        self.core.redraw(self.context.as_mut(), &self.overlays)
    }

    fn advance_frame(&mut self, token: AnimationToken) -> FrameStep {
        let step = self.core.animation_frame(token, dom::now_ms());
        if step != FrameStep::Stale {
            self.render();
        }
        step
    }

    // --- Overlays ---

    /// Start loading `src` as an overlay at canvas position (`x`, `y`).
    ///
    /// The overlay is drawn once the image loads; a failed load is logged and
    /// never drawn.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the image element cannot be created.
    pub fn add_overlay(
        engine: &Rc<RefCell<Self>>,
        src: &str,
        x: f64,
        y: f64,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<OverlayId, JsValue> {
        let image = HtmlImageElement::new()?;
        let id = engine.try_borrow_mut().map_err(|_| JsValue::from_str("engine busy"))?.overlays.begin(x, y, width, height);

        let weak = Rc::downgrade(engine);
        let loaded = image.clone();
        let onload = Closure::once_into_js(move || {
            with_engine(&weak, |engine| {
                let (w, h) = (f64::from(loaded.natural_width()), f64::from(loaded.natural_height()));
                if engine.overlays.loaded(id, loaded, w, h) {
                    engine.render();
                }
            });
        });

        let weak = Rc::downgrade(engine);
        let onerror = Closure::once_into_js(move || {
            with_engine(&weak, |engine| {
                engine.overlays.failed(id);
            });
        });

        image.set_onload(Some(onload.unchecked_ref()));
        image.set_onerror(Some(onerror.unchecked_ref()));
        image.set_src(src);
        Ok(id)
    }

    pub fn remove_overlay(&mut self, id: OverlayId) -> Vec<Action> {
        if self.overlays.remove(id) { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    // --- Dispatch ---

    /// Perform render and animation actions. Returns the actions left for the host.
    pub fn dispatch(engine: &Rc<RefCell<Self>>, actions: Vec<Action>) -> Vec<Action> {
        let mut rest = Vec::new();
        let mut render = false;
        for action in actions {
            match action {
                Action::RenderNeeded => render = true,
                Action::ScheduleFrame(token) => request_frame(Rc::downgrade(engine), token),
                other => rest.push(other),
            }
        }
        if render {
            with_engine(&Rc::downgrade(engine), |engine| {
                engine.render();
            });
        }
        rest
    }
}

/// Run `f` on the engine if it is still alive and not already borrowed.
fn with_engine(engine: &Weak<RefCell<Engine>>, f: impl FnOnce(&mut Engine)) {
    let Some(rc) = engine.upgrade() else {
        debug!("engine: dropped before callback");
        return;
    };
    match rc.try_borrow_mut() {
        Ok(mut engine) => f(&mut engine),
        Err(_) => warn!("engine: busy, callback skipped"),
    }
}

fn request_frame(engine: Weak<RefCell<Engine>>, token: AnimationToken) {
    let Some(window) = web_sys::window() else {
        warn!("animation: no window");
        return;
    };
    let callback = Closure::once_into_js(move |_timestamp: f64| run_frame(&engine, token));
    if let Err(err) = window.request_animation_frame(callback.unchecked_ref()) {
        warn!("animation: requestAnimationFrame failed: {err:?}");
    }
}

fn run_frame(engine: &Weak<RefCell<Engine>>, token: AnimationToken) {
    let Some(rc) = engine.upgrade() else {
        return;
    };
    // A busy engine retries on the next frame.
    let step = match rc.try_borrow_mut() {
        Ok(mut engine) => engine.advance_frame(token),
        Err(_) => FrameStep::Continue,
    };
    if step == FrameStep::Continue {
        request_frame(Rc::downgrade(&rc), token);
    }
}
