//! Rendering: draws visible strokes, the live stroke, and overlays.
//!
//! Drawing goes through the [`Surface`] trait so the scene logic can be
//! exercised natively; the browser implementation is
//! [`web_sys::CanvasRenderingContext2d`]. The renderer only reads session
//! state and never mutates it.
//!
//! Fallible surface calls propagate as [`RenderError`]. The top-level caller
//! ([`crate::engine::EngineCore::redraw`]) logs the error and carries on.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::consts::PRESSURE_WIDTH_BASE;
use crate::geom::Point;
use crate::overlay::Overlays;
use crate::session::Session;
use crate::stroke::{Stroke, StrokeTool};
use crate::viewport::Viewport;

/// Failure reported by a drawing surface.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("surface call `{call}` failed: {message}")]
    Surface { call: &'static str, message: String },
}

impl RenderError {
    fn js(call: &'static str, value: JsValue) -> Self {
        let message = value.as_string().unwrap_or_else(|| format!("{value:?}"));
        Self::Surface { call, message }
    }
}

/// Compositing mode for a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    SourceOver,
    DestinationOut,
}

impl Composite {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SourceOver => "source-over",
            Self::DestinationOut => "destination-out",
        }
    }
}

/// The 2D raster operations the renderer needs.
pub trait Surface {
    type Image;

    /// Reset to the identity transform and clear `width` x `height` pixels.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the surface rejects the transform.
    fn clear(&mut self, width: f64, height: f64) -> Result<(), RenderError>;

    /// Replace the transform with a uniform scale followed by a translation.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the surface rejects the transform.
    fn set_view_transform(&mut self, zoom: f64, pan: Point) -> Result<(), RenderError>;

    fn save(&mut self);
    fn restore(&mut self);

    /// # Errors
    ///
    /// Returns `Err` if the surface rejects the mode.
    fn set_composite(&mut self, mode: Composite) -> Result<(), RenderError>;

    /// Color, round caps and joins for the next strokes.
    fn set_pen(&mut self, color: &str);
    fn set_line_width(&mut self, width: f64);

    fn begin_path(&mut self);
    fn move_to(&mut self, p: Point);
    fn line_to(&mut self, p: Point);
    fn stroke_path(&mut self);

    /// # Errors
    ///
    /// Returns `Err` if the image cannot be drawn.
    fn draw_image(&mut self, image: &Self::Image, x: f64, y: f64, width: f64, height: f64)
    -> Result<(), RenderError>;
}

impl Surface for CanvasRenderingContext2d {
    type Image = HtmlImageElement;

    fn clear(&mut self, width: f64, height: f64) -> Result<(), RenderError> {
        self.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0).map_err(|e| RenderError::js("setTransform", e))?;
        self.clear_rect(0.0, 0.0, width, height);
        Ok(())
    }

    fn set_view_transform(&mut self, zoom: f64, pan: Point) -> Result<(), RenderError> {
        self.set_transform(zoom, 0.0, 0.0, zoom, pan.x, pan.y).map_err(|e| RenderError::js("setTransform", e))
    }

    fn save(&mut self) {
        CanvasRenderingContext2d::save(self);
    }

    fn restore(&mut self) {
        CanvasRenderingContext2d::restore(self);
    }

    fn set_composite(&mut self, mode: Composite) -> Result<(), RenderError> {
        self.set_global_composite_operation(mode.as_str())
            .map_err(|e| RenderError::js("globalCompositeOperation", e))
    }

    fn set_pen(&mut self, color: &str) {
        self.set_stroke_style_str(color);
        self.set_line_cap("round");
        self.set_line_join("round");
    }

    fn set_line_width(&mut self, width: f64) {
        CanvasRenderingContext2d::set_line_width(self, width);
    }

    fn begin_path(&mut self) {
        CanvasRenderingContext2d::begin_path(self);
    }

    fn move_to(&mut self, p: Point) {
        CanvasRenderingContext2d::move_to(self, p.x, p.y);
    }

    fn line_to(&mut self, p: Point) {
        CanvasRenderingContext2d::line_to(self, p.x, p.y);
    }

    fn stroke_path(&mut self) {
        self.stroke();
    }

    fn draw_image(
        &mut self,
        image: &HtmlImageElement,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), RenderError> {
        self.draw_image_with_html_image_element_and_dw_and_dh(image, x, y, width, height)
            .map_err(|e| RenderError::js("drawImage", e))
    }
}

/// Read-only view of everything a frame shows.
pub struct Scene<'a, I> {
    pub session: &'a Session,
    /// History cursor deciding stroke visibility.
    pub cursor: Option<usize>,
    pub viewport: &'a Viewport,
    pub scroll_y: f64,
    /// Stroke still being captured, drawn on top of committed ones.
    pub live: Option<&'a Stroke>,
    pub overlays: &'a Overlays<I>,
    pub eraser_size: f64,
}

/// Effective segment width for a nominal width and optional pressure.
#[must_use]
pub fn pressure_width(width: f64, pressure: Option<f64>) -> f64 {
    match pressure {
        Some(p) if p > 0.0 => width * (PRESSURE_WIDTH_BASE + p * (1.0 - PRESSURE_WIDTH_BASE)),
        _ => width,
    }
}

/// Draw a full frame.
///
/// # Errors
///
/// Returns the first surface error; the frame may be partially drawn.
pub fn redraw<S: Surface>(surface: &mut S, scene: &Scene<'_, S::Image>) -> Result<(), RenderError> {
    let vp = scene.viewport;

    // Layer 1: clear and apply zoom/pan.
    surface.clear(vp.width, vp.height)?;
    surface.set_view_transform(vp.zoom, vp.pan)?;

    // Layer 2: committed strokes in commit order, eraser strokes cut through.
    for stroke in scene.session.visible_strokes(scene.cursor) {
        draw_stroke(surface, stroke, scene.scroll_y, scene.eraser_size)?;
    }

    // Layer 3: the stroke under the pen.
    if let Some(live) = scene.live {
        draw_stroke(surface, live, scene.scroll_y, scene.eraser_size)?;
    }

    // Layer 4: overlays.
    for overlay in scene.overlays.drawable() {
        surface.draw_image(overlay.image, overlay.x, overlay.y - scene.scroll_y, overlay.width, overlay.height)?;
    }

    Ok(())
}

/// Draw one stroke shifted up by `scroll_y`.
///
/// # Errors
///
/// Returns `Err` if the surface rejects the compositing mode.
pub fn draw_stroke<S: Surface>(
    surface: &mut S,
    stroke: &Stroke,
    scroll_y: f64,
    eraser_size: f64,
) -> Result<(), RenderError> {
    if stroke.points.is_empty() {
        return Ok(());
    }
    surface.save();
    let result = paint_stroke(surface, stroke, scroll_y, eraser_size);
    surface.restore();
    result
}

fn paint_stroke<S: Surface>(
    surface: &mut S,
    stroke: &Stroke,
    scroll_y: f64,
    eraser_size: f64,
) -> Result<(), RenderError> {
    let on_screen = |p: Point| Point::new(p.x, p.y - scroll_y);
    match stroke.tool {
        StrokeTool::Pen => {
            surface.set_composite(Composite::SourceOver)?;
            surface.set_pen(&stroke.color);
            if stroke.has_pressure() {
                draw_segments(surface, stroke, on_screen);
            } else {
                surface.set_line_width(stroke.width);
                draw_polyline(surface, stroke, on_screen);
            }
        }
        StrokeTool::Eraser => {
            surface.set_composite(Composite::DestinationOut)?;
            surface.set_pen(&stroke.color);
            surface.set_line_width(eraser_size);
            draw_polyline(surface, stroke, on_screen);
        }
    }
    Ok(())
}

/// One path through every point. A single point draws a dot.
fn draw_polyline<S, F>(surface: &mut S, stroke: &Stroke, on_screen: F)
where
    S: Surface,
    F: Fn(Point) -> Point,
{
    let mut points = stroke.points.iter().map(|p| on_screen(p.position()));
    let Some(first) = points.next() else {
        return;
    };
    surface.begin_path();
    surface.move_to(first);
    let mut drew = false;
    for p in points {
        surface.line_to(p);
        drew = true;
    }
    if !drew {
        surface.line_to(first);
    }
    surface.stroke_path();
}

/// One path per segment, each at the pressure width of its end point.
fn draw_segments<S, F>(surface: &mut S, stroke: &Stroke, on_screen: F)
where
    S: Surface,
    F: Fn(Point) -> Point,
{
    if let [only] = stroke.points.as_slice() {
        surface.set_line_width(pressure_width(stroke.width, only.pressure));
        let p = on_screen(only.position());
        surface.begin_path();
        surface.move_to(p);
        surface.line_to(p);
        surface.stroke_path();
        return;
    }
    for pair in stroke.points.windows(2) {
        let [from, to] = pair else {
            continue;
        };
        surface.set_line_width(pressure_width(stroke.width, to.pressure));
        surface.begin_path();
        surface.move_to(on_screen(from.position()));
        surface.line_to(on_screen(to.position()));
        surface.stroke_path();
    }
}
