#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use crate::consts::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM};
use crate::geom::{self, Point};

/// Zoom, pan, and surface geometry.
///
/// `pan` is in surface pixels. `zoom` is a scale factor (1.0 = no zoom),
/// always within [`MIN_ZOOM`, `MAX_ZOOM`]. `origin` is the surface's top-left
/// corner in client coordinates. The vertical page scroll is tracked
/// separately by [`crate::scroll::ScrollEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    pub pan: Point,
    pub width: f64,
    pub height: f64,
    pub origin: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            pan: Point::default(),
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            origin: Point::default(),
        }
    }
}

impl Viewport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the zoom, clamped, optionally keeping `center` fixed on screen.
    ///
    /// Returns the zoom actually applied. Non-finite input is ignored.
    pub fn set_zoom(&mut self, zoom: f64, center: Option<Point>) -> f64 {
        if !zoom.is_finite() {
            return self.zoom;
        }
        let old = self.zoom;
        let new = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if let Some(c) = center {
            let ratio = new / old;
            self.pan = Point::new(c.x - (c.x - self.pan.x) * ratio, c.y - (c.y - self.pan.y) * ratio);
        }
        self.zoom = new;
        new
    }

    /// Shift the pan offset by a surface-pixel delta.
    pub fn set_pan(&mut self, dx: f64, dy: f64) {
        if dx.is_finite() && dy.is_finite() {
            self.pan.x += dx;
            self.pan.y += dy;
        }
    }

    /// Back to zoom 1 with no pan. Surface size and origin are kept.
    pub fn reset(&mut self) {
        self.zoom = DEFAULT_ZOOM;
        self.pan = Point::default();
    }

    /// Track the container size.
    pub fn resize(&mut self, width: f64, height: f64) {
        if width.is_finite() && height.is_finite() {
            self.width = width.max(0.0);
            self.height = height.max(0.0);
        }
    }

    /// Record where the surface sits in client coordinates.
    pub fn set_origin(&mut self, origin: Point) {
        if origin.is_finite() {
            self.origin = origin;
        }
    }

    /// Surface pixel position of a client-space point. No zoom or pan applied.
    #[must_use]
    pub fn get_coordinates(&self, client: Point) -> Point {
        Point::new(client.x - self.origin.x, client.y - self.origin.y)
    }

    /// Surface pixels to canvas coordinates under the current zoom and pan.
    #[must_use]
    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        geom::screen_to_canvas(screen, self.zoom, self.pan)
    }

    /// Canvas coordinates to surface pixels.
    #[must_use]
    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        geom::canvas_to_screen(canvas, self.zoom, self.pan)
    }

    /// Center of the surface in surface pixels.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}
