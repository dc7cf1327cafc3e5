//! Plane geometry shared by the classifier, stroke model, viewport, and renderer.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};

/// A point in surface, screen, or canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        distance(self, other)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: Point, b: Point) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Axis-aligned bounding box. Serialized as `[minX, minY, maxX, maxY]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Smallest box containing every point, or `None` for an empty set.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self { min_x: first.x, min_y: first.y, max_x: first.x, max_y: first.y };
        for p in iter {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Some(bounds)
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Whether the box overlaps the square of half-side `radius` centred on `center`.
    #[must_use]
    pub fn intersects_square(&self, center: Point, radius: f64) -> bool {
        center.x + radius >= self.min_x
            && center.x - radius <= self.max_x
            && center.y + radius >= self.min_y
            && center.y - radius <= self.max_y
    }
}

impl From<[f64; 4]> for Bounds {
    fn from([min_x, min_y, max_x, max_y]: [f64; 4]) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }
}

impl From<Bounds> for [f64; 4] {
    fn from(b: Bounds) -> Self {
        [b.min_x, b.min_y, b.max_x, b.max_y]
    }
}

/// Map a surface-space point into canvas space under `zoom` and `pan`.
#[must_use]
pub fn screen_to_canvas(screen: Point, zoom: f64, pan: Point) -> Point {
    Point { x: (screen.x - pan.x) / zoom, y: (screen.y - pan.y) / zoom }
}

/// Inverse of [`screen_to_canvas`].
#[must_use]
pub fn canvas_to_screen(canvas: Point, zoom: f64, pan: Point) -> Point {
    Point { x: canvas.x * zoom + pan.x, y: canvas.y * zoom + pan.y }
}

/// Distance between the first two touches, or 0 with fewer than two.
#[must_use]
pub fn touch_distance(touches: &[Point]) -> f64 {
    match touches {
        [a, b, ..] => distance(*a, *b),
        _ => 0.0,
    }
}

/// Midpoint of the first two touches. A single touch is its own center.
#[must_use]
pub fn touch_center(touches: &[Point]) -> Option<Point> {
    match touches {
        [a, b, ..] => Some(Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)),
        [a] => Some(*a),
        [] => None,
    }
}

/// Whether the touch distance changed by more than `threshold` pixels.
#[must_use]
pub fn is_pinch(current: &[Point], previous: &[Point], threshold: f64) -> bool {
    if current.len() < 2 || previous.len() < 2 {
        return false;
    }
    (touch_distance(current) - touch_distance(previous)).abs() > threshold
}
