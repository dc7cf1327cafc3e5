#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::geom::Point;
use crate::session::Session;
use crate::stroke::{Stroke, StrokeId};

/// Ids of pen strokes visible at `cursor` with a point within `radius` of `center`.
///
/// The bounding box only pre-filters; a stroke whose box overlaps the search
/// square but whose points all lie outside the radius is not a hit. Eraser
/// strokes are never returned.
#[must_use]
pub fn find_strokes_in_area(session: &Session, center: Point, radius: f64, cursor: Option<usize>) -> Vec<StrokeId> {
    session
        .visible_strokes(cursor)
        .filter(|stroke| !stroke.is_eraser())
        .filter(|stroke| stroke_hit(stroke, center, radius))
        .map(|stroke| stroke.id)
        .collect()
}

/// Whether any point of `stroke` lies within `radius` of `center`.
#[must_use]
pub fn stroke_hit(stroke: &Stroke, center: Point, radius: f64) -> bool {
    if let Some(bounds) = stroke.bounds
        && !bounds.intersects_square(center, radius)
    {
        return false;
    }
    stroke.points.iter().any(|p| p.position().distance_to(center) <= radius)
}
