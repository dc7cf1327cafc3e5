//! Stroke model: points, strokes, statistics, and the per-stroke history state.
//!
//! A stroke is owned by the session's stroke collection from the moment it is
//! completed. Its visibility is decided entirely by [`StrokeState`] relative to
//! the history cursor; strokes are only ever physically removed by branch
//! invalidation or history eviction.

#[cfg(test)]
#[path = "stroke_test.rs"]
mod stroke_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::{InputKind, Sample};
use crate::geom::{Bounds, Point};

/// Unique identifier for a stroke.
pub type StrokeId = Uuid;

/// Tool a stroke was drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeTool {
    #[default]
    Pen,
    Eraser,
}

impl StrokeTool {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pen => "pen",
            Self::Eraser => "eraser",
        }
    }
}

/// One captured sample of a stroke. Immutable once appended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokePoint {
    pub x: f64,
    pub y: f64,
    /// Offset from the stroke start in ms.
    pub t_ms: f64,
    pub pressure: Option<f64>,
    pub tilt_x: f64,
    pub tilt_y: f64,
    pub twist: f64,
    #[serde(rename = "inputType")]
    pub input_kind: InputKind,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl StrokePoint {
    /// Build a point from a classified sample taken `t_ms` after the stroke began.
    #[must_use]
    pub fn from_sample(sample: &Sample, t_ms: f64) -> Self {
        Self {
            x: sample.position.x,
            y: sample.position.y,
            t_ms,
            pressure: sample.pressure,
            tilt_x: sample.tilt_x,
            tilt_y: sample.tilt_y,
            twist: sample.twist,
            input_kind: sample.kind,
            width: sample.contact_width,
            height: sample.contact_height,
        }
    }

    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Where a stroke sits relative to the history timeline.
///
/// Serialized as `{ state, step?, clearedAt?, historyIndex? }`; `historyIndex`
/// is derived on the way out and ignored on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "StateRecord", try_from = "StateRecord")]
pub enum StrokeState {
    /// Being drawn, or completed but not yet committed.
    #[default]
    Pending,
    /// Committed at `step`; visible at every cursor at or after it.
    Committed { step: usize },
    /// Committed at `step` and hidden by a clear-all committed at `cleared_at`.
    Cleared { step: usize, cleared_at: usize },
    /// Removed by object erasing. Never shown again.
    Invalidated,
}

impl StrokeState {
    /// Whether a stroke in this state is drawn when the history cursor is `cursor`.
    #[must_use]
    pub fn is_visible_at(self, cursor: Option<usize>) -> bool {
        let Some(s) = cursor else {
            return false;
        };
        match self {
            Self::Committed { step } => step <= s,
            Self::Cleared { step, cleared_at } => step <= s && s < cleared_at,
            Self::Pending | Self::Invalidated => false,
        }
    }

    /// Legacy numeric index: commit step, `-1` when hidden for good or by a clear.
    #[must_use]
    pub fn history_index(self) -> Option<i64> {
        match self {
            Self::Pending => None,
            Self::Committed { step } => Some(i64::try_from(step).unwrap_or(i64::MAX)),
            Self::Cleared { .. } | Self::Invalidated => Some(-1),
        }
    }

    /// The step this stroke was committed at, if it ever was.
    #[must_use]
    pub fn commit_step(self) -> Option<usize> {
        match self {
            Self::Committed { step } | Self::Cleared { step, .. } => Some(step),
            Self::Pending | Self::Invalidated => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum StateName {
    Pending,
    Committed,
    Cleared,
    Invalidated,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateRecord {
    state: StateName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    step: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cleared_at: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    history_index: Option<i64>,
}

/// A stroke state record missing a field its `state` requires.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{state}` stroke state requires `{field}`")]
pub struct StateFieldMissing {
    state: &'static str,
    field: &'static str,
}

impl From<StrokeState> for StateRecord {
    fn from(state: StrokeState) -> Self {
        let history_index = state.history_index();
        match state {
            StrokeState::Pending => {
                Self { state: StateName::Pending, step: None, cleared_at: None, history_index }
            }
            StrokeState::Committed { step } => {
                Self { state: StateName::Committed, step: Some(step), cleared_at: None, history_index }
            }
            StrokeState::Cleared { step, cleared_at } => {
                Self { state: StateName::Cleared, step: Some(step), cleared_at: Some(cleared_at), history_index }
            }
            StrokeState::Invalidated => {
                Self { state: StateName::Invalidated, step: None, cleared_at: None, history_index }
            }
        }
    }
}

impl TryFrom<StateRecord> for StrokeState {
    type Error = StateFieldMissing;

    fn try_from(record: StateRecord) -> Result<Self, Self::Error> {
        let step = |state| record.step.ok_or(StateFieldMissing { state, field: "step" });
        Ok(match record.state {
            StateName::Pending => Self::Pending,
            StateName::Committed => Self::Committed { step: step("committed")? },
            StateName::Cleared => Self::Cleared {
                step: step("cleared")?,
                cleared_at: record.cleared_at.ok_or(StateFieldMissing { state: "cleared", field: "clearedAt" })?,
            },
            StateName::Invalidated => Self::Invalidated,
        })
    }
}

/// A freehand stroke with its capture statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub id: StrokeId,
    pub tool: StrokeTool,
    pub color: String,
    #[serde(rename = "strokeWidth")]
    pub width: f64,
    pub points: Vec<StrokePoint>,
    /// Offset from session start in ms.
    #[serde(rename = "startTime")]
    pub start_ms: f64,
    /// Offset from session start in ms, set on completion.
    #[serde(rename = "endTime")]
    pub end_ms: Option<f64>,
    #[serde(rename = "totalDistance")]
    pub path_length: f64,
    pub average_speed: f64,
    pub average_pressure: f64,
    #[serde(rename = "boundingBox")]
    pub bounds: Option<Bounds>,
    #[serde(flatten)]
    pub state: StrokeState,
}

impl Stroke {
    /// A new, empty, pending stroke starting `start_ms` after session start.
    #[must_use]
    pub fn new(tool: StrokeTool, color: &str, width: f64, start_ms: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            tool,
            color: color.to_owned(),
            width,
            points: Vec::new(),
            start_ms,
            end_ms: None,
            path_length: 0.0,
            average_speed: 0.0,
            average_pressure: 0.0,
            bounds: None,
            state: StrokeState::Pending,
        }
    }

    /// Append a point, extending the running path length.
    pub fn push_point(&mut self, point: StrokePoint) {
        if let Some(last) = self.points.last() {
            self.path_length += last.position().distance_to(point.position());
        }
        self.points.push(point);
    }

    /// Seal the stroke: end time, averages, and bounding box.
    pub fn finish(&mut self, end_ms: f64) {
        self.end_ms = Some(end_ms);
        let duration = self.duration_ms();
        self.average_speed = if duration > 0.0 { self.path_length / duration } else { 0.0 };

        let pressures: Vec<f64> = self.points.iter().filter_map(|p| p.pressure).filter(|p| *p > 0.0).collect();
        self.average_pressure = if pressures.is_empty() {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let count = pressures.len() as f64;
            pressures.iter().sum::<f64>() / count
        };

        self.bounds = Bounds::from_points(self.points.iter().map(StrokePoint::position));
    }

    /// Duration in ms, 0 until the stroke is finished.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        self.end_ms.map_or(0.0, |end| end - self.start_ms)
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_eraser(&self) -> bool {
        self.tool == StrokeTool::Eraser
    }

    #[must_use]
    pub fn is_visible_at(&self, cursor: Option<usize>) -> bool {
        self.state.is_visible_at(cursor)
    }

    /// Whether any point carries a pressure reading.
    #[must_use]
    pub fn has_pressure(&self) -> bool {
        self.points.iter().any(|p| p.pressure.is_some())
    }
}
