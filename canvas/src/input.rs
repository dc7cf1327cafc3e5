//! Input model: raw device records, tools, UI state, and the gesture state machine.
//!
//! `RawPointerEvent` is the boundary type: the DOM adapters in [`crate::dom`]
//! fill it from pointer and touch events, and [`crate::classify`] turns it into
//! a typed [`crate::classify::Sample`] exactly once. Everything downstream of
//! the classifier works with samples, never with raw fields.
//!
//! `InputState` is the gesture tracked between pointer-down and pointer-up.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_COLOR, DEFAULT_STROKE_WIDTH};
use crate::geom::Point;
use crate::stroke::StrokeTool;

/// One entry of a legacy touch list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTouch {
    /// Position in client coordinates.
    pub client: Point,
    /// `"stylus"` or `"direct"` where the platform reports it.
    pub touch_type: Option<String>,
    pub force: Option<f64>,
    pub pressure: Option<f64>,
    pub altitude_angle: Option<f64>,
    pub azimuth_angle: Option<f64>,
}

/// A device event as delivered by the browser, before classification.
///
/// Every optional field is `None` when the platform does not report it;
/// classification treats absence and presence differently, so adapters must
/// not substitute defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPointerEvent {
    /// DOM event type, e.g. `"pointerdown"` or `"touchmove"`.
    pub event_type: String,
    /// Explicit device tag (`"pen"`, `"touch"`, `"mouse"`).
    pub pointer_type: Option<String>,
    /// Position in client coordinates.
    pub client: Point,
    pub pressure: Option<f64>,
    pub tilt_x: Option<f64>,
    pub tilt_y: Option<f64>,
    pub twist: Option<f64>,
    /// Contact geometry width.
    pub width: Option<f64>,
    /// Contact geometry height.
    pub height: Option<f64>,
    /// Active touches (legacy touch form).
    pub touches: Vec<RawTouch>,
    /// Touches that changed with this event (legacy touch form).
    pub changed_touches: Vec<RawTouch>,
    /// High-frequency samples batched into this event, oldest first.
    pub coalesced: Vec<RawPointerEvent>,
    /// Absolute wall-clock time in ms since the Unix epoch.
    pub time_ms: f64,
}

impl RawPointerEvent {
    /// Client positions of the active touches.
    #[must_use]
    pub fn touch_points(&self) -> Vec<Point> {
        self.touches.iter().map(|t| t.client).collect()
    }

    /// Whether the event carries two or more simultaneous touches.
    #[must_use]
    pub fn is_multi_touch(&self) -> bool {
        self.touches.len() >= 2
    }
}

/// Wall-clock time of a coalesced sample.
///
/// `event_stamp` and `sample_stamp` are the browser's high-resolution
/// `timeStamp`s of the dispatched event and the sample; the gap between them
/// is applied to `wall_ms`, the wall-clock time read when the event arrived.
#[must_use]
pub fn coalesced_time_ms(wall_ms: f64, event_stamp: f64, sample_stamp: f64) -> f64 {
    let offset = sample_stamp - event_stamp;
    if offset.is_finite() { wall_ms + offset } else { wall_ms }
}

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Freehand ink (default).
    #[default]
    Pen,
    /// Destination-out brush.
    Eraser,
    /// Drag to scroll the page.
    Hand,
}

impl Tool {
    /// The stroke tool this tool draws with, if it draws at all.
    #[must_use]
    pub fn stroke_tool(self) -> Option<StrokeTool> {
        match self {
            Self::Pen => Some(StrokeTool::Pen),
            Self::Eraser => Some(StrokeTool::Eraser),
            Self::Hand => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pen => "pen",
            Self::Eraser => "eraser",
            Self::Hand => "hand",
        }
    }
}

/// Persistent UI state set through the radial menu.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub tool: Tool,
    /// CSS color string for new pen strokes.
    pub color: String,
    /// Nominal width for new strokes.
    pub stroke_width: f64,
}

impl Default for UiState {
    fn default() -> Self {
        Self { tool: Tool::Pen, color: DEFAULT_COLOR.to_owned(), stroke_width: DEFAULT_STROKE_WIDTH }
    }
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// A pen or eraser stroke is being captured by the stroke builder.
    Drawing,
    /// The hand tool is dragging the page.
    Scrolling,
    /// Two fingers are pinching.
    Pinching {
        /// Touch positions at the last applied zoom step, in surface space.
        last_touches: Vec<Point>,
        /// Zoom factor when the pinch began.
        start_zoom: f64,
    },
}
