//! Session aggregator: the stroke collection, event log, device capabilities,
//! and usage counters for one drawing session.
//!
//! The session is a single owned store. Components get narrow access: the
//! stroke builder pushes strokes and logs events, the classifier raises
//! capability flags, the history engine reassigns stroke states and bumps
//! counters, and the renderer only reads.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::stroke::{Stroke, StrokeId, StrokeState};

/// Unique identifier for a session.
pub type SessionId = Uuid;

/// Optional input channels observed during the session.
///
/// Flags are raised on first observation and never cleared until reset.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub pressure: bool,
    pub tilt: bool,
    pub twist: bool,
    pub coalesced: bool,
}

/// A usage counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Undo,
    Redo,
    Erase,
    Zoom,
    Pan,
    ToolChange,
    ColorChange,
    WidthChange,
}

/// Monotonic usage counters, reset only with the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counters {
    pub undo_count: u32,
    pub redo_count: u32,
    pub eraser_count: u32,
    pub zoom_count: u32,
    pub pan_count: u32,
    pub tool_changes: u32,
    pub color_changes: u32,
    pub stroke_width_changes: u32,
}

impl Counters {
    fn slot(&mut self, counter: Counter) -> &mut u32 {
        match counter {
            Counter::Undo => &mut self.undo_count,
            Counter::Redo => &mut self.redo_count,
            Counter::Erase => &mut self.eraser_count,
            Counter::Zoom => &mut self.zoom_count,
            Counter::Pan => &mut self.pan_count,
            Counter::ToolChange => &mut self.tool_changes,
            Counter::ColorChange => &mut self.color_changes,
            Counter::WidthChange => &mut self.stroke_width_changes,
        }
    }

    pub fn bump(&mut self, counter: Counter) {
        let slot = self.slot(counter);
        *slot = slot.saturating_add(1);
    }

    #[must_use]
    pub fn get(&self, counter: Counter) -> u32 {
        match counter {
            Counter::Undo => self.undo_count,
            Counter::Redo => self.redo_count,
            Counter::Erase => self.eraser_count,
            Counter::Zoom => self.zoom_count,
            Counter::Pan => self.pan_count,
            Counter::ToolChange => self.tool_changes,
            Counter::ColorChange => self.color_changes,
            Counter::WidthChange => self.stroke_width_changes,
        }
    }
}

/// Type tag of a logged session event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SessionStart,
    SessionEnd,
    StrokeStart,
    StrokeEnd,
    StrokeErase,
    ToolChange,
    ColorChange,
    StrokeWidthChange,
    Undo,
    Redo,
    ClearAll,
    ZoomIn,
    ZoomOut,
    PinchZoom,
    CanvasPan,
    WindowFocus,
    WindowBlur,
}

/// One entry of the append-only event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Offset from session start in ms.
    pub timestamp: f64,
    pub data: Value,
}

/// All state recorded for one drawing session.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    start_ms: f64,
    strokes: Vec<Stroke>,
    events: Vec<SessionEvent>,
    capabilities: Capabilities,
    counters: Counters,
}

impl Session {
    /// Start a session at absolute time `now_ms` and log `session_start`.
    #[must_use]
    pub fn new(now_ms: f64) -> Self {
        let mut session = Self {
            id: Uuid::new_v4(),
            start_ms: now_ms,
            strokes: Vec::new(),
            events: Vec::new(),
            capabilities: Capabilities::default(),
            counters: Counters::default(),
        };
        let id = session.id;
        session.log_event(EventKind::SessionStart, now_ms, json!({ "sessionId": id }));
        info!("session {id} started");
        session
    }

    /// Discard everything and start over with a fresh id.
    pub fn reset(&mut self, now_ms: f64) {
        *self = Self::new(now_ms);
    }

    /// Log `session_end`. The session stays usable.
    pub fn end(&mut self, now_ms: f64) {
        let data = json!({
            "totalStrokes": self.strokes.len(),
            "totalEvents": self.events.len(),
        });
        self.log_event(EventKind::SessionEnd, now_ms, data);
        info!("session {} ended after {:.0} ms", self.id, self.relative_ms(now_ms));
    }

    // --- Queries ---

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Absolute start time in ms since the Unix epoch.
    #[must_use]
    pub fn start_ms(&self) -> f64 {
        self.start_ms
    }

    /// Convert an absolute time into an offset from session start.
    #[must_use]
    pub fn relative_ms(&self, absolute_ms: f64) -> f64 {
        absolute_ms - self.start_ms
    }

    /// Every stroke, including cleared and invalidated ones, in commit order.
    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    #[must_use]
    pub fn stroke(&self, id: &StrokeId) -> Option<&Stroke> {
        self.strokes.iter().find(|s| s.id == *id)
    }

    /// Strokes drawn when the history cursor is `cursor`, in commit order.
    pub fn visible_strokes(&self, cursor: Option<usize>) -> impl Iterator<Item = &Stroke> {
        self.strokes.iter().filter(move |s| s.is_visible_at(cursor))
    }

    #[must_use]
    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    #[must_use]
    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Mean point count across all strokes, 0 with none.
    #[must_use]
    pub fn average_point_count(&self) -> f64 {
        if self.strokes.is_empty() {
            return 0.0;
        }
        let total: usize = self.strokes.iter().map(Stroke::point_count).sum();
        #[allow(clippy::cast_precision_loss)]
        let avg = total as f64 / self.strokes.len() as f64;
        avg
    }

    // --- Mutators ---

    /// Append an event stamped relative to session start.
    pub fn log_event(&mut self, kind: EventKind, now_ms: f64, data: Value) {
        let timestamp = self.relative_ms(now_ms);
        self.events.push(SessionEvent { kind, timestamp, data });
    }

    pub fn bump(&mut self, counter: Counter) {
        self.counters.bump(counter);
    }

    /// Mark every listed stroke invalidated. Returns how many changed.
    pub fn invalidate(&mut self, ids: &[StrokeId]) -> usize {
        let mut changed = 0;
        for stroke in self.strokes.iter_mut().filter(|s| ids.contains(&s.id)) {
            if stroke.state != StrokeState::Invalidated {
                stroke.state = StrokeState::Invalidated;
                changed += 1;
            }
        }
        changed
    }

    pub(crate) fn capabilities_mut(&mut self) -> &mut Capabilities {
        &mut self.capabilities
    }

    pub(crate) fn push_stroke(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    pub(crate) fn strokes_mut(&mut self) -> &mut Vec<Stroke> {
        &mut self.strokes
    }
}
