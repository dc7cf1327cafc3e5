//! Stroke builder: turns a sequence of classified samples into a committed stroke.
//!
//! The builder is Idle until `start`, Active while samples arrive, and returns
//! to Idle when the stroke is either ended (pushed into the session and
//! committed into history in the same call) or cancelled (dropped without a
//! trace).

#[cfg(test)]
#[path = "builder_test.rs"]
mod builder_test;

use log::{debug, warn};
use serde_json::json;

use crate::classify::Sample;
use crate::history::History;
use crate::session::{Counter, EventKind, Session};
use crate::stroke::{Stroke, StrokeId, StrokePoint, StrokeTool};

/// Tool, color, and width of a new stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub tool: StrokeTool,
    pub color: String,
    pub width: f64,
}

/// Builds one stroke at a time.
#[derive(Debug, Clone, Default)]
pub struct StrokeBuilder {
    current: Option<Stroke>,
}

impl StrokeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// The stroke being captured, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Stroke> {
        self.current.as_ref()
    }

    /// Begin a stroke at `sample` and log `stroke_start`.
    ///
    /// An already active stroke is discarded first.
    pub fn start(&mut self, session: &mut Session, sample: &Sample, style: &StrokeStyle) -> StrokeId {
        if let Some(previous) = self.current.take() {
            warn!("builder: start while active; discarding stroke {}", previous.id);
        }

        let start_ms = session.relative_ms(sample.time_ms);
        let mut stroke = Stroke::new(style.tool, &style.color, style.width, start_ms);
        stroke.push_point(StrokePoint::from_sample(sample, 0.0));
        let id = stroke.id;

        session.log_event(
            EventKind::StrokeStart,
            sample.time_ms,
            json!({
                "strokeId": id,
                "tool": style.tool.as_str(),
                "color": style.color,
                "strokeWidth": style.width,
                "inputType": sample.kind.as_str(),
                "timestamp": start_ms,
            }),
        );
        debug!("builder: started {} stroke {id}", style.tool.as_str());
        self.current = Some(stroke);
        id
    }

    /// Append one sample. Returns `false` when no stroke is active.
    pub fn add_point(&mut self, session: &Session, sample: &Sample) -> bool {
        let Some(stroke) = self.current.as_mut() else {
            return false;
        };
        let t_ms = session.relative_ms(sample.time_ms) - stroke.start_ms;
        stroke.push_point(StrokePoint::from_sample(sample, t_ms));
        true
    }

    /// Append a coalesced batch in order. Returns how many were appended.
    pub fn add_coalesced_points(&mut self, session: &Session, samples: &[Sample]) -> usize {
        let mut appended = 0;
        for sample in samples {
            if !self.add_point(session, sample) {
                break;
            }
            appended += 1;
        }
        appended
    }

    /// Complete the active stroke at `now_ms`, hand it to the session, and commit it.
    pub fn end(&mut self, session: &mut Session, history: &mut History, now_ms: f64) -> Option<StrokeId> {
        let mut stroke = self.current.take()?;
        stroke.finish(session.relative_ms(now_ms));

        let id = stroke.id;
        let is_eraser = stroke.is_eraser();
        let data = json!({
            "strokeId": id,
            "pointCount": stroke.point_count(),
            "totalDistance": stroke.path_length,
            "averageSpeed": stroke.average_speed,
            "averagePressure": stroke.average_pressure,
            "duration": stroke.duration_ms(),
        });

        session.push_stroke(stroke);
        history.commit(session, now_ms);
        session.log_event(EventKind::StrokeEnd, now_ms, data);
        if is_eraser {
            session.bump(Counter::Erase);
        }
        Some(id)
    }

    /// Drop the active stroke. Returns whether there was one.
    pub fn cancel(&mut self) -> bool {
        match self.current.take() {
            Some(stroke) => {
                debug!("builder: cancelled stroke {}", stroke.id);
                true
            }
            None => false,
        }
    }
}
