//! Session transcript: the JSON document handed to the submission service.
//!
//! The transcript carries every stroke (including cleared and invalidated
//! ones, for analysis), the strokes visible at the history cursor, the full
//! event log, capability flags, and summary statistics. It round-trips
//! through JSON, and [`SessionTranscript::audit`] re-checks the structural
//! invariants of a transcript loaded from elsewhere.

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::session::{Capabilities, Counters, Session, SessionEvent, SessionId};
use crate::stroke::{Stroke, StrokeId, StrokeState};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("timestamp {0} ms is out of range")]
    TimestampRange(f64),
    #[error("failed to format timestamp: {0}")]
    Format(#[from] time::error::Format),
    #[error("transcript JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// RFC 3339 start time.
    pub start_time: String,
    /// RFC 3339 export time.
    pub end_time: String,
    /// Milliseconds between start and export.
    pub duration: f64,
    pub total_strokes: usize,
    pub total_events: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasData {
    pub strokes: Vec<Stroke>,
    pub visible_strokes: Vec<Stroke>,
    pub events: Vec<SessionEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    #[serde(flatten)]
    pub counters: Counters,
    /// Mean point count per stroke.
    pub average_stroke_length: f64,
    pub session_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTranscript {
    pub session_id: SessionId,
    pub session_info: SessionInfo,
    pub device_capabilities: Capabilities,
    pub canvas_data: CanvasData,
    pub statistics: Statistics,
}

/// A structural problem found by [`SessionTranscript::audit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditIssue {
    /// A stroke point lies outside the stroke's bounding box.
    PointOutsideBounds { stroke: StrokeId, index: usize },
    /// A completed stroke has points but no bounding box.
    MissingBounds { stroke: StrokeId },
    /// A visible stroke is absent from the full stroke list.
    UnknownVisibleStroke { stroke: StrokeId },
    /// A visible stroke is in a state that can never be visible.
    HiddenStateVisible { stroke: StrokeId },
    /// Two strokes share an id.
    DuplicateStroke { stroke: StrokeId },
    /// An event is stamped earlier than the one before it.
    EventOutOfOrder { index: usize },
}

impl std::fmt::Display for AuditIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PointOutsideBounds { stroke, index } => {
                write!(f, "stroke {stroke}: point {index} outside bounding box")
            }
            Self::MissingBounds { stroke } => write!(f, "stroke {stroke}: missing bounding box"),
            Self::UnknownVisibleStroke { stroke } => write!(f, "visible stroke {stroke} not in stroke list"),
            Self::HiddenStateVisible { stroke } => write!(f, "visible stroke {stroke} is pending or invalidated"),
            Self::DuplicateStroke { stroke } => write!(f, "stroke id {stroke} appears more than once"),
            Self::EventOutOfOrder { index } => write!(f, "event {index} is earlier than its predecessor"),
        }
    }
}

/// Format an absolute epoch-milliseconds time as RFC 3339 (UTC).
///
/// # Errors
///
/// Returns `Err` when the time is not finite or outside the representable range.
pub fn iso_timestamp(epoch_ms: f64) -> Result<String, ExportError> {
    if !epoch_ms.is_finite() {
        return Err(ExportError::TimestampRange(epoch_ms));
    }
    #[allow(clippy::cast_possible_truncation)]
    let nanos = (epoch_ms * 1_000_000.0).round() as i128;
    let at = OffsetDateTime::from_unix_timestamp_nanos(nanos).map_err(|_| ExportError::TimestampRange(epoch_ms))?;
    Ok(at.format(&Rfc3339)?)
}

impl SessionTranscript {
    /// Snapshot `session` with visibility decided by `cursor`, exported at `now_ms`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if either timestamp cannot be formatted.
    pub fn from_session(session: &Session, cursor: Option<usize>, now_ms: f64) -> Result<Self, ExportError> {
        let duration = session.relative_ms(now_ms);
        Ok(Self {
            session_id: session.id(),
            session_info: SessionInfo {
                start_time: iso_timestamp(session.start_ms())?,
                end_time: iso_timestamp(now_ms)?,
                duration,
                total_strokes: session.strokes().len(),
                total_events: session.events().len(),
            },
            device_capabilities: session.capabilities(),
            canvas_data: CanvasData {
                strokes: session.strokes().to_vec(),
                visible_strokes: session.visible_strokes(cursor).cloned().collect(),
                events: session.events().to_vec(),
            },
            statistics: Statistics {
                counters: session.counters(),
                average_stroke_length: session.average_point_count(),
                session_duration: duration,
            },
        })
    }

    /// # Errors
    ///
    /// Returns `Err` if serialization fails.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string(self)?)
    }

    /// # Errors
    ///
    /// Returns `Err` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// # Errors
    ///
    /// Returns `Err` if `json` is not a valid transcript.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check the structural invariants. An empty list means the transcript is consistent.
    #[must_use]
    pub fn audit(&self) -> Vec<AuditIssue> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for stroke in &self.canvas_data.strokes {
            if !seen.insert(stroke.id) {
                issues.push(AuditIssue::DuplicateStroke { stroke: stroke.id });
            }
            audit_bounds(stroke, &mut issues);
        }

        for stroke in &self.canvas_data.visible_strokes {
            if !seen.contains(&stroke.id) {
                issues.push(AuditIssue::UnknownVisibleStroke { stroke: stroke.id });
            }
            if matches!(stroke.state, StrokeState::Pending | StrokeState::Invalidated) {
                issues.push(AuditIssue::HiddenStateVisible { stroke: stroke.id });
            }
        }

        for (index, pair) in self.canvas_data.events.windows(2).enumerate() {
            if pair[1].timestamp < pair[0].timestamp {
                issues.push(AuditIssue::EventOutOfOrder { index: index + 1 });
            }
        }

        issues
    }
}

fn audit_bounds(stroke: &Stroke, issues: &mut Vec<AuditIssue>) {
    if stroke.end_ms.is_none() || stroke.points.is_empty() {
        return;
    }
    let Some(bounds) = stroke.bounds else {
        issues.push(AuditIssue::MissingBounds { stroke: stroke.id });
        return;
    };
    for (index, point) in stroke.points.iter().enumerate() {
        if !bounds.contains(point.position()) {
            issues.push(AuditIssue::PointOutsideBounds { stroke: stroke.id, index });
        }
    }
}
