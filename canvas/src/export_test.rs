#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;
use crate::builder::{StrokeBuilder, StrokeStyle};
use crate::classify::{InputKind, Sample};
use crate::geom::{Bounds, Point};
use crate::history::History;
use crate::session::Counter;
use crate::stroke::StrokeTool;

// =============================================================
// Helpers
// =============================================================

/// 2024-01-01T00:00:00Z
const T0: f64 = 1_704_067_200_000.0;

fn sample(x: f64, y: f64, t: f64) -> Sample {
    Sample {
        kind: InputKind::Pen,
        position: Point::new(x, y),
        time_ms: T0 + t,
        pressure: Some(0.4),
        tilt_x: 0.0,
        tilt_y: 0.0,
        twist: 0.0,
        contact_width: None,
        contact_height: None,
    }
}

fn draw_stroke(session: &mut Session, history: &mut History, points: &[(f64, f64)], t: f64) {
    let style = StrokeStyle { tool: StrokeTool::Pen, color: "#000000".to_owned(), width: 3.0 };
    let mut builder = StrokeBuilder::new();
    let (x0, y0) = points[0];
    builder.start(session, &sample(x0, y0, t), &style);
    for (i, &(x, y)) in points.iter().enumerate().skip(1) {
        builder.add_point(session, &sample(x, y, t + f64::from(u32::try_from(i).unwrap()) * 10.0));
    }
    builder.end(session, history, T0 + t + 100.0).unwrap();
}

fn recorded_session() -> (Session, History) {
    let mut session = Session::new(T0);
    let mut history = History::new();
    draw_stroke(&mut session, &mut history, &[(0.0, 0.0), (10.0, 10.0)], 0.0);
    draw_stroke(&mut session, &mut history, &[(5.0, 5.0), (6.0, 9.0), (7.0, 2.0), (1.0, 1.0)], 200.0);
    history.undo(&mut session, T0 + 400.0);
    session.bump(Counter::Zoom);
    (session, history)
}

// =============================================================
// iso_timestamp
// =============================================================

#[test]
fn iso_timestamp_is_utc_rfc3339() {
    let s = iso_timestamp(T0).unwrap();
    assert!(s.starts_with("2024-01-01T00:00:00"), "{s}");
    assert!(s.ends_with('Z'), "{s}");
}

#[test]
fn iso_timestamp_rejects_non_finite() {
    assert!(matches!(iso_timestamp(f64::NAN), Err(ExportError::TimestampRange(_))));
    assert!(iso_timestamp(f64::MAX).is_err());
}

// =============================================================
// from_session
// =============================================================

#[test]
fn transcript_summarises_session() {
    let (session, history) = recorded_session();
    let transcript = SessionTranscript::from_session(&session, history.cursor(), T0 + 1_000.0).unwrap();

    assert_eq!(transcript.session_id, session.id());
    assert_eq!(transcript.session_info.duration, 1_000.0);
    assert_eq!(transcript.session_info.total_strokes, 2);
    assert_eq!(transcript.session_info.total_events, session.events().len());
    assert_eq!(transcript.canvas_data.strokes.len(), 2);
    assert_eq!(transcript.canvas_data.visible_strokes.len(), 1);
    assert_eq!(transcript.statistics.counters.undo_count, 1);
    assert_eq!(transcript.statistics.counters.zoom_count, 1);
    assert_eq!(transcript.statistics.average_stroke_length, 3.0);
    assert_eq!(transcript.statistics.session_duration, 1_000.0);
}

#[test]
fn transcript_json_uses_camel_case_shape() {
    let (session, history) = recorded_session();
    let transcript = SessionTranscript::from_session(&session, history.cursor(), T0 + 1_000.0).unwrap();
    let json: serde_json::Value = serde_json::from_str(&transcript.to_json().unwrap()).unwrap();

    assert!(json["sessionId"].is_string());
    assert!(json["sessionInfo"]["startTime"].as_str().unwrap().starts_with("2024-01-01"));
    assert_eq!(json["sessionInfo"]["totalStrokes"], 2);
    assert!(json["deviceCapabilities"]["coalesced"].is_boolean());
    assert_eq!(json["canvasData"]["visibleStrokes"].as_array().unwrap().len(), 1);
    assert_eq!(json["statistics"]["undoCount"], 1);
    assert_eq!(json["statistics"]["strokeWidthChanges"], 0);
    assert_eq!(json["statistics"]["averageStrokeLength"], 3.0);
    assert_eq!(json["canvasData"]["events"][0]["type"], "session_start");
}

#[test]
fn strokes_carry_history_index() {
    let (mut session, mut history) = recorded_session();
    draw_stroke(&mut session, &mut history, &[(40.0, 40.0), (50.0, 50.0)], 500.0);
    history.clear_all(&mut session, T0 + 700.0);
    let erased = session.strokes()[1].id;
    session.invalidate(&[erased]);

    let transcript = SessionTranscript::from_session(&session, history.cursor(), T0 + 1_000.0).unwrap();
    let json: serde_json::Value = serde_json::from_str(&transcript.to_json().unwrap()).unwrap();
    let strokes = json["canvasData"]["strokes"].as_array().unwrap();

    assert_eq!(strokes.len(), 2);
    assert_eq!(strokes[0]["state"], "cleared");
    assert_eq!(strokes[0]["historyIndex"], -1);
    assert_eq!(strokes[1]["state"], "invalidated");
    assert_eq!(strokes[1]["historyIndex"], -1);
}

#[test]
fn committed_strokes_export_their_step() {
    let (session, history) = recorded_session();
    let transcript = SessionTranscript::from_session(&session, history.cursor(), T0 + 1_000.0).unwrap();
    let json: serde_json::Value = serde_json::from_str(&transcript.to_json().unwrap()).unwrap();
    assert_eq!(json["canvasData"]["strokes"][0]["historyIndex"], 0);
    assert_eq!(json["canvasData"]["strokes"][1]["historyIndex"], 1);
}

#[test]
fn transcript_survives_json() {
    let (session, history) = recorded_session();
    let transcript = SessionTranscript::from_session(&session, history.cursor(), T0 + 1_000.0).unwrap();
    let back = SessionTranscript::from_json(&transcript.to_json_pretty().unwrap()).unwrap();
    assert_eq!(back, transcript);
}

#[test]
fn from_json_rejects_garbage() {
    assert!(matches!(SessionTranscript::from_json("{\"sessionId\": 3}"), Err(ExportError::Json(_))));
}

// =============================================================
// audit
// =============================================================

#[test]
fn recorded_session_passes_audit() {
    let (session, history) = recorded_session();
    let transcript = SessionTranscript::from_session(&session, history.cursor(), T0 + 1_000.0).unwrap();
    assert_eq!(transcript.audit(), Vec::new());
}

#[test]
fn audit_flags_tampered_bounds() {
    let (session, history) = recorded_session();
    let mut transcript = SessionTranscript::from_session(&session, history.cursor(), T0 + 1_000.0).unwrap();
    let id = transcript.canvas_data.strokes[1].id;
    transcript.canvas_data.strokes[1].bounds = Some(Bounds { min_x: 0.0, min_y: 0.0, max_x: 1.0, max_y: 1.0 });

    let issues = transcript.audit();
    assert!(issues.contains(&AuditIssue::PointOutsideBounds { stroke: id, index: 0 }));
    assert!(!issues.contains(&AuditIssue::PointOutsideBounds { stroke: id, index: 3 }));
}

#[test]
fn audit_flags_inconsistent_visible_set() {
    let (session, history) = recorded_session();
    let mut transcript = SessionTranscript::from_session(&session, history.cursor(), T0 + 1_000.0).unwrap();
    let mut ghost = transcript.canvas_data.visible_strokes[0].clone();
    ghost.id = uuid::Uuid::new_v4();
    ghost.state = StrokeState::Invalidated;
    let ghost_id = ghost.id;
    transcript.canvas_data.visible_strokes.push(ghost);

    let issues = transcript.audit();
    assert!(issues.contains(&AuditIssue::UnknownVisibleStroke { stroke: ghost_id }));
    assert!(issues.contains(&AuditIssue::HiddenStateVisible { stroke: ghost_id }));
}

#[test]
fn audit_flags_out_of_order_events() {
    let (session, history) = recorded_session();
    let mut transcript = SessionTranscript::from_session(&session, history.cursor(), T0 + 1_000.0).unwrap();
    transcript.canvas_data.events[1].timestamp = -5.0;
    assert!(transcript.audit().contains(&AuditIssue::EventOutOfOrder { index: 1 }));
}
