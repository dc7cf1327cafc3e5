#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;
use crate::classify::InputKind;
use crate::geom::Point;
use crate::stroke::StrokeState;

// =============================================================
// Helpers
// =============================================================

const T0: f64 = 1_700_000_000_000.0;

fn sample(x: f64, y: f64, t: f64) -> Sample {
    Sample {
        kind: InputKind::Pen,
        position: Point::new(x, y),
        time_ms: T0 + t,
        pressure: Some(0.5),
        tilt_x: 0.0,
        tilt_y: 0.0,
        twist: 0.0,
        contact_width: None,
        contact_height: None,
    }
}

fn pen() -> StrokeStyle {
    StrokeStyle { tool: StrokeTool::Pen, color: "#112233".to_owned(), width: 4.0 }
}

fn eraser() -> StrokeStyle {
    StrokeStyle { tool: StrokeTool::Eraser, color: "#000000".to_owned(), width: 20.0 }
}

// =============================================================
// State machine
// =============================================================

#[test]
fn starts_idle() {
    let builder = StrokeBuilder::new();
    assert!(!builder.is_active());
    assert!(builder.current().is_none());
}

#[test]
fn start_creates_pending_stroke_with_first_point() {
    let mut session = Session::new(T0);
    let mut builder = StrokeBuilder::new();
    let id = builder.start(&mut session, &sample(1.0, 2.0, 100.0), &pen());

    let stroke = builder.current().unwrap();
    assert_eq!(stroke.id, id);
    assert_eq!(stroke.state, StrokeState::Pending);
    assert_eq!(stroke.start_ms, 100.0);
    assert_eq!(stroke.points.len(), 1);
    assert_eq!(stroke.points[0].t_ms, 0.0);
    assert!(session.strokes().is_empty());
}

#[test]
fn start_logs_stroke_start() {
    let mut session = Session::new(T0);
    let mut builder = StrokeBuilder::new();
    builder.start(&mut session, &sample(0.0, 0.0, 10.0), &pen());
    let event = session.events().last().unwrap();
    assert_eq!(event.kind, EventKind::StrokeStart);
    assert_eq!(event.data["tool"], "pen");
    assert_eq!(event.data["color"], "#112233");
    assert_eq!(event.data["inputType"], "pen");
}

#[test]
fn add_point_when_idle_is_noop() {
    let session = Session::new(T0);
    let mut builder = StrokeBuilder::new();
    assert!(!builder.add_point(&session, &sample(0.0, 0.0, 0.0)));
    assert_eq!(builder.add_coalesced_points(&session, &[sample(0.0, 0.0, 0.0)]), 0);
}

#[test]
fn points_are_timed_from_stroke_start() {
    let mut session = Session::new(T0);
    let mut builder = StrokeBuilder::new();
    builder.start(&mut session, &sample(0.0, 0.0, 100.0), &pen());
    assert!(builder.add_point(&session, &sample(3.0, 4.0, 116.0)));
    let stroke = builder.current().unwrap();
    assert_eq!(stroke.points[1].t_ms, 16.0);
    assert_eq!(stroke.path_length, 5.0);
}

#[test]
fn coalesced_points_append_in_order() {
    let mut session = Session::new(T0);
    let mut builder = StrokeBuilder::new();
    builder.start(&mut session, &sample(0.0, 0.0, 0.0), &pen());
    let batch = [sample(1.0, 0.0, 4.0), sample(2.0, 0.0, 8.0), sample(3.0, 0.0, 12.0)];
    assert_eq!(builder.add_coalesced_points(&session, &batch), 3);
    assert_eq!(builder.add_coalesced_points(&session, &[]), 0);
    let xs: Vec<f64> = builder.current().unwrap().points.iter().map(|p| p.x).collect();
    assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0]);
}

#[test]
fn end_commits_stroke_into_session_and_history() {
    let mut session = Session::new(T0);
    let mut history = History::new();
    let mut builder = StrokeBuilder::new();
    builder.start(&mut session, &sample(0.0, 0.0, 0.0), &pen());
    builder.add_point(&session, &sample(10.0, 0.0, 50.0));

    let id = builder.end(&mut session, &mut history, T0 + 100.0).unwrap();
    assert!(!builder.is_active());
    let stroke = session.stroke(&id).unwrap();
    assert_eq!(stroke.state, StrokeState::Committed { step: 0 });
    assert_eq!(stroke.end_ms, Some(100.0));
    assert_eq!(stroke.average_speed, 0.1);
    assert!(stroke.bounds.is_some());
    assert_eq!(history.cursor(), Some(0));

    let event = session.events().last().unwrap();
    assert_eq!(event.kind, EventKind::StrokeEnd);
    assert_eq!(event.data["pointCount"], 2);
    assert_eq!(event.data["totalDistance"], 10.0);
}

#[test]
fn end_when_idle_returns_none() {
    let mut session = Session::new(T0);
    let mut history = History::new();
    let mut builder = StrokeBuilder::new();
    assert!(builder.end(&mut session, &mut history, T0).is_none());
    assert!(history.is_empty());
}

#[test]
fn eraser_strokes_bump_erase_counter() {
    let mut session = Session::new(T0);
    let mut history = History::new();
    let mut builder = StrokeBuilder::new();
    builder.start(&mut session, &sample(0.0, 0.0, 0.0), &eraser());
    builder.end(&mut session, &mut history, T0 + 10.0);
    assert_eq!(session.counters().eraser_count, 1);
}

#[test]
fn cancel_discards_without_trace() {
    let mut session = Session::new(T0);
    let mut builder = StrokeBuilder::new();
    builder.start(&mut session, &sample(0.0, 0.0, 0.0), &pen());
    let events_before = session.events().len();
    assert!(builder.cancel());
    assert!(!builder.cancel());
    assert!(session.strokes().is_empty());
    assert_eq!(session.events().len(), events_before);
}

#[test]
fn restart_discards_previous_stroke() {
    let mut session = Session::new(T0);
    let mut builder = StrokeBuilder::new();
    let first = builder.start(&mut session, &sample(0.0, 0.0, 0.0), &pen());
    let second = builder.start(&mut session, &sample(5.0, 5.0, 10.0), &pen());
    assert_ne!(first, second);
    assert_eq!(builder.current().unwrap().id, second);
    assert_eq!(builder.current().unwrap().points.len(), 1);
}
