#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;
use crate::stroke::StrokeTool;

const T0: f64 = 1_700_000_000_000.0;

fn committed(step: usize) -> Stroke {
    let mut stroke = Stroke::new(StrokeTool::Pen, "#000000", 3.0, 0.0);
    stroke.state = StrokeState::Committed { step };
    stroke
}

// =============================================================
// Lifecycle
// =============================================================

#[test]
fn new_session_logs_start() {
    let session = Session::new(T0);
    assert_eq!(session.start_ms(), T0);
    assert_eq!(session.events().len(), 1);
    let event = &session.events()[0];
    assert_eq!(event.kind, EventKind::SessionStart);
    assert_eq!(event.timestamp, 0.0);
    assert_eq!(event.data["sessionId"], session.id().to_string());
}

#[test]
fn reset_creates_fresh_session() {
    let mut session = Session::new(T0);
    let old_id = session.id();
    session.push_stroke(committed(0));
    session.bump(Counter::Undo);
    *session.capabilities_mut() = Capabilities { pressure: true, ..Capabilities::default() };

    session.reset(T0 + 1_000.0);
    assert_ne!(session.id(), old_id);
    assert!(session.strokes().is_empty());
    assert_eq!(session.counters(), Counters::default());
    assert_eq!(session.capabilities(), Capabilities::default());
    assert_eq!(session.events().len(), 1);
    assert_eq!(session.start_ms(), T0 + 1_000.0);
}

#[test]
fn end_logs_session_end() {
    let mut session = Session::new(T0);
    session.end(T0 + 500.0);
    let last = session.events().last().unwrap();
    assert_eq!(last.kind, EventKind::SessionEnd);
    assert_eq!(last.timestamp, 500.0);
}

// =============================================================
// Events / counters
// =============================================================

#[test]
fn events_are_stamped_relative_to_start() {
    let mut session = Session::new(T0);
    session.log_event(EventKind::ZoomIn, T0 + 42.0, serde_json::json!({ "zoom": 1.2 }));
    let last = session.events().last().unwrap();
    assert_eq!(last.timestamp, 42.0);
    assert_eq!(last.data["zoom"], 1.2);
}

#[test]
fn event_kind_serializes_snake_case() {
    let event = SessionEvent { kind: EventKind::StrokeWidthChange, timestamp: 1.0, data: serde_json::json!({}) };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "stroke_width_change");
}

#[test]
fn counters_bump_independently() {
    let mut counters = Counters::default();
    counters.bump(Counter::Pan);
    counters.bump(Counter::Pan);
    counters.bump(Counter::ColorChange);
    assert_eq!(counters.get(Counter::Pan), 2);
    assert_eq!(counters.get(Counter::ColorChange), 1);
    assert_eq!(counters.get(Counter::Zoom), 0);
}

// =============================================================
// Strokes
// =============================================================

#[test]
fn visible_strokes_filters_by_cursor() {
    let mut session = Session::new(T0);
    session.push_stroke(committed(0));
    session.push_stroke(committed(1));
    session.push_stroke(committed(2));
    assert_eq!(session.visible_strokes(Some(1)).count(), 2);
    assert_eq!(session.visible_strokes(None).count(), 0);
}

#[test]
fn invalidate_only_touches_listed_strokes() {
    let mut session = Session::new(T0);
    let a = committed(0);
    let b = committed(1);
    let (a_id, b_id) = (a.id, b.id);
    session.push_stroke(a);
    session.push_stroke(b);

    assert_eq!(session.invalidate(&[a_id]), 1);
    assert_eq!(session.invalidate(&[a_id]), 0);
    assert_eq!(session.stroke(&a_id).unwrap().state, StrokeState::Invalidated);
    assert_eq!(session.stroke(&b_id).unwrap().state, StrokeState::Committed { step: 1 });
    assert_eq!(session.strokes().len(), 2);
}

#[test]
fn average_point_count() {
    let mut session = Session::new(T0);
    assert_eq!(session.average_point_count(), 0.0);
    let mut a = committed(0);
    a.points = vec![crate::stroke::StrokePoint {
        x: 0.0,
        y: 0.0,
        t_ms: 0.0,
        pressure: None,
        tilt_x: 0.0,
        tilt_y: 0.0,
        twist: 0.0,
        input_kind: crate::classify::InputKind::Mouse,
        width: None,
        height: None,
    }; 4];
    session.push_stroke(a);
    session.push_stroke(committed(1));
    assert_eq!(session.average_point_count(), 2.0);
}
