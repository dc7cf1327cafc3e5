#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point(x: f64, y: f64, t_ms: f64, pressure: Option<f64>) -> StrokePoint {
    StrokePoint {
        x,
        y,
        t_ms,
        pressure,
        tilt_x: 0.0,
        tilt_y: 0.0,
        twist: 0.0,
        input_kind: InputKind::Pen,
        width: None,
        height: None,
    }
}

// =============================================================
// StrokeState visibility
// =============================================================

#[test]
fn committed_visible_from_its_step_on() {
    let state = StrokeState::Committed { step: 2 };
    assert!(!state.is_visible_at(Some(1)));
    assert!(state.is_visible_at(Some(2)));
    assert!(state.is_visible_at(Some(9)));
}

#[test]
fn cleared_visible_only_between_commit_and_clear() {
    let state = StrokeState::Cleared { step: 1, cleared_at: 4 };
    assert!(!state.is_visible_at(Some(0)));
    assert!(state.is_visible_at(Some(1)));
    assert!(state.is_visible_at(Some(3)));
    assert!(!state.is_visible_at(Some(4)));
}

#[test]
fn pending_and_invalidated_never_visible() {
    for cursor in [None, Some(0), Some(10)] {
        assert!(!StrokeState::Pending.is_visible_at(cursor));
        assert!(!StrokeState::Invalidated.is_visible_at(cursor));
    }
}

#[test]
fn nothing_visible_without_history() {
    assert!(!StrokeState::Committed { step: 0 }.is_visible_at(None));
}

#[test]
fn legacy_history_index() {
    assert_eq!(StrokeState::Pending.history_index(), None);
    assert_eq!(StrokeState::Committed { step: 3 }.history_index(), Some(3));
    assert_eq!(StrokeState::Cleared { step: 3, cleared_at: 5 }.history_index(), Some(-1));
    assert_eq!(StrokeState::Invalidated.history_index(), Some(-1));
}

#[test]
fn state_serializes_tagged() {
    let json = serde_json::to_value(StrokeState::Cleared { step: 1, cleared_at: 2 }).unwrap();
    assert_eq!(json, serde_json::json!({ "state": "cleared", "step": 1, "clearedAt": 2, "historyIndex": -1 }));
}

#[test]
fn state_record_carries_history_index() {
    let committed = serde_json::to_value(StrokeState::Committed { step: 4 }).unwrap();
    assert_eq!(committed, serde_json::json!({ "state": "committed", "step": 4, "historyIndex": 4 }));
    let invalidated = serde_json::to_value(StrokeState::Invalidated).unwrap();
    assert_eq!(invalidated["historyIndex"], -1);
    let pending = serde_json::to_value(StrokeState::Pending).unwrap();
    assert!(pending["historyIndex"].is_null());
}

#[test]
fn state_reads_back_ignoring_history_index() {
    let json = serde_json::json!({ "state": "cleared", "step": 1, "clearedAt": 2, "historyIndex": 7 });
    let state: StrokeState = serde_json::from_value(json).unwrap();
    assert_eq!(state, StrokeState::Cleared { step: 1, cleared_at: 2 });
}

#[test]
fn state_without_required_step_is_rejected() {
    let json = serde_json::json!({ "state": "committed" });
    let err = serde_json::from_value::<StrokeState>(json).unwrap_err();
    assert!(err.to_string().contains("requires `step`"));
}

// =============================================================
// Stroke statistics
// =============================================================

#[test]
fn new_stroke_is_pending_and_empty() {
    let stroke = Stroke::new(StrokeTool::Pen, "#ff0000", 4.0, 100.0);
    assert_eq!(stroke.state, StrokeState::Pending);
    assert!(stroke.points.is_empty());
    assert_eq!(stroke.duration_ms(), 0.0);
}

#[test]
fn push_point_accumulates_path_length() {
    let mut stroke = Stroke::new(StrokeTool::Pen, "#000000", 3.0, 0.0);
    stroke.push_point(point(0.0, 0.0, 0.0, None));
    stroke.push_point(point(3.0, 4.0, 10.0, None));
    stroke.push_point(point(3.0, 10.0, 20.0, None));
    assert!(approx_eq(stroke.path_length, 11.0));
}

#[test]
fn finish_computes_speed_pressure_and_bounds() {
    let mut stroke = Stroke::new(StrokeTool::Pen, "#000000", 3.0, 1_000.0);
    stroke.push_point(point(0.0, 0.0, 0.0, Some(0.2)));
    stroke.push_point(point(30.0, 40.0, 50.0, None));
    stroke.push_point(point(30.0, 0.0, 100.0, Some(0.6)));
    stroke.finish(1_100.0);

    assert!(approx_eq(stroke.path_length, 90.0));
    assert!(approx_eq(stroke.average_speed, 0.9));
    assert!(approx_eq(stroke.average_pressure, 0.4));
    assert_eq!(stroke.bounds, Some(Bounds { min_x: 0.0, min_y: 0.0, max_x: 30.0, max_y: 40.0 }));
}

#[test]
fn zero_duration_means_zero_speed() {
    let mut stroke = Stroke::new(StrokeTool::Pen, "#000000", 3.0, 50.0);
    stroke.push_point(point(0.0, 0.0, 0.0, None));
    stroke.push_point(point(10.0, 0.0, 0.0, None));
    stroke.finish(50.0);
    assert_eq!(stroke.average_speed, 0.0);
    assert_eq!(stroke.average_pressure, 0.0);
}

#[test]
fn every_point_lies_inside_bounds() {
    let mut stroke = Stroke::new(StrokeTool::Pen, "#000000", 3.0, 0.0);
    for i in 0..40 {
        let t = f64::from(i);
        stroke.push_point(point((t * 0.7).sin() * 50.0, (t * 0.3).cos() * 80.0 - t, t, None));
    }
    stroke.finish(40.0);
    let bounds = stroke.bounds.unwrap();
    assert!(stroke.points.iter().all(|p| bounds.contains(p.position())));
}

#[test]
fn stroke_serializes_with_transcript_field_names() {
    let mut stroke = Stroke::new(StrokeTool::Eraser, "#000000", 20.0, 0.0);
    stroke.push_point(point(1.0, 2.0, 0.0, None));
    stroke.finish(5.0);
    let json = serde_json::to_value(&stroke).unwrap();
    assert_eq!(json["tool"], "eraser");
    assert_eq!(json["strokeWidth"], 20.0);
    assert_eq!(json["boundingBox"], serde_json::json!([1.0, 2.0, 1.0, 2.0]));
    assert_eq!(json["points"][0]["inputType"], "pen");
    assert_eq!(json["points"][0]["tMs"], 0.0);
    assert_eq!(json["state"], "pending");
    assert!(json["historyIndex"].is_null());
}
