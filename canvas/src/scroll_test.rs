#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn engine() -> ScrollEngine {
    ScrollEngine::new(3_000.0, 800.0)
}

/// Drag from `from` to `to` over `dt` ms and release.
fn flick(scroll: &mut ScrollEngine, from: f64, to: f64, dt: f64) -> ScrollEnd {
    scroll.start_scroll(from, 0.0);
    scroll.move_scroll(to, dt);
    scroll.end_scroll()
}

fn momentum_token(end: ScrollEnd) -> AnimationToken {
    match end {
        ScrollEnd::Momentum(token) => token,
        other => panic!("expected momentum, got {other:?}"),
    }
}

// =============================================================
// Bounds
// =============================================================

#[test]
fn max_scroll_is_page_minus_viewport() {
    assert_eq!(engine().max_scroll(), 2_200.0);
}

#[test]
fn short_page_cannot_scroll() {
    let mut scroll = ScrollEngine::new(500.0, 800.0);
    assert_eq!(scroll.max_scroll(), 0.0);
    assert_eq!(scroll.wheel(250.0), 0.0);
    assert_eq!(scroll.scroll_y(), 0.0);
    assert!(!scroll.can_scroll_down());
}

#[test]
fn shrinking_page_reclamps_offset() {
    let mut scroll = engine();
    scroll.wheel(2_000.0);
    scroll.set_page_height(1_000.0);
    assert_eq!(scroll.scroll_y(), 200.0);
}

// =============================================================
// Drag
// =============================================================

#[test]
fn drag_moves_opposite_to_finger() {
    let mut scroll = engine();
    scroll.start_scroll(500.0, 0.0);
    assert!(scroll.move_scroll(400.0, 100.0));
    assert_eq!(scroll.scroll_y(), 100.0);
    assert!(approx_eq(scroll.velocity(), 1.0));
}

#[test]
fn drag_is_clamped_at_top() {
    let mut scroll = engine();
    scroll.start_scroll(100.0, 0.0);
    scroll.move_scroll(400.0, 10.0);
    assert_eq!(scroll.scroll_y(), 0.0);
    assert!(!scroll.can_scroll_up());
}

#[test]
fn move_without_drag_is_noop() {
    let mut scroll = engine();
    assert!(!scroll.move_scroll(10.0, 10.0));
    assert_eq!(scroll.end_scroll(), ScrollEnd::NotDragging);
}

#[test]
fn zero_dt_keeps_previous_velocity() {
    let mut scroll = engine();
    scroll.start_scroll(500.0, 0.0);
    scroll.move_scroll(480.0, 10.0);
    scroll.move_scroll(470.0, 10.0);
    assert!(approx_eq(scroll.velocity(), 2.0));
    assert_eq!(scroll.scroll_y(), 30.0);
}

#[test]
fn slow_release_stops_without_momentum() {
    let mut scroll = engine();
    assert_eq!(flick(&mut scroll, 500.0, 490.0, 100.0), ScrollEnd::Stopped);
    assert!(!scroll.is_animating());
}

// =============================================================
// Momentum
// =============================================================

#[test]
fn momentum_terminates_within_bound() {
    let mut scroll = engine();
    scroll.wheel(1_000.0);
    let token = momentum_token(flick(&mut scroll, 500.0, 480.0, 10.0));
    assert!(approx_eq(scroll.velocity(), 2.0));

    let mut frames = 0;
    loop {
        frames += 1;
        let step = scroll.step(token, 0.0);
        assert!(scroll.scroll_y() >= 0.0 && scroll.scroll_y() <= scroll.max_scroll());
        if step == FrameStep::Done {
            break;
        }
        assert_eq!(step, FrameStep::Continue);
        assert!(frames <= 59, "momentum did not stop");
    }
    assert!(frames <= 59);
    assert!(!scroll.is_animating());
}

#[test]
fn momentum_stays_in_bounds_at_the_edge() {
    let mut scroll = engine();
    scroll.wheel(2_190.0);
    let token = momentum_token(flick(&mut scroll, 500.0, 450.0, 10.0));
    while scroll.step(token, 0.0) == FrameStep::Continue {
        assert!(scroll.scroll_y() <= 2_200.0);
    }
    assert_eq!(scroll.scroll_y(), 2_200.0);
}

#[test]
fn new_drag_cancels_momentum() {
    let mut scroll = engine();
    scroll.wheel(1_000.0);
    let token = momentum_token(flick(&mut scroll, 500.0, 450.0, 10.0));
    scroll.start_scroll(300.0, 100.0);
    let before = scroll.scroll_y();
    assert_eq!(scroll.step(token, 116.0), FrameStep::Stale);
    assert_eq!(scroll.scroll_y(), before);
}

// =============================================================
// Wheel
// =============================================================

#[test]
fn wheel_applies_directly() {
    let mut scroll = engine();
    assert_eq!(scroll.wheel(120.0), 120.0);
    assert_eq!(scroll.wheel(-200.0), -120.0);
    assert!(!scroll.is_animating());
}

// =============================================================
// scroll_to
// =============================================================

#[test]
fn instant_scroll_to_snaps_and_clamps() {
    let mut scroll = engine();
    assert!(scroll.scroll_to(9_999.0, false, 0.0).is_none());
    assert_eq!(scroll.scroll_y(), 2_200.0);
}

#[test]
fn smooth_scroll_to_eases_out_over_600ms() {
    let mut scroll = engine();
    let token = scroll.scroll_to(1_000.0, true, 1_000.0).unwrap();

    assert_eq!(scroll.step(token, 1_300.0), FrameStep::Continue);
    // Cubic ease-out at t = 0.5 covers 87.5% of the distance.
    assert!(approx_eq(scroll.scroll_y(), 875.0));

    assert_eq!(scroll.step(token, 1_600.0), FrameStep::Done);
    assert_eq!(scroll.scroll_y(), 1_000.0);
    assert_eq!(scroll.step(token, 1_616.0), FrameStep::Stale);
}

#[test]
fn second_scroll_to_supersedes_first() {
    let mut scroll = engine();
    let first = scroll.scroll_to(1_000.0, true, 0.0).unwrap();
    let second = scroll.scroll_to(200.0, true, 0.0).unwrap();
    assert_ne!(first, second);
    assert_eq!(scroll.step(first, 300.0), FrameStep::Stale);
    assert_eq!(scroll.step(second, 600.0), FrameStep::Done);
    assert_eq!(scroll.scroll_y(), 200.0);
}

// =============================================================
// Helpers
// =============================================================

#[test]
fn progress_and_mapping() {
    let mut scroll = engine();
    scroll.wheel(600.0);
    assert!(approx_eq(scroll.progress(), 0.2));
    assert_eq!(scroll.to_screen_y(700.0), 100.0);
    assert_eq!(scroll.to_canvas_y(100.0), 700.0);
    assert!(scroll.can_scroll_up());
    assert!(scroll.can_scroll_down());
}

#[test]
fn reset_returns_to_top() {
    let mut scroll = engine();
    scroll.wheel(600.0);
    let token = scroll.scroll_to(100.0, true, 0.0).unwrap();
    scroll.reset();
    assert_eq!(scroll.scroll_y(), 0.0);
    assert_eq!(scroll.step(token, 100.0), FrameStep::Stale);
}
