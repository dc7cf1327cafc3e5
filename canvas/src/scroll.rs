//! Vertical page scrolling: drag, wheel, momentum, and eased `scroll_to`.
//!
//! Animations are explicit tasks. Starting one returns an [`AnimationToken`];
//! the host calls [`ScrollEngine::step`] with that token once per display
//! frame until it reports [`FrameStep::Done`]. Any new drag, `scroll_to`, or
//! cancel bumps the generation so steps carrying an older token are no-ops.
//!
//! `scroll_y` is clamped to `[0, max(0, page_height - viewport_height)]` after
//! every mutation.

#[cfg(test)]
#[path = "scroll_test.rs"]
mod scroll_test;

use crate::consts::{
    DEFAULT_CANVAS_HEIGHT, DEFAULT_PAGE_HEIGHT, FRAME_MS, MOMENTUM_DEADBAND, MOMENTUM_FLOOR, MOMENTUM_FRICTION,
    SCROLL_TO_DURATION_MS,
};

/// Identifies one scheduled animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationToken(u64);

/// Outcome of one animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStep {
    /// The offset moved; schedule another frame.
    Continue,
    /// The animation finished on this frame.
    Done,
    /// The token is no longer current; nothing happened.
    Stale,
}

/// How a drag ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollEnd {
    /// No drag was in progress.
    NotDragging,
    /// The drag stopped without enough velocity for momentum.
    Stopped,
    /// Momentum started; step it with this token.
    Momentum(AnimationToken),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Animation {
    Momentum { velocity: f64 },
    Ease { from: f64, to: f64, started_ms: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    last_y: f64,
    last_ms: f64,
}

/// Scroll offset and gesture state for the page.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollEngine {
    scroll_y: f64,
    page_height: f64,
    viewport_height: f64,
    velocity: f64,
    drag: Option<Drag>,
    animation: Option<(AnimationToken, Animation)>,
    generation: u64,
}

impl Default for ScrollEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_HEIGHT, DEFAULT_CANVAS_HEIGHT)
    }
}

fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

impl ScrollEngine {
    #[must_use]
    pub fn new(page_height: f64, viewport_height: f64) -> Self {
        Self {
            scroll_y: 0.0,
            page_height: page_height.max(0.0),
            viewport_height: viewport_height.max(0.0),
            velocity: 0.0,
            drag: None,
            animation: None,
            generation: 0,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    /// Last measured drag velocity, or the live momentum velocity, in px/ms.
    #[must_use]
    pub fn velocity(&self) -> f64 {
        match self.animation {
            Some((_, Animation::Momentum { velocity })) => velocity,
            _ => self.velocity,
        }
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Largest reachable offset.
    #[must_use]
    pub fn max_scroll(&self) -> f64 {
        (self.page_height - self.viewport_height).max(0.0)
    }

    /// Offset as a fraction of the page height.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.page_height > 0.0 { self.scroll_y / self.page_height } else { 0.0 }
    }

    #[must_use]
    pub fn can_scroll_up(&self) -> bool {
        self.scroll_y > 0.0
    }

    #[must_use]
    pub fn can_scroll_down(&self) -> bool {
        self.scroll_y < self.max_scroll()
    }

    /// Absolute canvas Y to on-screen Y.
    #[must_use]
    pub fn to_screen_y(&self, canvas_y: f64) -> f64 {
        canvas_y - self.scroll_y
    }

    /// On-screen Y to absolute canvas Y.
    #[must_use]
    pub fn to_canvas_y(&self, screen_y: f64) -> f64 {
        screen_y + self.scroll_y
    }

    // --- Geometry ---

    pub fn set_page_height(&mut self, height: f64) {
        if height.is_finite() {
            self.page_height = height.max(0.0);
            self.scroll_y = self.clamp(self.scroll_y);
        }
    }

    pub fn set_viewport_height(&mut self, height: f64) {
        if height.is_finite() {
            self.viewport_height = height.max(0.0);
            self.scroll_y = self.clamp(self.scroll_y);
        }
    }

    fn clamp(&self, y: f64) -> f64 {
        if y.is_finite() { y.clamp(0.0, self.max_scroll()) } else { self.scroll_y }
    }

    // --- Drag ---

    /// Begin a drag at screen `y`. Cancels any running animation.
    pub fn start_scroll(&mut self, y: f64, now_ms: f64) {
        self.cancel_animation();
        self.velocity = 0.0;
        self.drag = Some(Drag { last_y: y, last_ms: now_ms });
    }

    /// Follow the drag. Returns whether a drag was in progress.
    pub fn move_scroll(&mut self, y: f64, now_ms: f64) -> bool {
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        let delta = drag.last_y - y;
        let dt = now_ms - drag.last_ms;
        drag.last_y = y;
        drag.last_ms = now_ms;
        if dt > 0.0 {
            self.velocity = delta / dt;
        }
        self.scroll_y = self.clamp(self.scroll_y + delta);
        true
    }

    /// Finish the drag, starting momentum when released fast enough.
    pub fn end_scroll(&mut self) -> ScrollEnd {
        if self.drag.take().is_none() {
            return ScrollEnd::NotDragging;
        }
        if self.velocity.abs() > MOMENTUM_DEADBAND {
            let token = self.next_token();
            self.animation = Some((token, Animation::Momentum { velocity: self.velocity }));
            return ScrollEnd::Momentum(token);
        }
        self.velocity = 0.0;
        ScrollEnd::Stopped
    }

    /// Abort a drag without momentum.
    pub fn cancel_drag(&mut self) {
        self.drag = None;
        self.velocity = 0.0;
    }

    // --- Wheel / programmatic ---

    /// Apply a wheel delta directly. Returns the offset change actually applied.
    pub fn wheel(&mut self, delta_y: f64) -> f64 {
        let before = self.scroll_y;
        self.scroll_y = self.clamp(self.scroll_y + delta_y);
        self.scroll_y - before
    }

    /// Move to `target` (clamped), snapping or easing over 600 ms.
    ///
    /// Returns a token when an eased animation was started.
    pub fn scroll_to(&mut self, target: f64, smooth: bool, now_ms: f64) -> Option<AnimationToken> {
        self.cancel_animation();
        let to = self.clamp(target);
        if !smooth || !now_ms.is_finite() {
            self.scroll_y = to;
            return None;
        }
        let token = self.next_token();
        self.animation = Some((token, Animation::Ease { from: self.scroll_y, to, started_ms: now_ms }));
        Some(token)
    }

    /// Stop whatever animation is running; outstanding tokens become stale.
    pub fn cancel_animation(&mut self) {
        self.animation = None;
        self.generation += 1;
    }

    /// Advance the animation identified by `token` to time `now_ms`.
    pub fn step(&mut self, token: AnimationToken, now_ms: f64) -> FrameStep {
        let Some((current, animation)) = self.animation else {
            return FrameStep::Stale;
        };
        if current != token {
            return FrameStep::Stale;
        }

        match animation {
            Animation::Momentum { velocity } => {
                let velocity = velocity * MOMENTUM_FRICTION;
                if velocity.abs() < MOMENTUM_FLOOR {
                    self.animation = None;
                    self.velocity = 0.0;
                    return FrameStep::Done;
                }
                self.scroll_y = self.clamp(self.scroll_y + velocity * FRAME_MS);
                self.animation = Some((token, Animation::Momentum { velocity }));
                FrameStep::Continue
            }
            Animation::Ease { from, to, started_ms } => {
                let t = ((now_ms - started_ms) / SCROLL_TO_DURATION_MS).clamp(0.0, 1.0);
                let t = if t.is_nan() { 1.0 } else { t };
                self.scroll_y = self.clamp(from + (to - from) * ease_out_cubic(t));
                if t >= 1.0 {
                    self.animation = None;
                    return FrameStep::Done;
                }
                FrameStep::Continue
            }
        }
    }

    /// Back to the top with no drag or animation.
    pub fn reset(&mut self) {
        self.cancel_animation();
        self.drag = None;
        self.velocity = 0.0;
        self.scroll_y = 0.0;
    }

    fn next_token(&mut self) -> AnimationToken {
        self.generation += 1;
        AnimationToken(self.generation)
    }
}
