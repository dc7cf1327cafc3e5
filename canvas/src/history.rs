//! Branching undo/redo history over the session's stroke collection.
//!
//! History stores no stroke payload. Each marker stands for one committed
//! action (a completed stroke or a clear-all); what is visible at a cursor is
//! reconstructed by filtering strokes on their [`StrokeState`]. Committing
//! while the cursor is behind the tail abandons the redo branch: strokes from
//! the abandoned steps are removed for good, and clears made on that branch
//! are undone.
//!
//! The timeline is capped; once over the limit the oldest marker is evicted
//! together with every stroke committed at step 0 and every invalidated
//! stroke, and all remaining steps shift down by one.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use log::debug;
use serde_json::json;

use crate::consts::HISTORY_LIMIT;
use crate::session::{Counter, EventKind, Session};
use crate::stroke::StrokeState;

/// Opaque history entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    /// Offset from session start at commit time, in ms.
    pub committed_at_ms: f64,
}

/// Ordered markers plus a cursor.
#[derive(Debug, Clone)]
pub struct History {
    markers: Vec<Marker>,
    cursor: Option<usize>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(HISTORY_LIMIT)
    }

    /// A history retaining at most `limit` markers (at least one).
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self { markers: Vec::new(), cursor: None, limit: limit.max(1) }
    }

    // --- Queries ---

    /// Current position, `None` when nothing has been committed.
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Cursor as a signed step, `-1` when empty.
    #[must_use]
    pub fn step(&self) -> i64 {
        self.cursor.map_or(-1, |c| i64::try_from(c).unwrap_or(i64::MAX))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        match self.cursor {
            Some(c) => c + 1 < self.markers.len(),
            None => !self.markers.is_empty(),
        }
    }

    // --- Mutations ---

    /// Record a new step and assign it to every pending stroke.
    pub fn commit(&mut self, session: &mut Session, now_ms: f64) {
        self.truncate_branch(session);
        self.append_marker(session, now_ms);
    }

    /// Step back one marker. Returns whether anything changed.
    pub fn undo(&mut self, session: &mut Session, now_ms: f64) -> bool {
        let Some(c) = self.cursor.filter(|c| *c > 0) else {
            return false;
        };
        self.cursor = Some(c - 1);
        session.bump(Counter::Undo);
        self.log_move(session, EventKind::Undo, now_ms);
        true
    }

    /// Step forward one marker. Returns whether anything changed.
    pub fn redo(&mut self, session: &mut Session, now_ms: f64) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.cursor = Some(self.cursor.map_or(0, |c| c + 1));
        session.bump(Counter::Redo);
        self.log_move(session, EventKind::Redo, now_ms);
        true
    }

    /// Hide every visible stroke as one undoable step. Returns the hidden count.
    pub fn clear_all(&mut self, session: &mut Session, now_ms: f64) -> usize {
        self.truncate_branch(session);
        let cursor = self.cursor;
        let cleared_at = cursor.map_or(0, |c| c + 1);
        let mut cleared = 0;
        for stroke in session.strokes_mut().iter_mut() {
            if let StrokeState::Committed { step } = stroke.state
                && stroke.state.is_visible_at(cursor)
            {
                stroke.state = StrokeState::Cleared { step, cleared_at };
                cleared += 1;
            }
        }
        session.log_event(EventKind::ClearAll, now_ms, json!({ "clearedCount": cleared }));
        self.append_marker(session, now_ms);
        cleared
    }

    /// Forget every marker.
    pub fn reset(&mut self) {
        self.markers.clear();
        self.cursor = None;
    }

    /// Abandon the redo branch, if any, so the next marker lands right after the cursor.
    fn truncate_branch(&mut self, session: &mut Session) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        if keep < self.markers.len() {
            discard_branch(session, self.cursor);
            self.markers.truncate(keep);
        }
    }

    fn append_marker(&mut self, session: &mut Session, now_ms: f64) {
        self.markers.push(Marker { committed_at_ms: session.relative_ms(now_ms) });
        let step = self.markers.len() - 1;
        self.cursor = Some(step);

        for stroke in session.strokes_mut().iter_mut() {
            if stroke.state == StrokeState::Pending {
                stroke.state = StrokeState::Committed { step };
            }
        }

        if self.markers.len() > self.limit {
            self.markers.remove(0);
            self.cursor = Some(step - 1);
            evict_first_step(session);
        }
        debug!("history: commit step={:?} len={}", self.cursor, self.markers.len());
    }

    fn log_move(&self, session: &mut Session, kind: EventKind, now_ms: f64) {
        let data = json!({
            "historyStep": self.step(),
            "totalHistoryLength": self.markers.len(),
        });
        session.log_event(kind, now_ms, data);
    }
}

/// Drop strokes committed after `cursor` and revive strokes cleared after it.
fn discard_branch(session: &mut Session, cursor: Option<usize>) {
    let before = session.strokes().len();
    session.strokes_mut().retain_mut(|stroke| match (stroke.state, cursor) {
        (StrokeState::Committed { step } | StrokeState::Cleared { step, .. }, None) => {
            debug!("history: dropping branch stroke at step {step}");
            false
        }
        (StrokeState::Committed { step }, Some(c)) => step <= c,
        (StrokeState::Cleared { step, cleared_at }, Some(c)) => {
            if step > c {
                return false;
            }
            if cleared_at > c {
                stroke.state = StrokeState::Committed { step };
            }
            true
        }
        (StrokeState::Pending | StrokeState::Invalidated, _) => true,
    });
    debug!("history: branch discarded {} strokes", before - session.strokes().len());
}

/// Drop everything at step 0 plus invalidated strokes, then shift steps down.
fn evict_first_step(session: &mut Session) {
    session.strokes_mut().retain_mut(|stroke| match stroke.state {
        StrokeState::Committed { step } => {
            if step == 0 {
                return false;
            }
            stroke.state = StrokeState::Committed { step: step - 1 };
            true
        }
        StrokeState::Cleared { step, cleared_at } => {
            if step == 0 {
                return false;
            }
            stroke.state = StrokeState::Cleared { step: step - 1, cleared_at: cleared_at.saturating_sub(1) };
            true
        }
        StrokeState::Invalidated => false,
        StrokeState::Pending => true,
    });
}
