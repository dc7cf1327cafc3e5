//! Bitmap overlays drawn above the strokes.
//!
//! Overlays are registered before their image has loaded. The host reports
//! the outcome through [`Overlays::loaded`] or [`Overlays::failed`]; only
//! loaded overlays are ever drawn, and failed ones are not retried.

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use log::warn;

/// Identifier handed out by [`Overlays::begin`].
pub type OverlayId = u64;

/// Load state of one overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayState<I> {
    Loading,
    Ready { image: I, width: f64, height: f64 },
    Failed,
}

/// One overlay: canvas position, requested size, and load state.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay<I> {
    pub id: OverlayId,
    pub x: f64,
    pub y: f64,
    requested_width: Option<f64>,
    requested_height: Option<f64>,
    pub state: OverlayState<I>,
}

/// A loaded overlay ready to draw.
#[derive(Debug)]
pub struct Drawable<'a, I> {
    pub image: &'a I,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// All overlays in insertion order.
#[derive(Debug, Clone)]
pub struct Overlays<I> {
    items: Vec<Overlay<I>>,
    next_id: OverlayId,
}

impl<I> Default for Overlays<I> {
    fn default() -> Self {
        Self { items: Vec::new(), next_id: 1 }
    }
}

fn positive(v: Option<f64>) -> Option<f64> {
    v.filter(|v| v.is_finite() && *v > 0.0)
}

impl<I> Overlays<I> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an overlay whose image is still loading.
    ///
    /// A missing or non-positive size falls back to the image's natural size.
    pub fn begin(&mut self, x: f64, y: f64, width: Option<f64>, height: Option<f64>) -> OverlayId {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push(Overlay {
            id,
            x,
            y,
            requested_width: positive(width),
            requested_height: positive(height),
            state: OverlayState::Loading,
        });
        id
    }

    /// The image for `id` finished loading. Returns whether `id` was pending.
    pub fn loaded(&mut self, id: OverlayId, image: I, natural_width: f64, natural_height: f64) -> bool {
        let Some(item) = self.pending_mut(id) else {
            return false;
        };
        let width = item.requested_width.unwrap_or(natural_width);
        let height = item.requested_height.unwrap_or(natural_height);
        item.state = OverlayState::Ready { image, width, height };
        true
    }

    /// The image for `id` failed to load. Returns whether `id` was pending.
    pub fn failed(&mut self, id: OverlayId) -> bool {
        let Some(item) = self.pending_mut(id) else {
            return false;
        };
        warn!("overlay {id}: image failed to load");
        item.state = OverlayState::Failed;
        true
    }

    /// Remove an overlay in any state.
    pub fn remove(&mut self, id: OverlayId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    #[must_use]
    pub fn get(&self, id: OverlayId) -> Option<&Overlay<I>> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Loaded overlays in insertion order.
    pub fn drawable(&self) -> impl Iterator<Item = Drawable<'_, I>> {
        self.items.iter().filter_map(|item| match &item.state {
            OverlayState::Ready { image, width, height } => {
                Some(Drawable { image, x: item.x, y: item.y, width: *width, height: *height })
            }
            OverlayState::Loading | OverlayState::Failed => None,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn pending_mut(&mut self, id: OverlayId) -> Option<&mut Overlay<I>> {
        self.items.iter_mut().find(|item| item.id == id && matches!(item.state, OverlayState::Loading))
    }
}
