//! Shared numeric constants for the canvas crate.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f64 = 0.2;

/// Largest allowed zoom factor.
pub const MAX_ZOOM: f64 = 5.0;

/// Zoom factor after a reset.
pub const DEFAULT_ZOOM: f64 = 1.0;

/// Zoom increment applied by the zoom-in / zoom-out buttons.
pub const ZOOM_STEP: f64 = 0.2;

/// Surface width before the first container measurement, in CSS pixels.
pub const DEFAULT_CANVAS_WIDTH: f64 = 1200.0;

/// Surface height before the first container measurement, in CSS pixels.
pub const DEFAULT_CANVAS_HEIGHT: f64 = 800.0;

// ── Strokes ─────────────────────────────────────────────────────

/// Default ink color.
pub const DEFAULT_COLOR: &str = "#000000";

/// Default nominal stroke width in pixels.
pub const DEFAULT_STROKE_WIDTH: f64 = 3.0;

/// Thinnest selectable stroke width.
pub const MIN_STROKE_WIDTH: f64 = 1.0;

/// Thickest selectable stroke width.
pub const MAX_STROKE_WIDTH: f64 = 20.0;

/// Eraser brush diameter in pixels.
pub const ERASER_SIZE: f64 = 20.0;

/// Fraction of the nominal width drawn at zero pressure.
pub const PRESSURE_WIDTH_BASE: f64 = 0.5;

// ── Input classification ────────────────────────────────────────

/// Pressure reported by hardware without a pressure sensor.
pub const SYNTHETIC_PRESSURE: f64 = 0.5;

/// Touch force / pressure above this value indicates a stylus.
pub const TOUCH_FORCE_FLOOR: f64 = 0.1;

// ── History ─────────────────────────────────────────────────────

/// Maximum number of retained history markers.
pub const HISTORY_LIMIT: usize = 50;

// ── Scrolling ───────────────────────────────────────────────────

/// Page height used until the host reports the real content height.
pub const DEFAULT_PAGE_HEIGHT: f64 = 3000.0;

/// Release velocity (px/ms) above which momentum scrolling starts.
pub const MOMENTUM_DEADBAND: f64 = 0.5;

/// Per-frame velocity multiplier during momentum.
pub const MOMENTUM_FRICTION: f64 = 0.95;

/// Momentum stops once |velocity| drops below this (px/ms).
pub const MOMENTUM_FLOOR: f64 = 0.1;

/// Nominal frame duration used to integrate momentum, in ms.
pub const FRAME_MS: f64 = 16.0;

/// Duration of a smooth `scroll_to` animation, in ms.
pub const SCROLL_TO_DURATION_MS: f64 = 600.0;

/// Wheel deltas larger than this are logged as pan events.
pub const WHEEL_LOG_THRESHOLD_PX: f64 = 10.0;

/// Pixels per line for line-mode wheel deltas.
pub const WHEEL_LINE_PX: f64 = 16.0;

// ── Gestures ────────────────────────────────────────────────────

/// Minimum change in touch distance that counts as a pinch, in pixels.
pub const PINCH_THRESHOLD_PX: f64 = 20.0;
