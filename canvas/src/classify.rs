//! Device disambiguation: raw pointer/touch records to typed samples.
//!
//! Browsers report pen, finger, and mouse input through overlapping event
//! families with inconsistent fields. [`detect_kind`] resolves the device with
//! a fixed precedence:
//!
//! 1. an explicit device tag is authoritative;
//! 2. a real pressure reading means pen, the synthetic 0.5 means mouse;
//! 3. any tilt field, even zero, means pen;
//! 4. legacy touch lists: stylus tag, force/pressure, or angle data mean pen,
//!    anything else is a finger;
//! 5. mouse event types mean mouse;
//! 6. otherwise unknown.
//!
//! [`classify`] additionally extracts the optional channels and records which
//! ones the device supports in the session [`Capabilities`].

#[cfg(test)]
#[path = "classify_test.rs"]
mod classify_test;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::consts::{SYNTHETIC_PRESSURE, TOUCH_FORCE_FLOOR};
use crate::geom::Point;
use crate::input::{RawPointerEvent, RawTouch};
use crate::session::Capabilities;

/// Closed set of input devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Pen,
    Touch,
    Mouse,
    Finger,
    #[default]
    Unknown,
}

impl InputKind {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "pen" => Self::Pen,
            "touch" => Self::Touch,
            "mouse" => Self::Mouse,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pen => "pen",
            Self::Touch => "touch",
            Self::Mouse => "mouse",
            Self::Finger => "finger",
            Self::Unknown => "unknown",
        }
    }
}

/// A classified input sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub kind: InputKind,
    /// Position in canvas space.
    pub position: Point,
    /// Absolute wall-clock time in ms.
    pub time_ms: f64,
    /// Present only for a meaningful pressure reading.
    pub pressure: Option<f64>,
    pub tilt_x: f64,
    pub tilt_y: f64,
    pub twist: f64,
    pub contact_width: Option<f64>,
    pub contact_height: Option<f64>,
}

fn is_synthetic_pressure(p: f64) -> bool {
    (p - SYNTHETIC_PRESSURE).abs() < f64::EPSILON
}

fn above_floor(value: Option<f64>) -> bool {
    value.is_some_and(|v| v > TOUCH_FORCE_FLOOR)
}

fn classify_touch(touch: &RawTouch) -> InputKind {
    if touch.touch_type.as_deref() == Some("stylus") {
        return InputKind::Pen;
    }
    if above_floor(touch.force)
        || above_floor(touch.pressure)
        || touch.altitude_angle.is_some()
        || touch.azimuth_angle.is_some()
    {
        return InputKind::Pen;
    }
    InputKind::Finger
}

/// Resolve the input device of a raw event.
#[must_use]
pub fn detect_kind(raw: &RawPointerEvent) -> InputKind {
    if let Some(tag) = raw.pointer_type.as_deref()
        && !tag.is_empty()
    {
        return InputKind::from_tag(tag);
    }

    if let Some(p) = raw.pressure {
        if is_synthetic_pressure(p) {
            return InputKind::Mouse;
        }
        if p > 0.0 {
            return InputKind::Pen;
        }
    }

    if raw.tilt_x.is_some() || raw.tilt_y.is_some() {
        return InputKind::Pen;
    }

    if let Some(touch) = raw.changed_touches.first() {
        return classify_touch(touch);
    }

    if raw.event_type.contains("touch")
        && let Some(touch) = raw.touches.first()
    {
        if raw.touches.len() > 1 {
            return InputKind::Finger;
        }
        return classify_touch(touch);
    }

    if matches!(raw.event_type.as_str(), "mousedown" | "mousemove" | "mouseup") {
        return InputKind::Mouse;
    }

    InputKind::Unknown
}

/// Classify one raw event located at `position` (canvas space).
///
/// Returns `None` when the position or timestamp is not finite. Capability
/// flags are only ever raised, never cleared.
pub fn classify(raw: &RawPointerEvent, position: Point, caps: &mut Capabilities) -> Option<Sample> {
    if !position.is_finite() || !raw.time_ms.is_finite() {
        warn!("classify: dropping sample with non-finite position or time ({}, {})", raw.event_type, raw.time_ms);
        return None;
    }

    let kind = detect_kind(raw);
    let pressure = raw
        .pressure
        .filter(|p| p.is_finite() && *p > 0.0)
        .filter(|p| kind == InputKind::Pen || !is_synthetic_pressure(*p));

    if pressure.is_some() {
        caps.pressure = true;
    }
    if raw.tilt_x.is_some() || raw.tilt_y.is_some() {
        caps.tilt = true;
    }
    if raw.twist.is_some() {
        caps.twist = true;
    }

    let finite_or_zero = |v: Option<f64>| v.filter(|v| v.is_finite()).unwrap_or(0.0);
    let positive = |v: Option<f64>| v.filter(|v| v.is_finite() && *v > 0.0);

    debug!(
        "classify: {} -> {} pressure={pressure:?} tilt=({:?}, {:?}) twist={:?}",
        raw.event_type,
        kind.as_str(),
        raw.tilt_x,
        raw.tilt_y,
        raw.twist
    );

    Some(Sample {
        kind,
        position,
        time_ms: raw.time_ms,
        pressure,
        tilt_x: finite_or_zero(raw.tilt_x),
        tilt_y: finite_or_zero(raw.tilt_y),
        twist: finite_or_zero(raw.twist),
        contact_width: positive(raw.width),
        contact_height: positive(raw.height),
    })
}

/// Classify the coalesced sub-samples of `raw`, in order.
///
/// Returns `None` when the event carries no batch, in which case the caller
/// should classify the primary event instead. Sub-samples that fail
/// classification are skipped.
pub fn classify_batch<F>(raw: &RawPointerEvent, mut locate: F, caps: &mut Capabilities) -> Option<Vec<Sample>>
where
    F: FnMut(&RawPointerEvent) -> Point,
{
    if raw.coalesced.is_empty() {
        return None;
    }
    caps.coalesced = true;

    let mut samples = Vec::with_capacity(raw.coalesced.len());
    for (index, sub) in raw.coalesced.iter().enumerate() {
        match classify(sub, locate(sub), caps) {
            Some(sample) => samples.push(sample),
            None => warn!("classify_batch: skipped coalesced sample {index}"),
        }
    }
    Some(samples)
}
