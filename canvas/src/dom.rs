//! DOM adapters: `web_sys` pointer, touch, and wheel events to raw records.
//!
//! This is the only module that reads browser event objects. Fields the
//! platform does not expose on the typed bindings (touch type, stylus angles,
//! coalesced batches) are read reflectively; anything missing stays `None`.

use js_sys::{Array, Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{PointerEvent, Touch, TouchEvent, TouchList, WheelEvent};

use crate::consts::WHEEL_LINE_PX;
use crate::geom::Point;
use crate::input::{RawPointerEvent, RawTouch, coalesced_time_ms};

/// Wall-clock time in ms since the Unix epoch.
#[must_use]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

fn reflect_f64(target: &JsValue, key: &str) -> Option<f64> {
    match Reflect::get(target, &JsValue::from_str(key)) {
        Ok(value) => value.as_f64(),
        Err(_) => None,
    }
}

fn reflect_string(target: &JsValue, key: &str) -> Option<String> {
    match Reflect::get(target, &JsValue::from_str(key)) {
        Ok(value) => value.as_string(),
        Err(_) => None,
    }
}

/// Tilt and twist are only meaningful for pens; other devices report zeros.
fn pen_channel(is_pen: bool, value: i32) -> Option<f64> {
    (is_pen || value != 0).then(|| f64::from(value))
}

fn pointer_fields(ev: &PointerEvent, time_ms: f64) -> RawPointerEvent {
    let pointer_type = ev.pointer_type();
    let is_pen = pointer_type == "pen";
    RawPointerEvent {
        event_type: ev.type_(),
        pointer_type: (!pointer_type.is_empty()).then_some(pointer_type),
        client: Point::new(f64::from(ev.client_x()), f64::from(ev.client_y())),
        pressure: Some(f64::from(ev.pressure())),
        tilt_x: pen_channel(is_pen, ev.tilt_x()),
        tilt_y: pen_channel(is_pen, ev.tilt_y()),
        twist: pen_channel(is_pen, ev.twist()),
        width: reflect_f64(ev.as_ref(), "width"),
        height: reflect_f64(ev.as_ref(), "height"),
        time_ms,
        ..RawPointerEvent::default()
    }
}

/// Sub-events batched into `ev` by the browser, oldest first.
fn coalesced_events(ev: &PointerEvent) -> Vec<PointerEvent> {
    let Ok(method) = Reflect::get(ev.as_ref(), &JsValue::from_str("getCoalescedEvents")) else {
        return Vec::new();
    };
    let Ok(method) = method.dyn_into::<Function>() else {
        return Vec::new();
    };
    let Ok(list) = method.call0(ev.as_ref()).and_then(|value| value.dyn_into::<Array>()) else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(list.length() as usize);
    for value in list.iter() {
        if let Ok(sub) = value.dyn_into::<PointerEvent>() {
            out.push(sub);
        }
    }
    out
}

/// Convert a pointer event, including its coalesced batch when the browser provides one.
#[must_use]
pub fn pointer_event_to_raw(ev: &PointerEvent) -> RawPointerEvent {
    let time_ms = now_ms();
    let mut raw = pointer_fields(ev, time_ms);
    let stamp = ev.time_stamp();
    raw.coalesced = coalesced_events(ev)
        .iter()
        .map(|sub| pointer_fields(sub, coalesced_time_ms(time_ms, stamp, sub.time_stamp())))
        .collect();
    raw
}

fn touch_to_raw(touch: &Touch) -> RawTouch {
    let target: &JsValue = touch.as_ref();
    RawTouch {
        client: Point::new(f64::from(touch.client_x()), f64::from(touch.client_y())),
        touch_type: reflect_string(target, "touchType"),
        force: Some(f64::from(touch.force())),
        pressure: reflect_f64(target, "pressure"),
        altitude_angle: reflect_f64(target, "altitudeAngle"),
        azimuth_angle: reflect_f64(target, "azimuthAngle"),
    }
}

fn touch_list(list: &TouchList) -> Vec<RawTouch> {
    (0..list.length()).filter_map(|i| list.get(i)).map(|t| touch_to_raw(&t)).collect()
}

/// Convert a legacy touch event. The primary position is the first changed touch.
#[must_use]
pub fn touch_event_to_raw(ev: &TouchEvent) -> RawPointerEvent {
    let touches = touch_list(&ev.touches());
    let changed_touches = touch_list(&ev.changed_touches());
    let client = changed_touches.first().or(touches.first()).map(|t| t.client).unwrap_or_default();
    RawPointerEvent {
        event_type: ev.type_(),
        client,
        touches,
        changed_touches,
        time_ms: now_ms(),
        ..RawPointerEvent::default()
    }
}

/// Vertical wheel delta in pixels. Page-mode deltas scale by `page_px`.
#[must_use]
pub fn wheel_delta_y(ev: &WheelEvent, page_px: f64) -> f64 {
    match ev.delta_mode() {
        WheelEvent::DOM_DELTA_LINE => ev.delta_y() * WHEEL_LINE_PX,
        WheelEvent::DOM_DELTA_PAGE => ev.delta_y() * page_px,
        _ => ev.delta_y(),
    }
}
