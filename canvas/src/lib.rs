//! Stroke capture, history, and rendering engine for the memo canvas.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! drawing side of a problem-solving session: telling pen, finger, and mouse
//! input apart, building strokes with pressure and tilt telemetry, keeping a
//! branching undo/redo history, scrolling and zooming the page, and redrawing
//! the visible state. The host JavaScript layer wires DOM events to the
//! engine and submits the exported [`export::SessionTranscript`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`session`] | Stroke collection, event log, capabilities, counters |
//! | [`history`] | Branching undo/redo over stroke states |
//! | [`builder`] | Stroke capture state machine |
//! | [`stroke`] | Stroke and point types, per-stroke statistics |
//! | [`classify`] | Device detection and raw event to sample conversion |
//! | [`input`] | Raw event records, tools, and the gesture state machine |
//! | [`dom`] | `web_sys` event adapters |
//! | [`hit`] | Area hit-testing for object erasing |
//! | [`viewport`] | Zoom, pan, and coordinate mapping |
//! | [`scroll`] | Page scrolling with momentum and eased animations |
//! | [`render`] | `Surface` trait and frame drawing |
//! | [`overlay`] | Asynchronously loaded images drawn above strokes |
//! | [`export`] | Session transcript and audit |
//! | [`config`] | Query-string configuration |
//! | [`geom`] | Points, bounds, and transforms |
//! | [`consts`] | Shared numeric constants (zoom limits, widths, scroll tuning) |

pub mod builder;
pub mod classify;
pub mod config;
pub mod consts;
pub mod dom;
pub mod engine;
pub mod export;
pub mod geom;
pub mod history;
pub mod hit;
pub mod input;
pub mod overlay;
pub mod render;
pub mod scroll;
pub mod session;
pub mod stroke;
pub mod viewport;
