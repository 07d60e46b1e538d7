//! Floor-plan editor kernel.
//!
//! This crate is compiled to WebAssembly and runs in the browser, but all of
//! its logic except drawing is plain Rust and tested natively. It owns the
//! element model and its invariants, the spatial queries behind hit-testing
//! and snapping, move/resize editing, and the interaction state machine that
//! turns pointer, wheel and key events into plan changes. The host layer
//! wires DOM events to the engine and persists the resulting
//! [`engine::Action`]s (see the `gateway` crate).
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`doc`] | Element types, wire format and the invariant-checking [`doc::PlanStore`] |
//! | [`geom`] | Distance, projection, containment and grid snapping |
//! | [`hit`] | Element, wall and handle queries at a world point |
//! | [`edit`] | Move and resize of existing elements |
//! | [`input`] | Tools, modes and the gesture state machine |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`render`] | Canvas 2D drawing |
//! | [`config`] | Editor configuration hydrated from the plan |
//! | [`error`] | Edit rejections |
//! | [`consts`] | Defaults and fixed numeric constants |

pub mod camera;
pub mod config;
pub mod consts;
pub mod doc;
pub mod edit;
pub mod engine;
pub mod error;
pub mod geom;
pub mod hit;
pub mod input;
pub mod render;
