//! Design-composition engine for the garment print customizer.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! drawing surface on which a user assembles a garment print from a background
//! image, a flat fill color, free-form text, emoji glyphs, and uploaded
//! images. Externally supplied configuration flows in through the sync bridge,
//! pointer input flows in through the interaction handlers, and every
//! committed mutation fans out a change snapshot (serialized scene + rendered
//! bitmap) to registered listeners. The host shell is responsible only for
//! wiring DOM events to the engine and performing the actual image fetches it
//! requests via [`engine::Action`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`scene`] | Layer types and the in-memory scene store |
//! | [`sync`] | Declarative config inputs reconciled against the scene |
//! | [`interact`] | Pointer gesture state machine and selection bookkeeping |
//! | [`emit`] | Change snapshots and layer-added notifications |
//! | [`hit`] | Hit-testing layers under a pointer position |
//! | [`render`] | Scene painting onto the 2D context |
//! | [`consts`] | Shared numeric constants (surface defaults, upload cap, etc.) |

pub mod consts;
pub mod emit;
pub mod engine;
pub mod hit;
pub mod interact;
pub mod render;
pub mod scene;
pub mod sync;
