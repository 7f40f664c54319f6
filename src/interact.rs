//! Interaction model: selection bookkeeping and the pointer gesture state
//! machine.
//!
//! Every layer except the background is movable by direct drag. Selection is
//! internal bookkeeping only — no part of the engine ever renders selection
//! decoration (no bounding box, no handles), so the composed design stays
//! visually clean while editing. Text layers additionally support in-place
//! editing, delegated to the host editor via
//! [`crate::engine::Action::EditTextRequested`].

#[cfg(test)]
#[path = "interact_test.rs"]
mod interact_test;

use crate::scene::{LayerId, Point};

/// Persistent UI state. Never visible in the rendered output.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// The id of the currently selected layer, if any. Used only for drag
    /// math and edit activation.
    pub selected_id: Option<LayerId>,
}

/// Internal state for the pointer state machine.
///
/// Per-layer lifecycle: `idle → selected → (dragging | editing) → idle`.
#[derive(Debug, Clone, Copy)]
pub enum PointerState {
    /// No gesture in progress; waiting for the next pointer-down.
    Idle,
    /// The user is moving a layer across the surface.
    Dragging {
        /// Id of the layer being dragged.
        id: LayerId,
        /// Pointer position at the previous event, used to compute deltas.
        last: Point,
        /// Layer center at the start of the drag, used to decide whether the
        /// gesture produced a mutation.
        origin: Point,
    },
    /// The user is editing a text layer in place via the host editor.
    EditingText {
        /// Id of the text layer being edited.
        id: LayerId,
    },
}

impl Default for PointerState {
    fn default() -> Self {
        Self::Idle
    }
}
