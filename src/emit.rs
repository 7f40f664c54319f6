//! Change emission: snapshots of the scene after every mutation, plus the
//! side-channel notification fired when a new emoji/text/image layer is
//! introduced.
//!
//! Listeners are held in explicit observer lists with stable subscriber ids —
//! multiple independent subscribers may attach and detach at any time. A
//! serialization failure is logged and the snapshot skipped; it never
//! propagates back into the mutation call site, and the mutation itself is
//! not rolled back (only the notification is lost).

#[cfg(test)]
#[path = "emit_test.rs"]
mod emit_test;

use crate::scene::{LayerId, LayerKind, Scene};

/// Immutable pair produced after every committed mutation and handed to
/// change listeners. Not retained by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSnapshot {
    /// Structural JSON description of every layer, sufficient to reconstruct
    /// the scene via [`Scene::from_json`].
    pub serialized_scene: String,
    /// Raster encoding (data URL) of the current surface contents.
    pub rendered_bitmap: String,
}

/// Notification fired once per new singleton-slot occupant and once per
/// explicit user-triggered add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerAdded {
    /// What was added: text, emoji, or image.
    pub kind: LayerKind,
    /// The human-meaningful content: text value, glyph, or image reference.
    pub content: String,
    /// Stable identifier of the new layer.
    pub id: LayerId,
}

/// Handle for removing a subscriber.
pub type SubscriberId = u64;

type ChangeListener = Box<dyn FnMut(&ChangeSnapshot)>;
type LayerAddedListener = Box<dyn FnMut(&LayerAdded)>;

/// Observer lists for change snapshots and layer-added notifications.
#[derive(Default)]
pub struct Emitter {
    change: Vec<(SubscriberId, ChangeListener)>,
    layer_added: Vec<(SubscriberId, LayerAddedListener)>,
    next_id: u64,
}

impl Emitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a change-snapshot listener.
    pub fn subscribe_change<F>(&mut self, listener: F) -> SubscriberId
    where
        F: FnMut(&ChangeSnapshot) + 'static,
    {
        let id = self.next_id();
        self.change.push((id, Box::new(listener)));
        id
    }

    /// Remove a change-snapshot listener. Returns `false` if unknown.
    pub fn unsubscribe_change(&mut self, id: SubscriberId) -> bool {
        let before = self.change.len();
        self.change.retain(|(sid, _)| *sid != id);
        self.change.len() != before
    }

    /// Register a layer-added listener.
    pub fn subscribe_layer_added<F>(&mut self, listener: F) -> SubscriberId
    where
        F: FnMut(&LayerAdded) + 'static,
    {
        let id = self.next_id();
        self.layer_added.push((id, Box::new(listener)));
        id
    }

    /// Remove a layer-added listener. Returns `false` if unknown.
    pub fn unsubscribe_layer_added(&mut self, id: SubscriberId) -> bool {
        let before = self.layer_added.len();
        self.layer_added.retain(|(sid, _)| *sid != id);
        self.layer_added.len() != before
    }

    /// Serialize the scene, pair it with the rendered bitmap, and invoke
    /// every change subscriber exactly once. Serialization failures are
    /// logged and swallowed here.
    pub fn emit_change(&mut self, scene: &Scene, rendered_bitmap: String) {
        let serialized_scene = match scene.to_json() {
            Ok(json) => json,
            Err(err) => {
                log::warn!("scene serialization failed, change snapshot skipped: {err}");
                return;
            }
        };
        let snapshot = ChangeSnapshot { serialized_scene, rendered_bitmap };
        for (_, listener) in &mut self.change {
            listener(&snapshot);
        }
    }

    /// Invoke every layer-added subscriber with the notification.
    pub fn notify_layer_added(&mut self, note: &LayerAdded) {
        for (_, listener) in &mut self.layer_added {
            listener(note);
        }
    }

    fn next_id(&mut self) -> SubscriberId {
        self.next_id += 1;
        self.next_id
    }
}
