//! Scene model: layers, their properties, and the in-memory store.
//!
//! This module defines the core data types that describe what is on the
//! drawing surface (`Layer`, `LayerKind`, `TextStyle`), the three reserved
//! singleton slots fed by declarative configuration (`Slot`), and the runtime
//! store that owns all live layers plus ambient background state (`Scene`).
//!
//! Data flows into this layer from the sync bridge (config reconciliation)
//! and from the interaction handlers (drag mutations). The renderer reads
//! from `Scene` via `sorted_layers` to determine draw order, which is
//! strictly insertion order.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a layer.
pub type LayerId = Uuid;

/// A point in surface coordinates (pixels, origin top-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The kind of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerKind {
    /// Full-surface background image, behind everything else.
    BackgroundImage,
    /// A run of styled text.
    Text,
    /// A single emoji glyph drawn as text.
    Emoji,
    /// A raster image placed on the design.
    Image,
}

impl LayerKind {
    /// Whether layers of this kind can be repositioned by pointer drag.
    #[must_use]
    pub fn movable(self) -> bool {
        !matches!(self, Self::BackgroundImage)
    }

    /// Whether layers of this kind support in-place text editing.
    #[must_use]
    pub fn editable_in_place(self) -> bool {
        matches!(self, Self::Text)
    }

    /// Whether rotation and independent axis scaling are locked. Text layers
    /// are locked to keep typography predictable.
    #[must_use]
    pub fn transform_locked(self) -> bool {
        matches!(self, Self::Text | Self::BackgroundImage)
    }
}

/// One of the three reserved singleton roles guaranteed to hold at most one
/// layer at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Slot {
    BackgroundImage,
    Emoji,
    Image,
}

/// Baseline placement for a text layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    #[default]
    Normal,
    Superscript,
    Subscript,
}

/// Styling attributes carried by text layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub font_size: f64,
    pub color: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub script: Script,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: crate::consts::DEFAULT_FONT_SIZE,
            color: crate::consts::DEFAULT_TEXT_COLOR.to_owned(),
            bold: false,
            italic: false,
            underline: false,
            script: Script::Normal,
        }
    }
}

/// A layer as stored in the scene and in serialized snapshots.
///
/// `x` / `y` are the layer's geometric center in surface coordinates.
/// `z_index` is assigned at insertion; later insertions draw on top.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    /// Unique identifier for this layer.
    pub id: LayerId,
    /// What this layer draws.
    pub kind: LayerKind,
    /// String payload: text value, emoji glyph, or image source reference.
    pub content: String,
    /// Horizontal center in surface coordinates.
    pub x: f64,
    /// Vertical center in surface coordinates.
    pub y: f64,
    /// Width of the bounding box in surface pixels.
    pub width: f64,
    /// Height of the bounding box in surface pixels.
    pub height: f64,
    /// Stacking order; lower values are drawn beneath higher values.
    pub z_index: i64,
    /// The singleton slot this layer occupies, if it was created by a
    /// slot-bound configuration input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<Slot>,
    /// Text styling; present only on text layers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TextStyle>,
}

impl Layer {
    /// Whether `pt` falls inside this layer's bounding box.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        pt.x >= self.x - hw && pt.x <= self.x + hw && pt.y >= self.y - hh && pt.y <= self.y + hh
    }
}

/// Serialized form of a scene: ambient state plus layers in draw order.
///
/// The slot index is intentionally absent — it is rebuilt from the layers'
/// `slot` tags on load, so a snapshot stays a plain layer list.
#[derive(Debug, Serialize, Deserialize)]
struct SceneDoc {
    width: f64,
    height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    background_fill: Option<String>,
    layers: Vec<Layer>,
}

/// In-memory store of layers plus ambient background state.
///
/// Invariant: at most one layer carries each [`Slot`] tag. The slot index is
/// the structural source of truth — inserting a slotted layer evicts the
/// previous occupant.
pub struct Scene {
    layers: HashMap<LayerId, Layer>,
    slots: HashMap<Slot, LayerId>,
    next_z: i64,
    /// Ambient fill painted beneath all layers, if set.
    pub background_fill: Option<String>,
    /// Surface width in pixels.
    pub width: f64,
    /// Surface height in pixels.
    pub height: f64,
}

impl Scene {
    /// Create an empty scene with the given surface dimensions.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            layers: HashMap::new(),
            slots: HashMap::new(),
            next_z: 0,
            background_fill: None,
            width,
            height,
        }
    }

    /// The surface center, where slot-bound layers are placed.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Insert a layer, assigning the next z-index. If the layer carries a
    /// slot tag, any existing occupant of that slot is removed first.
    pub fn insert(&mut self, mut layer: Layer) -> LayerId {
        if let Some(slot) = layer.slot {
            if let Some(old_id) = self.slots.remove(&slot) {
                self.layers.remove(&old_id);
            }
            self.slots.insert(slot, layer.id);
        }
        layer.z_index = self.next_z;
        self.next_z += 1;
        let id = layer.id;
        self.layers.insert(id, layer);
        id
    }

    /// Remove a layer by id, returning it and cleaning the slot index.
    pub fn remove(&mut self, id: &LayerId) -> Option<Layer> {
        let layer = self.layers.remove(id)?;
        if let Some(slot) = layer.slot {
            if self.slots.get(&slot) == Some(id) {
                self.slots.remove(&slot);
            }
        }
        Some(layer)
    }

    /// Remove and return the current occupant of a slot, if any.
    pub fn take_slot(&mut self, slot: Slot) -> Option<Layer> {
        let id = self.slots.remove(&slot)?;
        self.layers.remove(&id)
    }

    /// The layer currently occupying a slot, if any.
    #[must_use]
    pub fn slot_layer(&self, slot: Slot) -> Option<&Layer> {
        self.slots.get(&slot).and_then(|id| self.layers.get(id))
    }

    /// Return a reference to a layer by id.
    #[must_use]
    pub fn get(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.get(id)
    }

    /// Return a mutable reference to a layer by id.
    pub fn get_mut(&mut self, id: &LayerId) -> Option<&mut Layer> {
        self.layers.get_mut(id)
    }

    /// Return all layers sorted by `(z_index, id)` for draw order.
    #[must_use]
    pub fn sorted_layers(&self) -> Vec<&Layer> {
        let mut layers: Vec<&Layer> = self.layers.values().collect();
        layers.sort_by(|a, b| a.z_index.cmp(&b.z_index).then_with(|| a.id.cmp(&b.id)));
        layers
    }

    /// Update the surface dimensions. Layer geometry is left untouched.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Remove every layer and reset ambient state.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.slots.clear();
        self.background_fill = None;
        self.next_z = 0;
    }

    /// Number of layers currently in the scene.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` if the scene contains no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Serialize the scene to a structural JSON description sufficient to
    /// reconstruct it with [`Scene::from_json`].
    ///
    /// # Errors
    ///
    /// Returns `Err` if JSON encoding fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let doc = SceneDoc {
            width: self.width,
            height: self.height,
            background_fill: self.background_fill.clone(),
            layers: self.sorted_layers().into_iter().cloned().collect(),
        };
        serde_json::to_string(&doc)
    }

    /// Reconstruct a scene from a serialized description.
    ///
    /// Slot tags are re-indexed on load; if a snapshot somehow carries two
    /// layers for the same slot, the later (higher z) occupant wins.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let doc: SceneDoc = serde_json::from_str(json)?;
        let mut scene = Self::new(doc.width, doc.height);
        scene.background_fill = doc.background_fill;
        let mut layers = doc.layers;
        layers.sort_by(|a, b| a.z_index.cmp(&b.z_index).then_with(|| a.id.cmp(&b.id)));
        for layer in layers {
            if let Some(slot) = layer.slot {
                if let Some(old_id) = scene.slots.remove(&slot) {
                    scene.layers.remove(&old_id);
                }
                scene.slots.insert(slot, layer.id);
            }
            scene.next_z = scene.next_z.max(layer.z_index + 1);
            scene.layers.insert(layer.id, layer);
        }
        Ok(scene)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(
            crate::consts::DEFAULT_SURFACE_WIDTH,
            crate::consts::DEFAULT_SURFACE_HEIGHT,
        )
    }
}
