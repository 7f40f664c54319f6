use std::collections::HashMap;

use uuid::Uuid;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::consts::{
    DEFAULT_FONT_SIZE, DEFAULT_SURFACE_HEIGHT, DEFAULT_SURFACE_WIDTH, DEFAULT_TEXT,
    DEFAULT_TEXT_COLOR, EMOJI_FONT_SIZE, IMAGE_FIT_FRACTION, TEXT_CHAR_WIDTH_RATIO,
    TEXT_LINE_HEIGHT_RATIO,
};
use crate::emit::{ChangeSnapshot, Emitter, LayerAdded, SubscriberId};
use crate::hit;
use crate::interact::{PointerState, UiState};
use crate::render;
use crate::scene::{Layer, LayerId, LayerKind, Point, Scene, Slot, TextStyle};
use crate::sync::{LoadTarget, SyncBridge, TextSpec, UploadError, validate_upload};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from engine entry points for the host to process.
///
/// Layer mutations are already applied to the scene when these are returned;
/// the host's remaining duties are performing requested image fetches and
/// opening the in-place text editor.
#[derive(Debug, Clone)]
pub enum Action {
    /// A layer was added to the scene.
    LayerInserted { id: LayerId },
    /// A layer's content or position changed.
    LayerUpdated { id: LayerId },
    /// A layer was removed from the scene.
    LayerRemoved { id: LayerId },
    /// The ambient background fill changed.
    BackgroundFillChanged,
    /// The host must fetch this image and report back via
    /// `complete_image_load` / `fail_image_load` with the same generation.
    ImageLoadRequested {
        target: LoadTarget,
        generation: u64,
        url: String,
    },
    /// The host should open its in-place editor for this text layer.
    EditTextRequested { id: LayerId, value: String },
    /// The surface must be repainted (no snapshot is due).
    RenderNeeded,
}

/// Core engine state — all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser
/// dependencies. Every mutation entry point returns the [`Action`]s the host
/// (or the `Engine` wrapper) must carry out.
pub struct EngineCore {
    pub scene: Scene,
    pub bridge: SyncBridge,
    pub emitter: Emitter,
    pub ui: UiState,
    pub pointer: PointerState,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self {
            scene: Scene::default(),
            bridge: SyncBridge::new(),
            emitter: Emitter::new(),
            ui: UiState::default(),
            pointer: PointerState::Idle,
        }
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Declarative config inputs ---

    /// Set or clear the background-image singleton. The slot's occupant is
    /// evicted immediately; insertion happens when the host's fetch commits.
    pub fn set_background_image(&mut self, url: Option<&str>) -> Vec<Action> {
        self.set_image_slot(Slot::BackgroundImage, url)
    }

    /// Set or clear the image singleton.
    pub fn set_image(&mut self, url: Option<&str>) -> Vec<Action> {
        self.set_image_slot(Slot::Image, url)
    }

    /// Set or clear the ambient background fill painted beneath all layers.
    pub fn set_fill_color(&mut self, color: Option<&str>) -> Vec<Action> {
        let color = color
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned);
        if self.scene.background_fill == color {
            return Vec::new();
        }
        self.scene.background_fill = color;
        vec![Action::BackgroundFillChanged]
    }

    /// Set or clear the emoji singleton. Synchronous: the glyph needs no
    /// asynchronous resolution.
    pub fn set_emoji(&mut self, glyph: Option<&str>) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some(old) = self.scene.take_slot(Slot::Emoji) {
            self.clear_gesture_for(old.id);
            actions.push(Action::LayerRemoved { id: old.id });
        }
        let Some(glyph) = glyph.map(str::trim).filter(|g| !g.is_empty()) else {
            self.bridge.forget_slot(Slot::Emoji);
            return actions;
        };
        let notify = self.bridge.note_applied(Slot::Emoji, glyph);
        let center = self.scene.center();
        let id = self.scene.insert(Layer {
            id: Uuid::new_v4(),
            kind: LayerKind::Emoji,
            content: glyph.to_owned(),
            x: center.x,
            y: center.y,
            width: EMOJI_FONT_SIZE,
            height: EMOJI_FONT_SIZE,
            z_index: 0,
            slot: Some(Slot::Emoji),
            style: None,
        });
        actions.push(Action::LayerInserted { id });
        if notify {
            self.emitter.notify_layer_added(&LayerAdded {
                kind: LayerKind::Emoji,
                content: glyph.to_owned(),
                id,
            });
        }
        actions
    }

    /// Store the pending free-text spec used by the next explicit add.
    pub fn set_text_spec(&mut self, spec: Option<TextSpec>) {
        self.bridge.pending_text = spec;
    }

    /// Replace the advisory palette.
    pub fn set_palette(&mut self, colors: Vec<String>) {
        self.bridge.palette = colors;
    }

    /// Replace the advisory emoji pool.
    pub fn set_emoji_pool(&mut self, emojis: Vec<String>) {
        self.bridge.emoji_pool = emojis;
    }

    // --- Asynchronous image resolution ---

    /// Commit a finished image fetch. Stale completions (superseded by a
    /// newer request for the same slot) are discarded.
    pub fn complete_image_load(
        &mut self,
        target: LoadTarget,
        generation: u64,
        natural_w: f64,
        natural_h: f64,
    ) -> Vec<Action> {
        let Some(committed) = self.bridge.commit_load(target, generation) else {
            log::debug!("discarding stale image resolution (generation {generation})");
            return Vec::new();
        };
        let center = self.scene.center();
        let (kind, width, height) = if committed.slot == Some(Slot::BackgroundImage) {
            let (w, h) =
                cover_surface(natural_w, natural_h, self.scene.width, self.scene.height);
            (LayerKind::BackgroundImage, w, h)
        } else {
            let max_edge = self.scene.width.min(self.scene.height) * IMAGE_FIT_FRACTION;
            let (w, h) = fit_within(natural_w, natural_h, max_edge, max_edge);
            (LayerKind::Image, w, h)
        };
        let id = self.scene.insert(Layer {
            id: Uuid::new_v4(),
            kind,
            content: committed.url.clone(),
            x: center.x,
            y: center.y,
            width,
            height,
            z_index: 0,
            slot: committed.slot,
            style: None,
        });
        if committed.notify {
            self.emitter.notify_layer_added(&LayerAdded {
                kind: LayerKind::Image,
                content: committed.url,
                id,
            });
        }
        vec![Action::LayerInserted { id }]
    }

    /// Report a failed image fetch. The slot stays empty (its previous
    /// occupant was evicted when the new value arrived); nothing is retried.
    pub fn fail_image_load(&mut self, target: LoadTarget, generation: u64, reason: &str) {
        if let Some(url) = self.bridge.fail_load(target, generation) {
            log::warn!("image load failed for {url}: {reason}; slot left empty");
        } else {
            log::debug!("ignoring failure for superseded image request (generation {generation})");
        }
    }

    // --- Explicit user actions ---

    /// Add a free-standing text layer from the pending spec (or defaults).
    pub fn add_text(&mut self) -> Vec<Action> {
        let spec = self.bridge.pending_text.clone().unwrap_or_default();
        let content = if spec.value.trim().is_empty() {
            DEFAULT_TEXT.to_owned()
        } else {
            spec.value.clone()
        };
        let palette_head = self.bridge.palette.first().cloned();
        let style = TextStyle {
            font_size: spec.font_size.unwrap_or(DEFAULT_FONT_SIZE),
            color: spec
                .color
                .or(palette_head)
                .unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_owned()),
            bold: spec.bold.unwrap_or(false),
            italic: spec.italic.unwrap_or(false),
            underline: spec.underline.unwrap_or(false),
            script: spec.script.unwrap_or_default(),
        };
        let (width, height) = text_bounds(&content, &style);
        let center = self.scene.center();
        let id = self.scene.insert(Layer {
            id: Uuid::new_v4(),
            kind: LayerKind::Text,
            content: content.clone(),
            x: center.x,
            y: center.y,
            width,
            height,
            z_index: 0,
            slot: None,
            style: Some(style),
        });
        self.emitter.notify_layer_added(&LayerAdded {
            kind: LayerKind::Text,
            content,
            id,
        });
        vec![Action::LayerInserted { id }]
    }

    /// Add a free-standing emoji layer from the advisory pool. The host
    /// supplies the (random) index; an empty pool is a no-op.
    pub fn add_emoji_from_pool(&mut self, index: usize) -> Vec<Action> {
        if self.bridge.emoji_pool.is_empty() {
            log::debug!("emoji pool is empty; nothing to add");
            return Vec::new();
        }
        let glyph = self.bridge.emoji_pool[index % self.bridge.emoji_pool.len()].clone();
        let center = self.scene.center();
        let id = self.scene.insert(Layer {
            id: Uuid::new_v4(),
            kind: LayerKind::Emoji,
            content: glyph.clone(),
            x: center.x,
            y: center.y,
            width: EMOJI_FONT_SIZE,
            height: EMOJI_FONT_SIZE,
            z_index: 0,
            slot: None,
            style: None,
        });
        self.emitter.notify_layer_added(&LayerAdded {
            kind: LayerKind::Emoji,
            content: glyph,
            id,
        });
        vec![Action::LayerInserted { id }]
    }

    /// Add a free-standing image layer via the asynchronous load path.
    pub fn add_user_image(&mut self, url: &str) -> Vec<Action> {
        let generation = self.bridge.begin_free_load(url);
        vec![Action::ImageLoadRequested {
            target: LoadTarget::Free,
            generation,
            url: url.to_owned(),
        }]
    }

    /// Validate a local file, then route it through the free image path.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError`] before any scene mutation when the file is
    /// oversized or not an image.
    pub fn add_upload(
        &mut self,
        mime: &str,
        size_bytes: u64,
        url: &str,
    ) -> Result<Vec<Action>, UploadError> {
        validate_upload(mime, size_bytes)?;
        Ok(self.add_user_image(url))
    }

    /// Remove the currently selected layer, if any.
    pub fn delete_selected(&mut self) -> Vec<Action> {
        let Some(id) = self.ui.selected_id.take() else {
            return Vec::new();
        };
        self.pointer = PointerState::Idle;
        let Some(layer) = self.scene.remove(&id) else {
            return Vec::new();
        };
        // A manually deleted slot occupant frees the slot for re-application
        // of the same value.
        if let Some(slot) = layer.slot {
            self.bridge.forget_slot(slot);
        }
        vec![Action::LayerRemoved { id }]
    }

    /// Commit text from the host editor back into a text layer.
    pub fn set_layer_text(&mut self, id: &LayerId, value: String) -> Vec<Action> {
        let Some(layer) = self.scene.get_mut(id) else {
            return Vec::new();
        };
        if layer.kind != LayerKind::Text {
            return Vec::new();
        }
        layer.content = value;
        let style = layer.style.clone().unwrap_or_default();
        let (width, height) = text_bounds(&layer.content, &style);
        layer.width = width;
        layer.height = height;
        if matches!(self.pointer, PointerState::EditingText { id: editing } if editing == *id) {
            self.pointer = PointerState::Idle;
        }
        vec![Action::LayerUpdated { id: *id }]
    }

    // --- Pointer input ---

    /// Pointer-down: select the topmost movable layer under the pointer and
    /// begin a drag, or request in-place editing when the hit layer is an
    /// already-selected text layer. Selection never renders any decoration.
    pub fn on_pointer_down(&mut self, pt: Point) -> Vec<Action> {
        let Some(id) = hit::topmost_at(&self.scene, pt) else {
            self.ui.selected_id = None;
            self.pointer = PointerState::Idle;
            return Vec::new();
        };
        let Some(layer) = self.scene.get(&id) else {
            return Vec::new();
        };
        if self.ui.selected_id == Some(id) && layer.kind.editable_in_place() {
            let value = layer.content.clone();
            self.pointer = PointerState::EditingText { id };
            return vec![Action::EditTextRequested { id, value }];
        }
        let origin = Point::new(layer.x, layer.y);
        self.ui.selected_id = Some(id);
        self.pointer = PointerState::Dragging { id, last: pt, origin };
        Vec::new()
    }

    /// Pointer-move: while dragging, translate the layer by the pointer
    /// delta. Repaint only — the mutation commits on pointer-up.
    pub fn on_pointer_move(&mut self, pt: Point) -> Vec<Action> {
        let PointerState::Dragging { id, last, origin } = self.pointer else {
            return Vec::new();
        };
        let dx = pt.x - last.x;
        let dy = pt.y - last.y;
        if let Some(layer) = self.scene.get_mut(&id) {
            if layer.kind.movable() {
                layer.x += dx;
                layer.y += dy;
            }
        }
        self.pointer = PointerState::Dragging { id, last: pt, origin };
        vec![Action::RenderNeeded]
    }

    /// Pointer-up: end the drag, committing one mutation if the layer moved.
    pub fn on_pointer_up(&mut self, _pt: Point) -> Vec<Action> {
        let PointerState::Dragging { id, origin, .. } = self.pointer else {
            return Vec::new();
        };
        self.pointer = PointerState::Idle;
        let moved = self
            .scene
            .get(&id)
            .is_some_and(|layer| layer.x != origin.x || layer.y != origin.y);
        if moved {
            vec![Action::LayerUpdated { id }]
        } else {
            Vec::new()
        }
    }

    // --- Surface ---

    /// Update surface dimensions. Idempotent: unchanged dimensions produce no
    /// actions. Non-finite or sub-pixel inputs fall back to the defaults
    /// rather than failing.
    pub fn resize(&mut self, width: f64, height: f64) -> Vec<Action> {
        let width = if width.is_finite() && width >= 1.0 {
            width
        } else {
            DEFAULT_SURFACE_WIDTH
        };
        let height = if height.is_finite() && height >= 1.0 {
            height
        } else {
            DEFAULT_SURFACE_HEIGHT
        };
        if self.scene.width == width && self.scene.height == height {
            return Vec::new();
        }
        self.scene.resize(width, height);
        vec![Action::RenderNeeded]
    }

    /// Release all scene state. Safe to call more than once.
    pub fn clear(&mut self) {
        self.scene.clear();
        self.ui.selected_id = None;
        self.pointer = PointerState::Idle;
        self.bridge = SyncBridge::new();
    }

    // --- Emission ---

    /// Serialize the scene and fan one change snapshot out to subscribers.
    pub fn emit_change(&mut self, rendered_bitmap: String) {
        self.emitter.emit_change(&self.scene, rendered_bitmap);
    }

    /// Register a change-snapshot subscriber.
    pub fn subscribe_change<F>(&mut self, listener: F) -> SubscriberId
    where
        F: FnMut(&ChangeSnapshot) + 'static,
    {
        self.emitter.subscribe_change(listener)
    }

    /// Register a layer-added subscriber.
    pub fn subscribe_layer_added<F>(&mut self, listener: F) -> SubscriberId
    where
        F: FnMut(&LayerAdded) + 'static,
    {
        self.emitter.subscribe_layer_added(listener)
    }

    // --- Queries ---

    /// The currently selected layer, if any.
    #[must_use]
    pub fn selection(&self) -> Option<LayerId> {
        self.ui.selected_id
    }

    /// Look up a layer by id.
    #[must_use]
    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.scene.get(id)
    }

    // --- Internals ---

    fn set_image_slot(&mut self, slot: Slot, url: Option<&str>) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some(old) = self.scene.take_slot(slot) {
            self.clear_gesture_for(old.id);
            actions.push(Action::LayerRemoved { id: old.id });
        }
        let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
            self.bridge.forget_slot(slot);
            return actions;
        };
        let generation = self.bridge.begin_slot_load(slot, url);
        actions.push(Action::ImageLoadRequested {
            target: LoadTarget::Slot(slot),
            generation,
            url: url.to_owned(),
        });
        actions
    }

    fn clear_gesture_for(&mut self, id: LayerId) {
        if self.ui.selected_id == Some(id) {
            self.ui.selected_id = None;
        }
        let gesture_id = match self.pointer {
            PointerState::Dragging { id, .. } | PointerState::EditingText { id } => Some(id),
            PointerState::Idle => None,
        };
        if gesture_id == Some(id) {
            self.pointer = PointerState::Idle;
        }
    }
}

/// Host-supplied overrides for the built-in user actions. When a hook is set
/// the engine default is bypassed entirely.
#[derive(Default)]
pub struct Overrides {
    pub add_emoji: Option<js_sys::Function>,
    pub add_text: Option<js_sys::Function>,
    pub add_image: Option<js_sys::Function>,
    pub delete_selected: Option<js_sys::Function>,
}

/// The full design engine. Wraps [`EngineCore`] and owns the browser canvas
/// element, the 2D context, and the decoded-image cache.
///
/// The host shell drives the lifecycle: `activate` once the element is in the
/// DOM, `on_host_resize` from its resize observer, `on_frame` from its
/// animation-frame loop, and `dispose` on unmount.
pub struct Engine {
    canvas: HtmlCanvasElement,
    ctx: Option<CanvasRenderingContext2d>,
    images: HashMap<LayerId, HtmlImageElement>,
    pending_resize: Option<(f64, f64)>,
    pub overrides: Overrides,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element. No rendering
    /// happens until [`Engine::activate`].
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self {
            canvas,
            ctx: None,
            images: HashMap::new(),
            pending_resize: None,
            overrides: Overrides::default(),
            core: EngineCore::new(),
        }
    }

    // --- Lifecycle ---

    /// Acquire the 2D context, size the surface to the host element (falling
    /// back to the defaults when unmeasurable), and paint the first frame.
    /// Calling again on an active engine is a no-op.
    pub fn activate(&mut self) {
        if self.ctx.is_some() {
            return;
        }
        self.ctx = match self.canvas.get_context("2d") {
            Ok(Some(obj)) => obj.dyn_into::<CanvasRenderingContext2d>().map_or_else(
                |_| {
                    log::warn!("canvas returned a non-2d context; engine stays inactive");
                    None
                },
                Some,
            ),
            Ok(None) | Err(_) => {
                log::warn!("2d context unavailable; engine stays inactive");
                None
            }
        };
        let (width, height) = self.measure_host();
        self.apply_surface_size(width, height);
        self.render_now();
    }

    /// Release the scene, image cache, and context. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.core.clear();
        self.images.clear();
        self.pending_resize = None;
        self.ctx = None;
    }

    /// Resize the surface and repaint. Idempotent and never fails: bad
    /// dimensions fall back to the defaults.
    pub fn resize(&mut self, width: f64, height: f64) -> Vec<Action> {
        let actions = self.core.resize(width, height);
        if !actions.is_empty() {
            self.apply_surface_size(self.core.scene.width, self.core.scene.height);
        }
        self.process(actions)
    }

    /// Record a host resize to be applied on the next frame. Continuous
    /// window resizing thus coalesces to at most one re-render per frame.
    pub fn on_host_resize(&mut self, width: f64, height: f64) {
        self.pending_resize = Some((width, height));
    }

    /// Animation-frame tick: apply at most one pending resize.
    pub fn on_frame(&mut self) -> Vec<Action> {
        match self.pending_resize.take() {
            Some((width, height)) => self.resize(width, height),
            None => Vec::new(),
        }
    }

    /// The current rendered bitmap for an explicit save request, or `None`
    /// when the engine is inactive.
    #[must_use]
    pub fn save(&self) -> Option<String> {
        if self.ctx.is_none() {
            return None;
        }
        Some(self.bitmap())
    }

    // --- Declarative config inputs ---

    pub fn set_background_image(&mut self, url: Option<&str>) -> Vec<Action> {
        self.apply(|core| core.set_background_image(url))
    }

    pub fn set_image(&mut self, url: Option<&str>) -> Vec<Action> {
        self.apply(|core| core.set_image(url))
    }

    pub fn set_fill_color(&mut self, color: Option<&str>) -> Vec<Action> {
        self.apply(|core| core.set_fill_color(color))
    }

    pub fn set_emoji(&mut self, glyph: Option<&str>) -> Vec<Action> {
        self.apply(|core| core.set_emoji(glyph))
    }

    pub fn set_text_spec(&mut self, spec: Option<TextSpec>) {
        self.core.set_text_spec(spec);
    }

    pub fn set_palette(&mut self, colors: Vec<String>) {
        self.core.set_palette(colors);
    }

    pub fn set_emoji_pool(&mut self, emojis: Vec<String>) {
        self.core.set_emoji_pool(emojis);
    }

    // --- Image resolution (host fetch results) ---

    /// Hand a decoded image element back to the engine. Stale resolutions
    /// are discarded by the core; committed ones enter the draw cache.
    pub fn image_loaded(
        &mut self,
        target: LoadTarget,
        generation: u64,
        element: HtmlImageElement,
    ) -> Vec<Action> {
        let natural_w = f64::from(element.natural_width());
        let natural_h = f64::from(element.natural_height());
        let actions = self.core.complete_image_load(target, generation, natural_w, natural_h);
        for action in &actions {
            if let Action::LayerInserted { id } = action {
                self.images.insert(*id, element.clone());
            }
        }
        self.process(actions)
    }

    /// Report a failed fetch for a previously requested image.
    pub fn image_failed(&mut self, target: LoadTarget, generation: u64, reason: &str) {
        self.core.fail_image_load(target, generation, reason);
    }

    // --- User actions (host-overridable) ---

    pub fn add_text(&mut self) -> Vec<Action> {
        if let Some(hook) = self.overrides.add_text.clone() {
            call_hook(&hook, "add_text");
            return Vec::new();
        }
        self.apply(EngineCore::add_text)
    }

    /// Add a random emoji from the advisory pool.
    pub fn add_random_emoji(&mut self) -> Vec<Action> {
        if let Some(hook) = self.overrides.add_emoji.clone() {
            call_hook(&hook, "add_emoji");
            return Vec::new();
        }
        let len = self.core.bridge.emoji_pool.len();
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = if len == 0 {
            0
        } else {
            (js_sys::Math::random() * len as f64) as usize
        };
        self.apply(|core| core.add_emoji_from_pool(index))
    }

    pub fn add_image(&mut self, url: &str) -> Vec<Action> {
        if let Some(hook) = self.overrides.add_image.clone() {
            call_hook(&hook, "add_image");
            return Vec::new();
        }
        self.apply(|core| core.add_user_image(url))
    }

    /// Validate and add a local image file (already materialized to an
    /// object URL by the host).
    ///
    /// # Errors
    ///
    /// Returns [`UploadError`] with a user-facing message when the file is
    /// rejected; the scene is untouched in that case.
    pub fn add_upload(
        &mut self,
        mime: &str,
        size_bytes: u64,
        url: &str,
    ) -> Result<Vec<Action>, UploadError> {
        let actions = self.core.add_upload(mime, size_bytes, url)?;
        Ok(self.process(actions))
    }

    pub fn delete_selected(&mut self) -> Vec<Action> {
        if let Some(hook) = self.overrides.delete_selected.clone() {
            call_hook(&hook, "delete_selected");
            return Vec::new();
        }
        self.apply(EngineCore::delete_selected)
    }

    pub fn set_layer_text(&mut self, id: &LayerId, value: String) -> Vec<Action> {
        self.apply(|core| core.set_layer_text(id, value))
    }

    // --- Pointer input ---

    pub fn on_pointer_down(&mut self, pt: Point) -> Vec<Action> {
        self.apply(|core| core.on_pointer_down(pt))
    }

    pub fn on_pointer_move(&mut self, pt: Point) -> Vec<Action> {
        self.apply(|core| core.on_pointer_move(pt))
    }

    pub fn on_pointer_up(&mut self, pt: Point) -> Vec<Action> {
        self.apply(|core| core.on_pointer_up(pt))
    }

    // --- Internals ---

    /// Run a core mutation, then carry out the engine-side duties for the
    /// actions it returned.
    fn apply(&mut self, mutate: impl FnOnce(&mut EngineCore) -> Vec<Action>) -> Vec<Action> {
        let actions = mutate(&mut self.core);
        self.process(actions)
    }

    /// Carry out the engine-side duties for a batch of actions: repaint when
    /// needed, maintain the image cache, and emit exactly one change
    /// snapshot per discrete mutation (never batched). The actions are
    /// returned unchanged for the host, which handles
    /// [`Action::ImageLoadRequested`] and [`Action::EditTextRequested`].
    fn process(&mut self, actions: Vec<Action>) -> Vec<Action> {
        let mut mutations = 0usize;
        let mut repaint = false;
        for action in &actions {
            match action {
                Action::LayerInserted { .. }
                | Action::LayerUpdated { .. }
                | Action::BackgroundFillChanged => {
                    mutations += 1;
                    repaint = true;
                }
                Action::LayerRemoved { id } => {
                    self.images.remove(id);
                    mutations += 1;
                    repaint = true;
                }
                Action::RenderNeeded => repaint = true,
                Action::ImageLoadRequested { .. } | Action::EditTextRequested { .. } => {}
            }
        }
        if repaint {
            self.render_now();
        }
        if mutations > 0 {
            let bitmap = self.bitmap();
            for _ in 0..mutations {
                self.core.emit_change(bitmap.clone());
            }
        }
        actions
    }

    fn render_now(&mut self) {
        let Some(ctx) = &self.ctx else {
            return;
        };
        if let Err(err) = render::draw(ctx, &self.core.scene, &self.images) {
            log::warn!("render failed: {err:?}");
        }
    }

    fn bitmap(&self) -> String {
        match self.canvas.to_data_url() {
            Ok(url) => url,
            Err(err) => {
                log::warn!("bitmap encode failed: {err:?}");
                String::new()
            }
        }
    }

    fn measure_host(&self) -> (f64, f64) {
        let Some(parent) = self.canvas.parent_element() else {
            return (DEFAULT_SURFACE_WIDTH, DEFAULT_SURFACE_HEIGHT);
        };
        let width = f64::from(parent.client_width());
        let height = f64::from(parent.client_height());
        if width >= 1.0 && height >= 1.0 {
            (width, height)
        } else {
            (DEFAULT_SURFACE_WIDTH, DEFAULT_SURFACE_HEIGHT)
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn apply_surface_size(&mut self, width: f64, height: f64) {
        self.core.scene.resize(width, height);
        self.canvas.set_width(width.max(1.0) as u32);
        self.canvas.set_height(height.max(1.0) as u32);
    }
}

fn call_hook(hook: &js_sys::Function, name: &str) {
    if let Err(err) = hook.call0(&JsValue::NULL) {
        log::warn!("host {name} override threw: {err:?}");
    }
}

// =============================================================
// Layer sizing helpers
// =============================================================

/// Approximate bounds for a text run without a measuring context.
fn text_bounds(content: &str, style: &TextStyle) -> (f64, f64) {
    let longest = content
        .lines()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0)
        .max(1);
    let lines = content.lines().count().max(1);
    #[allow(clippy::cast_precision_loss)]
    let width = longest as f64 * style.font_size * TEXT_CHAR_WIDTH_RATIO;
    #[allow(clippy::cast_precision_loss)]
    let height = lines as f64 * style.font_size * TEXT_LINE_HEIGHT_RATIO;
    (width, height)
}

/// Scale an image down to fit within a bounding box, never up.
fn fit_within(natural_w: f64, natural_h: f64, max_w: f64, max_h: f64) -> (f64, f64) {
    if natural_w < 1.0 || natural_h < 1.0 {
        return (max_w, max_h);
    }
    let scale = (max_w / natural_w).min(max_h / natural_h).min(1.0);
    (natural_w * scale, natural_h * scale)
}

/// Scale an image to fully cover the surface, preserving aspect ratio.
fn cover_surface(natural_w: f64, natural_h: f64, surface_w: f64, surface_h: f64) -> (f64, f64) {
    if natural_w < 1.0 || natural_h < 1.0 {
        return (surface_w, surface_h);
    }
    let scale = (surface_w / natural_w).max(surface_h / natural_h);
    (natural_w * scale, natural_h * scale)
}
