#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use uuid::Uuid;

use super::*;

fn make_layer(kind: LayerKind, content: &str) -> Layer {
    Layer {
        id: Uuid::new_v4(),
        kind,
        content: content.to_owned(),
        x: 100.0,
        y: 200.0,
        width: 80.0,
        height: 40.0,
        z_index: 0,
        slot: None,
        style: None,
    }
}

fn make_slot_layer(kind: LayerKind, slot: Slot, content: &str) -> Layer {
    Layer {
        slot: Some(slot),
        ..make_layer(kind, content)
    }
}

// =============================================================
// LayerKind flags and serde
// =============================================================

#[test]
fn kind_serde_all_variants() {
    let cases = [
        (LayerKind::BackgroundImage, "\"background-image\""),
        (LayerKind::Text, "\"text\""),
        (LayerKind::Emoji, "\"emoji\""),
        (LayerKind::Image, "\"image\""),
    ];
    for (kind, expected) in cases {
        assert_eq!(serde_json::to_string(&kind).unwrap(), expected);
        let back: LayerKind = serde_json::from_str(expected).unwrap();
        assert_eq!(back, kind);
    }
}

#[test]
fn kind_deserialize_invalid_rejects() {
    assert!(serde_json::from_str::<LayerKind>("\"gradient\"").is_err());
}

#[test]
fn background_is_not_movable() {
    assert!(!LayerKind::BackgroundImage.movable());
    assert!(LayerKind::Text.movable());
    assert!(LayerKind::Emoji.movable());
    assert!(LayerKind::Image.movable());
}

#[test]
fn only_text_is_editable_in_place() {
    assert!(LayerKind::Text.editable_in_place());
    assert!(!LayerKind::Emoji.editable_in_place());
    assert!(!LayerKind::Image.editable_in_place());
    assert!(!LayerKind::BackgroundImage.editable_in_place());
}

#[test]
fn text_is_transform_locked() {
    assert!(LayerKind::Text.transform_locked());
    assert!(!LayerKind::Image.transform_locked());
    assert!(!LayerKind::Emoji.transform_locked());
}

// =============================================================
// Layer geometry
// =============================================================

#[test]
fn contains_is_center_based() {
    let layer = make_layer(LayerKind::Emoji, "🔥");
    assert!(layer.contains(Point::new(100.0, 200.0)));
    assert!(layer.contains(Point::new(60.0, 180.0)));
    assert!(layer.contains(Point::new(140.0, 220.0)));
    assert!(!layer.contains(Point::new(141.0, 200.0)));
    assert!(!layer.contains(Point::new(100.0, 221.0)));
}

// =============================================================
// Scene: insert / remove / slots
// =============================================================

#[test]
fn new_scene_is_empty() {
    let scene = Scene::new(800.0, 1000.0);
    assert!(scene.is_empty());
    assert_eq!(scene.len(), 0);
    assert!(scene.background_fill.is_none());
}

#[test]
fn center_is_half_dimensions() {
    let scene = Scene::new(800.0, 1000.0);
    let c = scene.center();
    assert_eq!(c.x, 400.0);
    assert_eq!(c.y, 500.0);
}

#[test]
fn insert_assigns_increasing_z() {
    let mut scene = Scene::default();
    let a = scene.insert(make_layer(LayerKind::Text, "a"));
    let b = scene.insert(make_layer(LayerKind::Text, "b"));
    assert!(scene.get(&a).unwrap().z_index < scene.get(&b).unwrap().z_index);
}

#[test]
fn sorted_layers_follow_insertion_order() {
    let mut scene = Scene::default();
    scene.insert(make_layer(LayerKind::Text, "first"));
    scene.insert(make_layer(LayerKind::Emoji, "second"));
    scene.insert(make_layer(LayerKind::Image, "third"));
    let contents: Vec<&str> = scene
        .sorted_layers()
        .iter()
        .map(|l| l.content.as_str())
        .collect();
    assert_eq!(contents, vec!["first", "second", "third"]);
}

#[test]
fn slotted_insert_evicts_previous_occupant() {
    let mut scene = Scene::default();
    let first = scene.insert(make_slot_layer(LayerKind::Emoji, Slot::Emoji, "🔥"));
    let second = scene.insert(make_slot_layer(LayerKind::Emoji, Slot::Emoji, "🚀"));
    assert_eq!(scene.len(), 1);
    assert!(scene.get(&first).is_none());
    assert_eq!(scene.slot_layer(Slot::Emoji).unwrap().id, second);
}

#[test]
fn distinct_slots_coexist() {
    let mut scene = Scene::default();
    scene.insert(make_slot_layer(LayerKind::Emoji, Slot::Emoji, "🔥"));
    scene.insert(make_slot_layer(LayerKind::Image, Slot::Image, "a.png"));
    scene.insert(make_slot_layer(
        LayerKind::BackgroundImage,
        Slot::BackgroundImage,
        "bg.png",
    ));
    assert_eq!(scene.len(), 3);
}

#[test]
fn unslotted_layers_accumulate() {
    let mut scene = Scene::default();
    for _ in 0..5 {
        scene.insert(make_layer(LayerKind::Text, "note"));
    }
    assert_eq!(scene.len(), 5);
}

#[test]
fn remove_cleans_slot_index() {
    let mut scene = Scene::default();
    let id = scene.insert(make_slot_layer(LayerKind::Emoji, Slot::Emoji, "🔥"));
    assert!(scene.remove(&id).is_some());
    assert!(scene.slot_layer(Slot::Emoji).is_none());
    assert!(scene.take_slot(Slot::Emoji).is_none());
}

#[test]
fn remove_unknown_returns_none() {
    let mut scene = Scene::default();
    assert!(scene.remove(&Uuid::new_v4()).is_none());
}

#[test]
fn take_slot_removes_layer() {
    let mut scene = Scene::default();
    scene.insert(make_slot_layer(LayerKind::Image, Slot::Image, "a.png"));
    let taken = scene.take_slot(Slot::Image).unwrap();
    assert_eq!(taken.content, "a.png");
    assert!(scene.is_empty());
}

#[test]
fn clear_resets_everything() {
    let mut scene = Scene::default();
    scene.background_fill = Some("#fff".to_owned());
    scene.insert(make_slot_layer(LayerKind::Emoji, Slot::Emoji, "🔥"));
    scene.insert(make_layer(LayerKind::Text, "note"));
    scene.clear();
    assert!(scene.is_empty());
    assert!(scene.background_fill.is_none());
    assert!(scene.slot_layer(Slot::Emoji).is_none());
}

#[test]
fn resize_keeps_layers() {
    let mut scene = Scene::new(800.0, 1000.0);
    scene.insert(make_layer(LayerKind::Text, "note"));
    scene.resize(400.0, 300.0);
    assert_eq!(scene.width, 400.0);
    assert_eq!(scene.height, 300.0);
    assert_eq!(scene.len(), 1);
}

// =============================================================
// Serialization round-trip
// =============================================================

#[test]
fn json_roundtrip_is_lossless() {
    let mut scene = Scene::new(640.0, 480.0);
    scene.background_fill = Some("#ffffff".to_owned());
    scene.insert(make_slot_layer(
        LayerKind::BackgroundImage,
        Slot::BackgroundImage,
        "https://example.com/bg.png",
    ));
    scene.insert(make_slot_layer(LayerKind::Emoji, Slot::Emoji, "🔥"));
    let mut text = make_layer(LayerKind::Text, "hello\nworld");
    text.style = Some(TextStyle {
        font_size: 42.0,
        color: "#ff0000".to_owned(),
        bold: true,
        italic: false,
        underline: true,
        script: Script::Superscript,
    });
    scene.insert(text);

    let json = scene.to_json().unwrap();
    let back = Scene::from_json(&json).unwrap();

    assert_eq!(back.width, 640.0);
    assert_eq!(back.height, 480.0);
    assert_eq!(back.background_fill.as_deref(), Some("#ffffff"));
    assert_eq!(back.len(), scene.len());

    let original = scene.sorted_layers();
    let restored = back.sorted_layers();
    for (a, b) in original.iter().zip(restored.iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.content, b.content);
        assert_eq!(a.x, b.x);
        assert_eq!(a.y, b.y);
        assert_eq!(a.width, b.width);
        assert_eq!(a.height, b.height);
        assert_eq!(a.slot, b.slot);
        assert_eq!(a.style, b.style);
    }
}

#[test]
fn from_json_rebuilds_slot_index() {
    let mut scene = Scene::default();
    scene.insert(make_slot_layer(LayerKind::Emoji, Slot::Emoji, "🔥"));
    let json = scene.to_json().unwrap();
    let back = Scene::from_json(&json).unwrap();
    assert_eq!(back.slot_layer(Slot::Emoji).unwrap().content, "🔥");
}

#[test]
fn from_json_duplicate_slot_keeps_topmost() {
    let a = make_slot_layer(LayerKind::Emoji, Slot::Emoji, "🔥");
    let mut b = make_slot_layer(LayerKind::Emoji, Slot::Emoji, "🚀");
    b.z_index = 5;
    let json = serde_json::to_string(&serde_json::json!({
        "width": 800.0,
        "height": 1000.0,
        "layers": [a, b],
    }))
    .unwrap();
    let scene = Scene::from_json(&json).unwrap();
    assert_eq!(scene.len(), 1);
    assert_eq!(scene.slot_layer(Slot::Emoji).unwrap().content, "🚀");
}

#[test]
fn from_json_rejects_malformed_input() {
    assert!(Scene::from_json("not json").is_err());
    assert!(Scene::from_json("{\"width\": 800}").is_err());
}

#[test]
fn insert_after_from_json_draws_on_top() {
    let mut scene = Scene::default();
    scene.insert(make_layer(LayerKind::Text, "bottom"));
    let json = scene.to_json().unwrap();
    let mut back = Scene::from_json(&json).unwrap();
    back.insert(make_layer(LayerKind::Text, "top"));
    let contents: Vec<&str> = back
        .sorted_layers()
        .iter()
        .map(|l| l.content.as_str())
        .collect();
    assert_eq!(contents, vec!["bottom", "top"]);
}

// =============================================================
// TextStyle defaults
// =============================================================

#[test]
fn text_style_default_matches_consts() {
    let style = TextStyle::default();
    assert_eq!(style.font_size, crate::consts::DEFAULT_FONT_SIZE);
    assert_eq!(style.color, crate::consts::DEFAULT_TEXT_COLOR);
    assert!(!style.bold);
    assert!(!style.italic);
    assert!(!style.underline);
    assert_eq!(style.script, Script::Normal);
}

#[test]
fn text_style_deserializes_with_partial_fields() {
    let style: TextStyle = serde_json::from_str("{\"font_size\": 12.0}").unwrap();
    assert_eq!(style.font_size, 12.0);
    assert_eq!(style.color, crate::consts::DEFAULT_TEXT_COLOR);
    assert_eq!(style.script, Script::Normal);
}
