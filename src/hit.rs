#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::scene::{LayerId, Point, Scene};

/// Test which movable layer (if any) is under `pt`, topmost first.
///
/// Draw order is insertion order, so the scan walks the sorted layer list in
/// reverse. Background layers are skipped — they are not pointer targets.
#[must_use]
pub fn topmost_at(scene: &Scene, pt: Point) -> Option<LayerId> {
    scene
        .sorted_layers()
        .into_iter()
        .rev()
        .find(|layer| layer.kind.movable() && layer.contains(pt))
        .map(|layer| layer.id)
}
