//! Rendering: draws the full design scene to a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It receives read-only views of scene state and the decoded-image cache and
//! produces pixels — it does not mutate any application state.
//!
//! There is deliberately no selection drawing here: layers never render a
//! bounding box, handles, or any other decoration, whatever the selection
//! state. Because no selection artifact can ever be painted, the corrective
//! next-tick re-render some canvas libraries need after insertion does not
//! apply to this renderer.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine`]) handles the result.

use std::collections::HashMap;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::consts::TEXT_LINE_HEIGHT_RATIO;
use crate::scene::{Layer, LayerId, LayerKind, Scene, Script, TextStyle};

/// Font size multiplier for super/subscript runs.
const SCRIPT_SIZE_RATIO: f64 = 0.65;

/// Baseline shift for superscript, as a fraction of the font size.
const SUPERSCRIPT_RISE: f64 = -0.35;

/// Baseline shift for subscript, as a fraction of the font size.
const SUBSCRIPT_DROP: f64 = 0.25;

/// Draw the full scene: ambient fill first, then every layer in z-order.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(
    ctx: &CanvasRenderingContext2d,
    scene: &Scene,
    images: &HashMap<LayerId, HtmlImageElement>,
) -> Result<(), JsValue> {
    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, scene.width, scene.height);

    if let Some(color) = &scene.background_fill {
        ctx.set_fill_style_str(color);
        ctx.fill_rect(0.0, 0.0, scene.width, scene.height);
    }

    for layer in scene.sorted_layers() {
        match layer.kind {
            LayerKind::BackgroundImage | LayerKind::Image => draw_image(ctx, layer, images)?,
            LayerKind::Emoji => draw_emoji(ctx, layer)?,
            LayerKind::Text => draw_text(ctx, layer)?,
        }
    }

    Ok(())
}

// =============================================================
// Layer renderers
// =============================================================

fn draw_image(
    ctx: &CanvasRenderingContext2d,
    layer: &Layer,
    images: &HashMap<LayerId, HtmlImageElement>,
) -> Result<(), JsValue> {
    // An image layer exists only after its fetch committed, so a cache miss
    // means the host dropped the element; skip rather than fail the frame.
    let Some(element) = images.get(&layer.id) else {
        return Ok(());
    };
    ctx.draw_image_with_html_image_element_and_dw_and_dh(
        element,
        layer.x - layer.width / 2.0,
        layer.y - layer.height / 2.0,
        layer.width,
        layer.height,
    )
}

fn draw_emoji(ctx: &CanvasRenderingContext2d, layer: &Layer) -> Result<(), JsValue> {
    ctx.save();
    ctx.set_font(&format!("{:.0}px sans-serif", layer.height));
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    let result = ctx.fill_text(&layer.content, layer.x, layer.y);
    ctx.restore();
    result
}

fn draw_text(ctx: &CanvasRenderingContext2d, layer: &Layer) -> Result<(), JsValue> {
    let style = layer.style.clone().unwrap_or_default();
    let font_size = match style.script {
        Script::Normal => style.font_size,
        Script::Superscript | Script::Subscript => style.font_size * SCRIPT_SIZE_RATIO,
    };
    let baseline_shift = match style.script {
        Script::Normal => 0.0,
        Script::Superscript => style.font_size * SUPERSCRIPT_RISE,
        Script::Subscript => style.font_size * SUBSCRIPT_DROP,
    };

    ctx.save();
    ctx.set_fill_style_str(&style.color);
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.set_font(&font_string(&style, font_size));

    let lines: Vec<&str> = layer.content.lines().collect();
    let line_height = font_size * TEXT_LINE_HEIGHT_RATIO;
    #[allow(clippy::cast_precision_loss)]
    let total_height = line_height * (lines.len().saturating_sub(1) as f64);
    let start_y = layer.y - total_height * 0.5 + baseline_shift;

    for (idx, line) in lines.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let y = start_y + (idx as f64 * line_height);
        ctx.fill_text(line, layer.x, y)?;
        if style.underline && !line.is_empty() {
            draw_underline(ctx, &style, line, layer.x, y, font_size)?;
        }
    }

    ctx.restore();
    Ok(())
}

fn draw_underline(
    ctx: &CanvasRenderingContext2d,
    style: &TextStyle,
    line: &str,
    center_x: f64,
    baseline_y: f64,
    font_size: f64,
) -> Result<(), JsValue> {
    let width = match ctx.measure_text(line) {
        Ok(metrics) => metrics.width(),
        Err(_) => return Ok(()),
    };
    let y = baseline_y + font_size * 0.45;
    ctx.set_stroke_style_str(&style.color);
    ctx.set_line_width((font_size / 14.0).max(1.0));
    ctx.begin_path();
    ctx.move_to(center_x - width / 2.0, y);
    ctx.line_to(center_x + width / 2.0, y);
    ctx.stroke();
    Ok(())
}

// =============================================================
// Helpers
// =============================================================

/// Build a CSS font shorthand from a text style.
fn font_string(style: &TextStyle, font_size: f64) -> String {
    let italic = if style.italic { "italic " } else { "" };
    let weight = if style.bold { "bold " } else { "" };
    format!("{italic}{weight}{font_size:.1}px sans-serif")
}
