//! Shared numeric constants for the design engine.

// ── Surface ─────────────────────────────────────────────────────

/// Fallback surface width in pixels when the host element is unmeasurable.
pub const DEFAULT_SURFACE_WIDTH: f64 = 800.0;

/// Fallback surface height in pixels when the host element is unmeasurable.
pub const DEFAULT_SURFACE_HEIGHT: f64 = 1000.0;

// ── Uploads ─────────────────────────────────────────────────────

/// Maximum accepted upload size for local image files.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

// ── Text & emoji ────────────────────────────────────────────────

/// Default font size for free-standing text layers.
pub const DEFAULT_FONT_SIZE: f64 = 30.0;

/// Default fill color for text layers when neither the pending spec nor the
/// advisory palette supplies one.
pub const DEFAULT_TEXT_COLOR: &str = "#000000";

/// Placeholder content for a text layer added without a pending spec.
pub const DEFAULT_TEXT: &str = "Edit me";

/// Font size (and thus bounding square) for emoji layers.
pub const EMOJI_FONT_SIZE: f64 = 120.0;

/// Approximate glyph advance as a fraction of font size, used to derive text
/// layer bounds without a measuring context.
pub const TEXT_CHAR_WIDTH_RATIO: f64 = 0.6;

/// Line height as a fraction of font size.
pub const TEXT_LINE_HEIGHT_RATIO: f64 = 1.2;

// ── Images ──────────────────────────────────────────────────────

/// Largest fraction of the surface's shorter edge a newly inserted
/// (non-background) image may occupy.
pub const IMAGE_FIT_FRACTION: f64 = 0.5;
