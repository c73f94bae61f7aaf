//! Shared numeric constants for the canvas crate.

// ── Camera ──────────────────────────────────────────────────────

/// Smallest allowed zoom factor.
pub const ZOOM_MIN: f64 = 0.5;

/// Largest allowed zoom factor.
pub const ZOOM_MAX: f64 = 2.0;

/// Zoom increment for buttons, keys, and ctrl+wheel.
pub const ZOOM_STEP: f64 = 0.1;

// ── Cards ───────────────────────────────────────────────────────

/// Small card width and height in world units.
pub const CARD_SMALL: (f64, f64) = (160.0, 64.0);

/// Medium card width and height in world units.
pub const CARD_MEDIUM: (f64, f64) = (224.0, 96.0);

/// Large card width and height in world units.
pub const CARD_LARGE: (f64, f64) = (288.0, 128.0);

/// Card height when the chart is shown collapsed (title only).
pub const COLLAPSED_CARD_HEIGHT: f64 = 40.0;

/// Fallback card color.
pub const DEFAULT_CARD_COLOR: &str = "#3B82F6";

// ── Decorative lines ────────────────────────────────────────────

/// Fallback decorative line color.
pub const DEFAULT_LINE_COLOR: &str = "#64748B";

/// Fallback decorative line stroke width.
pub const DEFAULT_LINE_STROKE_WIDTH: f64 = 2.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space radius of the left/right connection ports.
pub const PORT_RADIUS_PX: f64 = 10.0;

/// Screen-space slop around a decorative line body.
pub const LINE_HIT_SLOP_PX: f64 = 10.0;

/// Screen-space radius of a selected line's endpoint handles.
pub const LINE_HANDLE_RADIUS_PX: f64 = 8.0;

/// Pointer travel in screen pixels below which a press counts as a click.
pub const DRAG_THRESHOLD_PX: f64 = 3.0;
