//! Shared constants for the viewport crate.

// ── Page ────────────────────────────────────────────────────────

/// Page width in PDF units. Fixed regardless of the uploaded document.
pub const PAGE_WIDTH_PT: f64 = 595.0;

/// Page height in PDF units. Fixed regardless of the uploaded document.
pub const PAGE_HEIGHT_PT: f64 = 842.0;

/// Marks are always placed on the first page.
pub const DEFAULT_PAGE: u32 = 0;

// ── Overlay defaults ────────────────────────────────────────────

/// Label shown for a mark whose text is empty.
pub const DEFAULT_MARK_LABEL: &str = "Signed";

/// Font family applied when a mark carries none.
pub const DEFAULT_FONT_FAMILY: &str = "Helvetica";

/// Font color applied when a mark carries none.
pub const DEFAULT_FONT_COLOR: &str = "#000000";

/// Font size in pixels applied when a mark carries none.
pub const DEFAULT_FONT_SIZE_PX: f64 = 16.0;

/// Markers never grow wider than this, in pixels.
pub const MARKER_MAX_WIDTH_PX: f64 = 200.0;

// ── Draft ───────────────────────────────────────────────────────

/// Canvas-space position a new draft mark starts at.
pub const DRAFT_START_X_PX: f64 = 100.0;
pub const DRAFT_START_Y_PX: f64 = 100.0;

/// Default text for a draft placed by the document owner.
pub const OWNER_DRAFT_TEXT: &str = "Signature";

/// Default text for a draft placed through a public signing link.
pub const GUEST_DRAFT_TEXT: &str = "Signed by Guest";

/// Default draft font size in pixels.
pub const DRAFT_FONT_SIZE_PX: u32 = 20;

/// Default draft font color.
pub const DRAFT_FONT_COLOR: &str = "#0066ff";

/// Inclusive font size range offered for drafts.
pub const MIN_FONT_SIZE_PX: u32 = 10;
pub const MAX_FONT_SIZE_PX: u32 = 48;
