//! Overlay rendering: turns marks and geometry into positioned markers.
//!
//! [`render_overlay`] is a pure function of its inputs. It builds a complete
//! [`OverlayFrame`] every call; nothing is diffed against the previous frame,
//! so repainting with identical inputs always yields an identical frame and a
//! stale geometry can never survive a newer mark list.
//!
//! [`OverlayLayer`] is the surface a frame is painted into. Its content is only
//! ever replaced wholesale through [`OverlayLayer::paint`].

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use crate::consts::{DEFAULT_FONT_COLOR, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE_PX, DEFAULT_MARK_LABEL, MARKER_MAX_WIDTH_PX};
use crate::geometry::{Point, ViewportGeometry};
use crate::mark::{MarkStatus, SignatureMark};

/// Whether status badges are drawn under each mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Marks only.
    #[default]
    Plain,
    /// Marks plus a status badge each.
    Tracking,
}

/// Visual tone of a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    Positive,
    Neutral,
    Negative,
}

/// Status badge attached to a marker in tracking mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBadge {
    pub tone: BadgeTone,
    pub label: &'static str,
    /// Rejection reason, shown in parentheses after the label.
    pub reason: Option<String>,
}

impl StatusBadge {
    /// Badge for a mark, or `None` when its status has no badge.
    #[must_use]
    pub fn for_mark(mark: &SignatureMark) -> Option<Self> {
        let (tone, label) = match mark.status {
            MarkStatus::Signed => (BadgeTone::Positive, "Signed"),
            MarkStatus::Pending => (BadgeTone::Neutral, "Pending"),
            MarkStatus::Rejected => (BadgeTone::Negative, "Rejected"),
            MarkStatus::Unknown => return None,
        };
        Some(Self { tone, label, reason: mark.rejection_reason().map(str::to_owned) })
    }

    /// Display text, e.g. `Rejected (Not my document)`.
    #[must_use]
    pub fn text(&self) -> String {
        match &self.reason {
            Some(reason) => format!("{} ({reason})", self.label),
            None => self.label.to_owned(),
        }
    }
}

/// One positioned mark, ready for a host to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayMarker {
    /// Server id of the source mark, when known.
    pub mark_id: Option<String>,
    /// Canvas-space position of the marker's top-left corner.
    pub position: Point,
    pub label: String,
    pub font_size_px: f64,
    pub font_family: String,
    pub font_color: String,
    pub badge: Option<StatusBadge>,
}

impl OverlayMarker {
    /// Inline CSS for an absolutely positioned, non-interactive marker.
    ///
    /// `origin` is the canvas's top-left corner inside the overlay layer.
    #[must_use]
    pub fn inline_style(&self, origin: Point) -> String {
        format!(
            "position:absolute;left:{}px;top:{}px;font-size:{}px;font-family:{};color:{};max-width:{}px;pointer-events:none",
            origin.x + self.position.x,
            origin.y + self.position.y,
            self.font_size_px,
            self.font_family,
            self.font_color,
            MARKER_MAX_WIDTH_PX,
        )
    }
}

/// The complete content of the overlay for one set of inputs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlayFrame {
    pub markers: Vec<OverlayMarker>,
}

impl OverlayFrame {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }
}

/// Build the overlay frame for `marks` over the current canvas.
///
/// Without geometry nothing is placed; marks are never drawn at the origin
/// as a fallback.
#[must_use]
pub fn render_overlay(marks: &[SignatureMark], geometry: Option<&ViewportGeometry>, mode: DisplayMode) -> OverlayFrame {
    let Some(geometry) = geometry else {
        return OverlayFrame::default();
    };
    let markers = marks
        .iter()
        .map(|mark| render_marker(mark, geometry, mode))
        .collect();
    OverlayFrame { markers }
}

fn render_marker(mark: &SignatureMark, geometry: &ViewportGeometry, mode: DisplayMode) -> OverlayMarker {
    let label = if mark.text.is_empty() { DEFAULT_MARK_LABEL.to_owned() } else { mark.text.clone() };
    let font_size_px = mark
        .font_size
        .filter(|size| size.is_finite() && *size > 0.0)
        .unwrap_or(DEFAULT_FONT_SIZE_PX);
    let font_family = non_empty_or(mark.font_family.as_deref(), DEFAULT_FONT_FAMILY);
    let font_color = non_empty_or(mark.font_color.as_deref(), DEFAULT_FONT_COLOR);
    let badge = match mode {
        DisplayMode::Tracking => StatusBadge::for_mark(mark),
        DisplayMode::Plain => None,
    };

    OverlayMarker {
        mark_id: mark.id.clone(),
        position: geometry.to_screen(mark.pdf_position()),
        label,
        font_size_px,
        font_family,
        font_color,
        badge,
    }
}

fn non_empty_or(value: Option<&str>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_owned(),
        _ => default.to_owned(),
    }
}

// =============================================================================
// LAYER
// =============================================================================

/// Identifier of an overlay layer instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

/// Whether a surface receives pointer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvents {
    /// Input passes through to the viewer underneath.
    None,
    /// The surface captures input.
    Auto,
}

/// The overlay surface attached to the viewer's scroll container.
///
/// Fills the container and never intercepts pointer input; the draft marker
/// is drawn above it by the host and is the only interactive element.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayer {
    id: LayerId,
    width_px: f64,
    height_px: f64,
    canvas_origin: Point,
    content: OverlayFrame,
}

impl OverlayLayer {
    #[must_use]
    pub fn new(id: LayerId, width_px: f64, height_px: f64) -> Self {
        Self { id, width_px, height_px, canvas_origin: Point::new(0.0, 0.0), content: OverlayFrame::default() }
    }

    #[must_use]
    pub fn id(&self) -> LayerId {
        self.id
    }

    #[must_use]
    pub fn size(&self) -> (f64, f64) {
        (self.width_px, self.height_px)
    }

    /// Always [`PointerEvents::None`].
    #[must_use]
    pub fn pointer_events(&self) -> PointerEvents {
        PointerEvents::None
    }

    /// Where the canvas's top-left corner sits inside the layer.
    #[must_use]
    pub fn canvas_origin(&self) -> Point {
        self.canvas_origin
    }

    /// Follow the container's size and the canvas's offset within it.
    pub fn reshape(&mut self, width_px: f64, height_px: f64, canvas_origin: Point) {
        self.width_px = width_px;
        self.height_px = height_px;
        self.canvas_origin = canvas_origin;
    }

    /// Replace the layer's content with `frame`.
    pub fn paint(&mut self, frame: OverlayFrame) {
        self.content = frame;
    }

    #[must_use]
    pub fn content(&self) -> &OverlayFrame {
        &self.content
    }

    /// Inline styles for every marker, in frame order.
    #[must_use]
    pub fn marker_styles(&self) -> Vec<String> {
        self.content
            .markers
            .iter()
            .map(|marker| marker.inline_style(self.canvas_origin))
            .collect()
    }
}
