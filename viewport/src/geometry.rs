//! PDF-space / canvas-space conversions.
//!
//! PDF-space is fixed to the page (595×842 units, origin bottom-left).
//! Canvas-space is the rendered page in pixels (origin top-left) and its
//! size changes with zoom and layout. Only the scale factors are derived
//! from the canvas; the page size never is.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

use crate::consts::{PAGE_HEIGHT_PT, PAGE_WIDTH_PT};

/// A point in either PDF or canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
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

/// Why a canvas measurement cannot back a geometry.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// The canvas has not been rendered yet, or reported a degenerate size.
    #[error("canvas geometry unavailable ({width}x{height})")]
    Unavailable { width: f64, height: f64 },
}

/// Rendered size of the page canvas and the scale it implies.
///
/// Both scale factors are computed together at construction and the fields
/// are private, so a geometry can never pair fresh dimensions with a stale
/// scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportGeometry {
    canvas_width_px: f64,
    canvas_height_px: f64,
    scale_x: f64,
    scale_y: f64,
}

impl ViewportGeometry {
    /// Build geometry from a measured canvas size.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Unavailable`] when either dimension is zero,
    /// negative, or not finite.
    pub fn new(canvas_width_px: f64, canvas_height_px: f64) -> Result<Self, GeometryError> {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(canvas_width_px) || !usable(canvas_height_px) {
            return Err(GeometryError::Unavailable { width: canvas_width_px, height: canvas_height_px });
        }
        Ok(Self {
            canvas_width_px,
            canvas_height_px,
            scale_x: canvas_width_px / PAGE_WIDTH_PT,
            scale_y: canvas_height_px / PAGE_HEIGHT_PT,
        })
    }

    /// Geometry for a canvas rendered at exactly `zoom` times the page size.
    ///
    /// # Errors
    ///
    /// Same as [`ViewportGeometry::new`].
    pub fn at_zoom(zoom: f64) -> Result<Self, GeometryError> {
        Self::new(PAGE_WIDTH_PT * zoom, PAGE_HEIGHT_PT * zoom)
    }

    #[must_use]
    pub fn canvas_width_px(&self) -> f64 {
        self.canvas_width_px
    }

    #[must_use]
    pub fn canvas_height_px(&self) -> f64 {
        self.canvas_height_px
    }

    /// Canvas pixels per PDF unit, horizontally.
    #[must_use]
    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    /// Canvas pixels per PDF unit, vertically.
    #[must_use]
    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }

    /// Convert a PDF-space point to canvas pixels, flipping the vertical axis.
    #[must_use]
    pub fn to_screen(&self, pdf: Point) -> Point {
        Point { x: pdf.x * self.scale_x, y: (PAGE_HEIGHT_PT - pdf.y) * self.scale_y }
    }

    /// Convert a canvas-space point back to PDF space.
    #[must_use]
    pub fn to_pdf(&self, screen: Point) -> Point {
        Point { x: screen.x / self.scale_x, y: PAGE_HEIGHT_PT - screen.y / self.scale_y }
    }
}

/// [`ViewportGeometry::to_screen`] for callers that may not have geometry yet.
#[must_use]
pub fn screen_position(pdf: Point, geometry: Option<&ViewportGeometry>) -> Option<Point> {
    geometry.map(|g| g.to_screen(pdf))
}

/// [`ViewportGeometry::to_pdf`] for callers that may not have geometry yet.
#[must_use]
pub fn pdf_position(screen: Point, geometry: Option<&ViewportGeometry>) -> Option<Point> {
    geometry.map(|g| g.to_pdf(screen))
}
