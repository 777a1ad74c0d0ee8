//! Draft mark state machine: place, drag, style, and convert on save.
//!
//! There is at most one draft at a time. Dragging only moves the draft's
//! canvas-space position; nothing is converted until [`DraftMediator::placement`]
//! is asked for the save payload. A failed save leaves the draft in place so
//! the user can retry; [`DraftMediator::finish`] is called once the server has
//! accepted it.

#[cfg(test)]
#[path = "draft_test.rs"]
mod draft_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_PAGE, DRAFT_FONT_COLOR, DRAFT_FONT_SIZE_PX, DRAFT_START_X_PX, DRAFT_START_Y_PX, GUEST_DRAFT_TEXT,
    MAX_FONT_SIZE_PX, MIN_FONT_SIZE_PX, OWNER_DRAFT_TEXT,
};
use crate::geometry::{Point, ViewportGeometry};

/// Font families offered for drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Helvetica,
    Courier,
    Times,
}

impl FontFamily {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::Courier => "Courier",
            Self::Times => "Times",
        }
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FontFamily {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "helvetica" => Ok(Self::Helvetica),
            "courier" => Ok(Self::Courier),
            "times" => Ok(Self::Times),
            _ => Err(DraftError::UnknownFontFamily(s.to_owned())),
        }
    }
}

/// Errors from draft editing and save preparation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    /// No draft is being placed.
    #[error("no signature is being placed")]
    NotPlacing,
    /// The page canvas has not been rendered, so the draft cannot be mapped.
    #[error("viewport not ready")]
    ViewportNotReady,
    #[error("font color must be #rrggbb, got `{0}`")]
    InvalidColor(String),
    #[error("unknown font family `{0}`")]
    UnknownFontFamily(String),
}

/// Editable presentation of a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftStyle {
    pub text: String,
    pub font_size_px: u32,
    pub font_color: String,
    pub font_family: FontFamily,
}

impl DraftStyle {
    /// Style a document owner starts with.
    #[must_use]
    pub fn owner() -> Self {
        Self::with_text(OWNER_DRAFT_TEXT)
    }

    /// Style a public-link signer starts with.
    #[must_use]
    pub fn guest() -> Self {
        Self::with_text(GUEST_DRAFT_TEXT)
    }

    #[must_use]
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            font_size_px: DRAFT_FONT_SIZE_PX,
            font_color: DRAFT_FONT_COLOR.to_owned(),
            font_family: FontFamily::Helvetica,
        }
    }
}

/// The draft being positioned: canvas-space top-left corner plus style.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub position: Point,
    pub style: DraftStyle,
}

/// A draft converted into PDF space, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub page: u32,
    pub text: String,
    pub font_size: u32,
    pub font_color: String,
    pub font_family: FontFamily,
}

/// Mediator state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DraftState {
    /// No draft.
    #[default]
    Idle,
    /// A draft marker is visible and editable.
    Placing(Draft),
}

/// Owns the single in-progress draft for a view.
#[derive(Debug, Clone, Default)]
pub struct DraftMediator {
    state: DraftState,
}

impl DraftMediator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &DraftState {
        &self.state
    }

    #[must_use]
    pub fn draft(&self) -> Option<&Draft> {
        match &self.state {
            DraftState::Placing(draft) => Some(draft),
            DraftState::Idle => None,
        }
    }

    #[must_use]
    pub fn is_placing(&self) -> bool {
        matches!(self.state, DraftState::Placing(_))
    }

    /// Show a draft at the default position. Replaces any existing draft.
    pub fn begin(&mut self, style: DraftStyle) {
        let mut style = style;
        style.font_size_px = clamp_font_size(style.font_size_px);
        self.state = DraftState::Placing(Draft { position: Point::new(DRAFT_START_X_PX, DRAFT_START_Y_PX), style });
    }

    /// Move the draft to an absolute canvas position.
    ///
    /// # Errors
    ///
    /// [`DraftError::NotPlacing`] when idle.
    pub fn drag_to(&mut self, position: Point) -> Result<(), DraftError> {
        let draft = self.draft_mut()?;
        draft.position = clamp_position(position);
        Ok(())
    }

    /// Move the draft by a pointer delta.
    ///
    /// # Errors
    ///
    /// [`DraftError::NotPlacing`] when idle.
    pub fn drag_by(&mut self, dx: f64, dy: f64) -> Result<(), DraftError> {
        let draft = self.draft_mut()?;
        draft.position = clamp_position(Point::new(draft.position.x + dx, draft.position.y + dy));
        Ok(())
    }

    /// # Errors
    ///
    /// [`DraftError::NotPlacing`] when idle.
    pub fn set_text(&mut self, text: &str) -> Result<(), DraftError> {
        self.draft_mut()?.style.text = text.to_owned();
        Ok(())
    }

    /// Set the font size, clamped to the offered range.
    ///
    /// # Errors
    ///
    /// [`DraftError::NotPlacing`] when idle.
    pub fn set_font_size(&mut self, size_px: u32) -> Result<(), DraftError> {
        self.draft_mut()?.style.font_size_px = clamp_font_size(size_px);
        Ok(())
    }

    /// # Errors
    ///
    /// [`DraftError::InvalidColor`] unless `color` is `#rrggbb`;
    /// [`DraftError::NotPlacing`] when idle.
    pub fn set_font_color(&mut self, color: &str) -> Result<(), DraftError> {
        let color = parse_hex_color(color)?;
        self.draft_mut()?.style.font_color = color;
        Ok(())
    }

    /// # Errors
    ///
    /// [`DraftError::NotPlacing`] when idle.
    pub fn set_font_family(&mut self, family: FontFamily) -> Result<(), DraftError> {
        self.draft_mut()?.style.font_family = family;
        Ok(())
    }

    /// Convert the draft's current position into a PDF-space placement.
    ///
    /// Leaves the draft untouched.
    ///
    /// # Errors
    ///
    /// [`DraftError::NotPlacing`] when idle, [`DraftError::ViewportNotReady`]
    /// when there is no rendered canvas to map against.
    pub fn placement(&self, geometry: Option<&ViewportGeometry>) -> Result<Placement, DraftError> {
        let draft = self.draft().ok_or(DraftError::NotPlacing)?;
        let geometry = geometry.ok_or(DraftError::ViewportNotReady)?;
        let pdf = geometry.to_pdf(draft.position);
        Ok(Placement {
            x: pdf.x,
            y: pdf.y,
            page: DEFAULT_PAGE,
            text: draft.style.text.clone(),
            font_size: draft.style.font_size_px,
            font_color: draft.style.font_color.clone(),
            font_family: draft.style.font_family,
        })
    }

    /// The draft was saved; return to idle.
    pub fn finish(&mut self) {
        self.state = DraftState::Idle;
    }

    /// Discard the draft without side effects.
    pub fn cancel(&mut self) {
        self.state = DraftState::Idle;
    }

    fn draft_mut(&mut self) -> Result<&mut Draft, DraftError> {
        match &mut self.state {
            DraftState::Placing(draft) => Ok(draft),
            DraftState::Idle => Err(DraftError::NotPlacing),
        }
    }
}

fn clamp_font_size(size_px: u32) -> u32 {
    size_px.clamp(MIN_FONT_SIZE_PX, MAX_FONT_SIZE_PX)
}

fn clamp_position(p: Point) -> Point {
    let clamp = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
    Point::new(clamp(p.x), clamp(p.y))
}

/// Normalize a `#rrggbb` color to lowercase.
///
/// # Errors
///
/// [`DraftError::InvalidColor`] for anything else.
pub fn parse_hex_color(raw: &str) -> Result<String, DraftError> {
    let trimmed = raw.trim();
    let valid = trimmed.len() == 7
        && trimmed.starts_with('#')
        && trimmed[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(DraftError::InvalidColor(raw.to_owned()));
    }
    Ok(trimmed.to_ascii_lowercase())
}
