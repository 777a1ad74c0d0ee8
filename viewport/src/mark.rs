//! Signature marks as returned by the signature API.
//!
//! A mark is a positioned label with optional style and a signing status.
//! Marks are created server-side and are read-only here; the one mark being
//! positioned lives in [`crate::draft`] until it is saved.

#[cfg(test)]
#[path = "mark_test.rs"]
mod mark_test;

use serde::{Deserialize, Deserializer, Serialize};

use crate::geometry::Point;

/// Signing status of a mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkStatus {
    /// Waiting on the signer.
    #[default]
    Pending,
    /// Signed by the recipient.
    Signed,
    /// Declined by the recipient, possibly with a reason.
    Rejected,
    /// Any status string this client does not know about.
    #[serde(other)]
    Unknown,
}

/// One signature placement on a document page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureMark {
    /// Server-assigned id.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Document the mark belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// Label text. May be empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    /// Left edge in PDF units.
    #[serde(default, deserialize_with = "null_as_default")]
    pub x: f64,
    /// Baseline in PDF units, measured up from the bottom of the page.
    #[serde(default, deserialize_with = "null_as_default")]
    pub y: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: MarkStatus,
    /// Free-text reason supplied when the signer rejected the mark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_reason: Option<String>,
}

/// Older records carry explicit `null`s; treat them like missing fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl SignatureMark {
    /// Position of the mark in PDF space.
    #[must_use]
    pub fn pdf_position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// The rejection reason, if the mark is rejected and the reason is non-blank.
    #[must_use]
    pub fn rejection_reason(&self) -> Option<&str> {
        if self.status != MarkStatus::Rejected {
            return None;
        }
        self.rejected_reason.as_deref().map(str::trim).filter(|r| !r.is_empty())
    }
}
