//! Wire types for the signing API.
//!
//! The backend speaks camelCase JSON with Mongo-style `_id` fields. Signature
//! marks themselves live in [`viewport::mark`].

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};
use viewport::draft::{FontFamily, Placement};

/// Default document status when the server omits one.
pub const DEFAULT_DOCUMENT_STATUS: &str = "Pending";

/// An uploaded document as listed by `/api/docs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub filename: String,
    /// Stored file name under `uploads/`.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    /// Explicit finalization flag, when the server provides one.
    #[serde(default)]
    pub finalized: Option<bool>,
}

fn default_status() -> String {
    DEFAULT_DOCUMENT_STATUS.to_owned()
}

/// Response carrying only an id (`POST /api/docs/upload`, `POST /api/signatures`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Created {
    #[serde(rename = "_id")]
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /api/signatures`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMarkRequest {
    pub document_id: String,
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub page: u32,
    pub font_size: u32,
    pub font_color: String,
    pub font_family: FontFamily,
}

impl CreateMarkRequest {
    #[must_use]
    pub fn new(document_id: &str, placement: Placement) -> Self {
        Self {
            document_id: document_id.to_owned(),
            x: placement.x,
            y: placement.y,
            text: placement.text,
            page: placement.page,
            font_size: placement.font_size,
            font_color: placement.font_color,
            font_family: placement.font_family,
        }
    }
}

/// Body of `POST /api/signatures/public/{token}/sign`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSignRequest {
    pub text: String,
    pub font_size: u32,
    pub font_color: String,
    pub font_family: FontFamily,
    pub x: f64,
    pub y: f64,
}

impl From<Placement> for PublicSignRequest {
    fn from(placement: Placement) -> Self {
        Self {
            text: placement.text,
            font_size: placement.font_size,
            font_color: placement.font_color,
            font_family: placement.font_family,
            x: placement.x,
            y: placement.y,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest<'a> {
    pub rejected_reason: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest<'a> {
    pub document_id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicLinkRequest<'a> {
    pub email: &'a str,
}

/// Error body shape used by the backend (`{"msg": "..."}`).
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ServerMessage {
    pub msg: String,
}
