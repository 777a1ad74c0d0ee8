//! Document listing, filtering, upload and source resolution.

#[cfg(test)]
#[path = "documents_test.rs"]
mod documents_test;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::ClientError;
use crate::net::api::{ApiClient, finalized_file_path, original_file_path};
use crate::net::types::Document;
use crate::session::Session;

/// Dashboard filter over document status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Signed,
    Rejected,
}

impl StatusFilter {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Pending => "Pending",
            Self::Signed => "Signed",
            Self::Rejected => "Rejected",
        }
    }

    /// Case-insensitive match against a document's status string.
    #[must_use]
    pub fn matches(self, document: &Document) -> bool {
        self == Self::All || document.status.trim().eq_ignore_ascii_case(self.as_str())
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = ClientError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        [Self::All, Self::Pending, Self::Signed, Self::Rejected]
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| ClientError::validation(format!("unknown status filter `{raw}`")))
    }
}

#[must_use]
pub fn filter_documents(documents: &[Document], filter: StatusFilter) -> Vec<&Document> {
    documents.iter().filter(|d| filter.matches(d)).collect()
}

/// Which file the viewer should load for a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// The flattened copy produced by finalize.
    Finalized(String),
    /// The file as uploaded.
    Original(String),
}

impl DocumentSource {
    #[must_use]
    pub fn for_document(document: &Document, finalized: bool) -> Self {
        if finalized {
            Self::Finalized(finalized_file_path(&document.path))
        } else {
            Self::Original(original_file_path(&document.path))
        }
    }

    /// Path relative to the API origin.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Finalized(path) | Self::Original(path) => path,
        }
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        matches!(self, Self::Finalized(_))
    }
}

/// Pick the file to display. The record's own `finalized` flag wins; the
/// HEAD probe only runs for records that do not carry one.
pub async fn resolve_source(api: &ApiClient, document: &Document) -> DocumentSource {
    let finalized = match document.finalized {
        Some(flag) => flag,
        None => api.finalized_exists(&document.path).await,
    };
    debug!(document_id = %document.id, finalized, explicit = document.finalized.is_some(), "resolved document source");
    DocumentSource::for_document(document, finalized)
}

/// Read a local PDF and upload it. Returns the new document id.
///
/// # Errors
///
/// Validation error for non-`.pdf` paths; I/O errors reading the file;
/// network and server errors.
pub async fn upload_pdf(api: &ApiClient, session: &Session, path: &Path) -> Result<String, ClientError> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(ClientError::validation(format!("{} is not a PDF file", path.display())));
    }
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ClientError::validation(format!("invalid file name: {}", path.display())))?;
    let bytes = tokio::fs::read(path).await?;
    api.upload_document(session, file_name, bytes).await
}
