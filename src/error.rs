//! Client error taxonomy.
//!
//! Every failure a view session can hit is one of four kinds. None of them is
//! fatal to the session: the user can retry the action that failed.
//!
//! | Kind | Raised by | Handling |
//! |------|-----------|----------|
//! | `NetworkFailure` | any request | surfaced as a notice, no automatic retry |
//! | `GeometryUnavailable` | save before the canvas renders | renderer shows nothing, save refused |
//! | `ValidationFailure` | missing input | blocked before any request |
//! | `LocalStorage` | session file I/O | surfaced as a notice |

use viewport::draft::DraftError;

/// Coarse classification used for user-facing handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NetworkFailure,
    GeometryUnavailable,
    ValidationFailure,
    LocalStorage,
}

/// Errors produced by client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response (connect, timeout, body read).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    /// A success response whose body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The owner's document list has no document with this id.
    #[error("document {0} not found")]
    DocumentNotFound(String),

    /// A public signing link whose mark could not be fetched.
    #[error("invalid or expired link")]
    InvalidLink(#[source] Box<ClientError>),

    /// The call needs a bearer token and the session has none.
    #[error("not signed in; run `signdesk login` first")]
    NotAuthenticated,

    /// The page canvas has not been rendered yet.
    #[error("viewport not ready")]
    ViewportNotReady,

    /// Missing or malformed user input.
    #[error("{0}")]
    Validation(String),

    /// The view was closed before the operation completed.
    #[error("view closed")]
    ViewClosed,

    /// Reading or writing a local file failed.
    #[error("local file access failed: {0}")]
    Storage(#[from] std::io::Error),

    /// The persisted session is not valid JSON.
    #[error("session file is corrupt: {0}")]
    CorruptSession(#[from] serde_json::Error),
}

impl ClientError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_) | Self::Server { .. } | Self::Decode(_)
            | Self::DocumentNotFound(_)
            | Self::InvalidLink(_) => {
                ErrorKind::NetworkFailure
            }
            Self::ViewportNotReady => ErrorKind::GeometryUnavailable,
            Self::NotAuthenticated | Self::Validation(_) | Self::ViewClosed => ErrorKind::ValidationFailure,
            Self::Storage(_) | Self::CorruptSession(_) => ErrorKind::LocalStorage,
        }
    }

    /// Stable machine-readable code for logs and scripted CLI use.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Http(_) => "E_HTTP",
            Self::Server { .. } => "E_SERVER",
            Self::Decode(_) => "E_DECODE",
            Self::DocumentNotFound(_) => "E_DOCUMENT_NOT_FOUND",
            Self::InvalidLink(_) => "E_INVALID_LINK",
            Self::NotAuthenticated => "E_NOT_AUTHENTICATED",
            Self::ViewportNotReady => "E_VIEWPORT_NOT_READY",
            Self::Validation(_) => "E_VALIDATION",
            Self::ViewClosed => "E_VIEW_CLOSED",
            Self::Storage(_) => "E_STORAGE",
            Self::CorruptSession(_) => "E_CORRUPT_SESSION",
        }
    }

    /// Whether trying the same action again could succeed without user changes.
    #[must_use]
    pub fn retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::ViewportNotReady => true,
            Self::Server { status, .. } => matches!(status, 429 | 500..=599),
            _ => false,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<DraftError> for ClientError {
    fn from(err: DraftError) -> Self {
        match err {
            DraftError::ViewportNotReady => Self::ViewportNotReady,
            other => Self::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
