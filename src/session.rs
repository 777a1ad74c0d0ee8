//! Auth session for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! The bearer token is an explicit value handed to every API call that needs
//! it, never ambient state. It is loaded once at startup, written on login and
//! removed on logout.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ClientError;

/// The current user's authentication state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    /// A session that is not signed in. Public-link flows use this.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self { token: Some(token.into()) }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The bearer token.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotAuthenticated`] when signed out.
    pub fn bearer(&self) -> Result<&str, ClientError> {
        self.token.as_deref().ok_or(ClientError::NotAuthenticated)
    }

    /// The bearer token if there is one.
    #[must_use]
    pub fn optional_bearer(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// File-backed persistence for [`Session`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted session. A missing file means signed out.
    ///
    /// # Errors
    ///
    /// I/O failures other than not-found, or a corrupt file.
    pub async fn load(&self) -> Result<Session, ClientError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no persisted session");
                return Ok(Session::anonymous());
            }
            Err(e) => return Err(e.into()),
        };
        let session: Session = serde_json::from_str(&raw)?;
        Ok(session)
    }

    /// Persist `token` and return the signed-in session.
    ///
    /// # Errors
    ///
    /// Validation error for a blank token; I/O failures writing the file.
    pub async fn login(&self, token: &str) -> Result<Session, ClientError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ClientError::validation("server returned an empty token"));
        }
        let session = Session::with_token(token);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&session)?).await?;
        info!(path = %self.path.display(), "session saved");
        Ok(session)
    }

    /// Forget the persisted session. Logging out twice is not an error.
    ///
    /// # Errors
    ///
    /// I/O failures other than not-found.
    pub async fn logout(&self) -> Result<Session, ClientError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => info!(path = %self.path.display(), "session cleared"),
            Err(e) if e.kind() == IoErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(Session::anonymous())
    }
}
