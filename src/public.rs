//! Signing through an emailed public link, without an account.

#[cfg(test)]
#[path = "public_test.rs"]
mod public_test;

use tracing::{info, warn};
use viewport::draft::{DraftMediator, DraftStyle};
use viewport::geometry::{Point, ViewportGeometry};
use viewport::mark::SignatureMark;

use crate::error::ClientError;
use crate::net::api::ApiClient;
use crate::net::types::PublicSignRequest;

/// A signer's session on one public link.
#[derive(Debug)]
pub struct PublicSigning {
    api: ApiClient,
    token: String,
    mark: SignatureMark,
    draft: DraftMediator,
    completed: bool,
}

impl PublicSigning {
    /// Fetch the mark behind `token` and start a draft for it.
    ///
    /// The draft text starts as the mark's own text, or the guest default
    /// when that is blank.
    ///
    /// # Errors
    ///
    /// [`ClientError::InvalidLink`] when the mark cannot be fetched.
    pub async fn open(api: ApiClient, token: &str) -> Result<Self, ClientError> {
        let mark = match api.fetch_public_mark(token).await {
            Ok(mark) => mark,
            Err(e) => {
                warn!(error = %e, "public link lookup failed");
                return Err(ClientError::InvalidLink(Box::new(e)));
            }
        };
        let style = if mark.text.trim().is_empty() {
            DraftStyle::guest()
        } else {
            DraftStyle::with_text(&mark.text)
        };
        let mut draft = DraftMediator::new();
        draft.begin(style);
        info!(document_id = mark.document_id.as_deref().unwrap_or_default(), "public link opened");
        Ok(Self { api, token: token.trim().to_owned(), mark, draft, completed: false })
    }

    #[must_use]
    pub fn mark(&self) -> &SignatureMark {
        &self.mark
    }

    /// Document the link belongs to, for loading the page.
    #[must_use]
    pub fn document_id(&self) -> Option<&str> {
        self.mark.document_id.as_deref()
    }

    #[must_use]
    pub fn draft(&self) -> &DraftMediator {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut DraftMediator {
        &mut self.draft
    }

    /// Whether the link was already signed or rejected in this session.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Move the draft to a screen-space position.
    ///
    /// # Errors
    ///
    /// Validation error when the link was already used.
    pub fn drag_to(&mut self, position: Point) -> Result<(), ClientError> {
        self.ensure_pending()?;
        self.draft.drag_to(position)?;
        Ok(())
    }

    /// Submit the draft at its PDF-space position.
    ///
    /// # Errors
    ///
    /// [`ClientError::ViewportNotReady`] without geometry; validation error
    /// when the link was already used; network and server errors.
    pub async fn submit(&mut self, geometry: Option<&ViewportGeometry>) -> Result<(), ClientError> {
        self.ensure_pending()?;
        let placement = self.draft.placement(geometry)?;
        self.api.sign_public(&self.token, &PublicSignRequest::from(placement)).await?;
        self.draft.finish();
        self.completed = true;
        Ok(())
    }

    /// Decline to sign. An empty reason is allowed.
    ///
    /// # Errors
    ///
    /// Validation error when the link was already used; network and server
    /// errors.
    pub async fn reject(&mut self, reason: &str) -> Result<(), ClientError> {
        self.ensure_pending()?;
        self.api.reject_public(&self.token, reason).await?;
        self.draft.cancel();
        self.completed = true;
        Ok(())
    }

    fn ensure_pending(&self) -> Result<(), ClientError> {
        if self.completed {
            return Err(ClientError::validation("this link has already been used"));
        }
        Ok(())
    }
}
