//! REST client for the external signing service.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures surface as [`ClientError::Http`]; non-success statuses
//! as [`ClientError::Server`] carrying the backend's `msg` when it sends one.
//! Nothing here retries. The finalized-file probe is the one call that
//! swallows failures, because a missing or unreachable file just means "use
//! the original".

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use viewport::mark::SignatureMark;

use super::types::{
    CreateMarkRequest, Created, Document, FinalizeRequest, LoginRequest, LoginResponse, PublicLinkRequest,
    PublicSignRequest, RegisterRequest, RejectRequest, ServerMessage,
};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::Session;

/// Longest server error body echoed back to the user.
const MAX_ERROR_BODY_CHARS: usize = 200;

// =============================================================================
// ENDPOINTS
// =============================================================================

fn path_segment<'a>(value: &'a str, what: &str) -> Result<&'a str, ClientError> {
    let value = value.trim();
    if value.is_empty() || value.contains(['/', '?', '#', ' ']) {
        return Err(ClientError::validation(format!("invalid {what}: `{value}`")));
    }
    Ok(value)
}

fn public_document_endpoint(document_id: &str) -> String {
    format!("/api/docs/{document_id}/public")
}

fn document_endpoint(document_id: &str) -> String {
    format!("/api/docs/{document_id}")
}

fn marks_endpoint(document_id: &str) -> String {
    format!("/api/signatures/{document_id}")
}

fn public_link_endpoint(signature_id: &str) -> String {
    format!("/api/signatures/{signature_id}/public-link")
}

fn public_mark_endpoint(token: &str) -> String {
    format!("/api/signatures/public/{token}")
}

fn public_sign_endpoint(token: &str) -> String {
    format!("/api/signatures/public/{token}/sign")
}

fn public_reject_endpoint(token: &str) -> String {
    format!("/api/signatures/public/{token}/reject")
}

/// Relative path of the flattened copy of a stored upload.
#[must_use]
pub fn finalized_file_path(stored_path: &str) -> String {
    format!("uploads/finalized/signed_{stored_path}")
}

/// Relative path of an original upload.
#[must_use]
pub fn original_file_path(stored_path: &str) -> String {
    format!("uploads/{stored_path}")
}

fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ServerMessage>(body) {
        return parsed.msg;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status.canonical_reason().unwrap_or("request failed").to_owned();
    }
    trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

// =============================================================================
// CLIENT
// =============================================================================

/// Typed client for every endpoint the signing UI consumes.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()?;
        Ok(Self { http, base_url: config.api_url.clone() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the API origin.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    fn authed(&self, method: Method, path: &str, session: &Session) -> Result<RequestBuilder, ClientError> {
        Ok(self.request(method, path).bearer_auth(session.bearer()?))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().path().to_owned();
        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        warn!(status = status.as_u16(), %url, %message, "request rejected");
        Err(ClientError::Server { status: status.as_u16(), message })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    // --- auth ---

    /// `POST /api/auth/login`, returning the bearer token.
    ///
    /// # Errors
    ///
    /// Validation error for blank credentials; network and server errors.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ClientError> {
        let email = required(email, "email")?;
        let password = required(password, "password")?;
        let request = self.request(Method::POST, "/api/auth/login").json(&LoginRequest { email, password });
        let body: LoginResponse = self.send_json(request).await?;
        info!(%email, "logged in");
        Ok(body.token)
    }

    /// `POST /api/auth/register`.
    ///
    /// # Errors
    ///
    /// Validation error for blank fields; network and server errors.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<(), ClientError> {
        let body = RegisterRequest {
            name: required(name, "name")?,
            email: required(email, "email")?,
            password: required(password, "password")?,
        };
        self.send(self.request(Method::POST, "/api/auth/register").json(&body)).await?;
        info!(email = body.email, "registered");
        Ok(())
    }

    // --- documents ---

    /// `GET /api/docs`.
    ///
    /// # Errors
    ///
    /// Not authenticated; network and server errors.
    pub async fn list_documents(&self, session: &Session) -> Result<Vec<Document>, ClientError> {
        self.send_json(self.authed(Method::GET, "/api/docs", session)?).await
    }

    /// The owner's document with `document_id`, found by listing.
    ///
    /// # Errors
    ///
    /// [`ClientError::DocumentNotFound`] when the list has no such document.
    pub async fn fetch_document(&self, session: &Session, document_id: &str) -> Result<Document, ClientError> {
        self.list_documents(session)
            .await?
            .into_iter()
            .find(|doc| doc.id == document_id)
            .ok_or_else(|| ClientError::DocumentNotFound(document_id.to_owned()))
    }

    /// `GET /api/docs/{id}/public`.
    ///
    /// # Errors
    ///
    /// Network and server errors.
    pub async fn fetch_public_document(&self, document_id: &str) -> Result<Document, ClientError> {
        let id = path_segment(document_id, "document id")?;
        self.send_json(self.request(Method::GET, &public_document_endpoint(id))).await
    }

    /// `POST /api/docs/upload` as multipart field `pdf`; returns the new id.
    ///
    /// # Errors
    ///
    /// Validation error for an empty file; network and server errors.
    pub async fn upload_document(
        &self,
        session: &Session,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ClientError> {
        if bytes.is_empty() {
            return Err(ClientError::validation("please choose a PDF file"));
        }
        let size = bytes.len();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_owned())
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new().part("pdf", part);
        let created: Created = self
            .send_json(self.authed(Method::POST, "/api/docs/upload", session)?.multipart(form))
            .await?;
        info!(document_id = %created.id, %file_name, size, "document uploaded");
        Ok(created.id)
    }

    /// `DELETE /api/docs/{id}`.
    ///
    /// # Errors
    ///
    /// Network and server errors.
    pub async fn delete_document(&self, session: &Session, document_id: &str) -> Result<(), ClientError> {
        let id = path_segment(document_id, "document id")?;
        self.send(self.authed(Method::DELETE, &document_endpoint(id), session)?).await?;
        info!(document_id = %id, "document deleted");
        Ok(())
    }

    /// `HEAD` the finalized copy of `stored_path`; true only on 200.
    pub async fn finalized_exists(&self, stored_path: &str) -> bool {
        let path = finalized_file_path(stored_path);
        match self.request(Method::HEAD, &path).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                debug!(error = %e, %path, "finalized probe failed");
                false
            }
        }
    }

    // --- marks ---

    /// `GET /api/signatures/{id}`. Sends the bearer token when the session has one.
    ///
    /// # Errors
    ///
    /// Network and server errors.
    pub async fn fetch_marks(&self, session: &Session, document_id: &str) -> Result<Vec<SignatureMark>, ClientError> {
        let id = path_segment(document_id, "document id")?;
        let mut request = self.request(Method::GET, &marks_endpoint(id));
        if let Some(token) = session.optional_bearer() {
            request = request.bearer_auth(token);
        }
        self.send_json(request).await
    }

    /// `POST /api/signatures`; returns the created mark's id.
    ///
    /// # Errors
    ///
    /// Not authenticated; network and server errors.
    pub async fn create_mark(&self, session: &Session, body: &CreateMarkRequest) -> Result<String, ClientError> {
        let created: Created = self
            .send_json(self.authed(Method::POST, "/api/signatures", session)?.json(body))
            .await?;
        info!(document_id = %body.document_id, signature_id = %created.id, x = body.x, y = body.y, "signature saved");
        Ok(created.id)
    }

    /// `POST /api/signatures/finalize`; returns the flattened PDF.
    ///
    /// # Errors
    ///
    /// Not authenticated; network and server errors.
    pub async fn finalize(&self, session: &Session, document_id: &str) -> Result<Vec<u8>, ClientError> {
        let request = self
            .authed(Method::POST, "/api/signatures/finalize", session)?
            .json(&FinalizeRequest { document_id });
        let bytes = self.send(request).await?.bytes().await?;
        info!(%document_id, size = bytes.len(), "document finalized");
        Ok(bytes.to_vec())
    }

    /// `POST /api/signatures/{id}/public-link`: email a signing link.
    ///
    /// # Errors
    ///
    /// Validation error for a blank email; network and server errors.
    pub async fn send_public_link(&self, session: &Session, signature_id: &str, email: &str) -> Result<(), ClientError> {
        let email = required(email, "recipient email")?;
        let id = path_segment(signature_id, "signature id")?;
        let request = self
            .authed(Method::POST, &public_link_endpoint(id), session)?
            .json(&PublicLinkRequest { email });
        self.send(request).await?;
        info!(signature_id = %id, %email, "signing link sent");
        Ok(())
    }

    // --- public links ---

    /// `GET /api/signatures/public/{token}`.
    ///
    /// # Errors
    ///
    /// Network and server errors.
    pub async fn fetch_public_mark(&self, token: &str) -> Result<SignatureMark, ClientError> {
        let token = path_segment(token, "link token")?;
        self.send_json(self.request(Method::GET, &public_mark_endpoint(token))).await
    }

    /// `POST /api/signatures/public/{token}/sign`.
    ///
    /// # Errors
    ///
    /// Network and server errors.
    pub async fn sign_public(&self, token: &str, body: &PublicSignRequest) -> Result<(), ClientError> {
        let token = path_segment(token, "link token")?;
        self.send(self.request(Method::POST, &public_sign_endpoint(token)).json(body)).await?;
        info!(x = body.x, y = body.y, "public signature submitted");
        Ok(())
    }

    /// `POST /api/signatures/public/{token}/reject`. The reason may be empty.
    ///
    /// # Errors
    ///
    /// Network and server errors.
    pub async fn reject_public(&self, token: &str, reason: &str) -> Result<(), ClientError> {
        let token = path_segment(token, "link token")?;
        let body = RejectRequest { rejected_reason: reason.trim() };
        self.send(self.request(Method::POST, &public_reject_endpoint(token)).json(&body)).await?;
        info!("public signature rejected");
        Ok(())
    }
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, ClientError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClientError::validation(format!("{field} is required")));
    }
    Ok(trimmed)
}
