//! HTTP client for the document Q&A backend.
//!
//! [`ApiClient`] is the shared request helper: it joins paths onto the
//! configured base URL, attaches the credential as a bearer `Authorization`
//! header when one is present (and omits the header otherwise), and sorts
//! every exchange into an [`ApiOutcome`].
//!
//! # Endpoints
//!
//! | Method | Path | Success body |
//! |--------|------|--------------|
//! | `POST` | `/api/v1/auth/login/access-token` | `{ access_token }` |
//! | `POST` | `/api/v1/auth/register` | any |
//! | `POST` | `/api/v1/documents/upload` | `{ document_id }` |
//! | `POST` | `/api/v1/questions/` | `{ answer_text }` |
//! | `GET`  | `/api/v1/users/me` | `{ email, full_name }` |
//! | `GET`  | `/api/v1/documents/` | `[{ id, title, ... }]` |
//! | `GET`  | `/api/v1/questions/` | `[{ question_text, answer_text, ... }]` |
//! | `GET`  | `/health` | `{ status: "healthy" }` |
//!
//! # Classification
//!
//! - The request failed, or the body is not JSON → [`ApiOutcome::Transport`].
//! - Non-success status, or a success without the expected field →
//!   [`ApiOutcome::Domain`] carrying the server's `detail`/`message`, if any.
//! - Otherwise → [`ApiOutcome::Success`].
//!
//! Nothing is retried.

use anyhow::Result;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::models::{
    AskRequest, Credential, DocumentId, DocumentSummary, QuestionRecord, RegisterRequest,
    UserProfile,
};

pub const LOGIN_PATH: &str = "/api/v1/auth/login/access-token";
pub const REGISTER_PATH: &str = "/api/v1/auth/register";
pub const UPLOAD_PATH: &str = "/api/v1/documents/upload";
pub const ASK_PATH: &str = "/api/v1/questions/";
pub const ME_PATH: &str = "/api/v1/users/me";
pub const DOCUMENTS_PATH: &str = "/api/v1/documents/";
pub const HEALTH_PATH: &str = "/health";

/// Result of one exchange with the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome<T> {
    Success(T),
    /// Well-formed failure. Carries the server-provided message when present.
    Domain(Option<String>),
    /// The exchange itself failed. Carries a description for logs.
    Transport(String),
}

/// A response that arrived and parsed as JSON.
#[derive(Debug)]
struct Reply {
    status: StatusCode,
    body: serde_json::Value,
}

impl Reply {
    /// On success, hand the body to `extract`; a `None` from it is a domain
    /// failure just like a non-success status.
    fn into_outcome<T>(
        self,
        extract: impl FnOnce(&serde_json::Value) -> Option<T>,
    ) -> ApiOutcome<T> {
        if self.status.is_success() {
            if let Some(v) = extract(&self.body) {
                return ApiOutcome::Success(v);
            }
        }
        ApiOutcome::Domain(server_message(&self.body))
    }

    fn into_typed<T: DeserializeOwned>(self) -> ApiOutcome<T> {
        self.into_outcome(|body| serde_json::from_value(body.clone()).ok())
    }
}

/// `detail` when it is a non-empty string, else `message`, else nothing.
pub fn server_message(body: &serde_json::Value) -> Option<String> {
    ["detail", "message"].iter().find_map(|key| {
        body.get(*key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    })
}

fn non_empty_str(body: &serde_json::Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Builds a request, attaching the bearer header only when a credential exists.
    fn request(
        &self,
        method: Method,
        path: &str,
        credential: Option<&Credential>,
    ) -> RequestBuilder {
        tracing::debug!(%method, path, authenticated = credential.is_some(), "request");
        let builder = self.http.request(method, self.url(path));
        match credential {
            Some(c) => builder.bearer_auth(c.as_str()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Reply, String> {
        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "request failed");
                return Err(e.to_string());
            }
        };
        let status = response.status();
        let text = match response.text().await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(%status, error = %e, "failed to read response body");
                return Err(e.to_string());
            }
        };
        match serde_json::from_str(&text) {
            Ok(body) => {
                tracing::debug!(%status, "response");
                Ok(Reply { status, body })
            }
            Err(e) => {
                tracing::warn!(%status, error = %e, "response is not JSON");
                Err(format!("invalid JSON response ({}): {}", status, e))
            }
        }
    }

    async fn exchange<T>(
        &self,
        builder: RequestBuilder,
        extract: impl FnOnce(&serde_json::Value) -> Option<T>,
    ) -> ApiOutcome<T> {
        match self.send(builder).await {
            Ok(reply) => reply.into_outcome(extract),
            Err(e) => ApiOutcome::Transport(e),
        }
    }

    async fn exchange_typed<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiOutcome<T> {
        match self.send(builder).await {
            Ok(reply) => reply.into_typed(),
            Err(e) => ApiOutcome::Transport(e),
        }
    }

    /// Form-encoded credential exchange. Success requires a non-empty `access_token`.
    pub async fn login(&self, email: &str, password: &str) -> ApiOutcome<Credential> {
        let builder = self
            .request(Method::POST, LOGIN_PATH, None)
            .form(&[("username", email), ("password", password)]);
        self.exchange(builder, |body| {
            non_empty_str(body, "access_token").map(Credential::new)
        })
        .await
    }

    pub async fn register(&self, full_name: &str, email: &str, password: &str) -> ApiOutcome<()> {
        let builder = self
            .request(Method::POST, REGISTER_PATH, None)
            .json(&RegisterRequest {
                full_name,
                email,
                password,
            });
        self.exchange(builder, |_| Some(())).await
    }

    /// Multipart upload: `file` part with the raw bytes, `title` = file name.
    pub async fn upload(
        &self,
        credential: Option<&Credential>,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ApiOutcome<DocumentId> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("title", file_name.to_string());
        let builder = self
            .request(Method::POST, UPLOAD_PATH, credential)
            .multipart(form);
        self.exchange(builder, |body| {
            body.get("document_id").and_then(DocumentId::from_json)
        })
        .await
    }

    pub async fn ask(&self, credential: Option<&Credential>, req: &AskRequest) -> ApiOutcome<String> {
        let builder = self.request(Method::POST, ASK_PATH, credential).json(req);
        self.exchange(builder, |body| non_empty_str(body, "answer_text"))
            .await
    }

    pub async fn me(&self, credential: Option<&Credential>) -> ApiOutcome<UserProfile> {
        self.exchange_typed(self.request(Method::GET, ME_PATH, credential))
            .await
    }

    pub async fn documents(&self, credential: Option<&Credential>) -> ApiOutcome<Vec<DocumentSummary>> {
        self.exchange_typed(self.request(Method::GET, DOCUMENTS_PATH, credential))
            .await
    }

    pub async fn questions(&self, credential: Option<&Credential>) -> ApiOutcome<Vec<QuestionRecord>> {
        self.exchange_typed(self.request(Method::GET, ASK_PATH, credential))
            .await
    }

    /// `true` only for a JSON body with `status == "healthy"`.
    pub async fn health(&self) -> ApiOutcome<bool> {
        let builder = self.request(Method::GET, HEALTH_PATH, None);
        match self.send(builder).await {
            Ok(reply) => ApiOutcome::Success(
                reply.body.get("status").and_then(|s| s.as_str()) == Some("healthy"),
            ),
            Err(e) => ApiOutcome::Transport(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(status: u16, body: serde_json::Value) -> Reply {
        Reply {
            status: StatusCode::from_u16(status).unwrap(),
            body,
        }
    }

    #[test]
    fn detail_beats_message() {
        let body = json!({"detail": "Incorrect email or password", "message": "other"});
        assert_eq!(
            server_message(&body).as_deref(),
            Some("Incorrect email or password")
        );
    }

    #[test]
    fn structured_detail_falls_through_to_message() {
        let body = json!({"message": "Validation error", "detail": [{"loc": ["body"]}]});
        assert_eq!(server_message(&body).as_deref(), Some("Validation error"));
    }

    #[test]
    fn no_message_fields() {
        assert_eq!(server_message(&json!({"detail": ""})), None);
        assert_eq!(server_message(&json!([])), None);
    }

    #[test]
    fn success_without_field_is_domain_error() {
        let outcome = reply(200, json!({"token_type": "bearer"}))
            .into_outcome(|b| non_empty_str(b, "access_token"));
        assert_eq!(outcome, ApiOutcome::Domain(None));
    }

    #[test]
    fn failure_status_carries_server_message() {
        let outcome =
            reply(404, json!({"message": "Document not found"})).into_outcome(|_| Some(()));
        assert_eq!(
            outcome,
            ApiOutcome::Domain(Some("Document not found".to_string()))
        );
    }

    #[test]
    fn typed_reply_requires_shape() {
        let ok: ApiOutcome<UserProfile> =
            reply(200, json!({"email": "a@b.c", "full_name": "Ada"})).into_typed();
        assert!(matches!(ok, ApiOutcome::Success(ref p) if p.email == "a@b.c"));

        let bad: ApiOutcome<UserProfile> = reply(200, json!({"nope": 1})).into_typed();
        assert!(matches!(bad, ApiOutcome::Domain(None)));
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = ApiClient::new(&ApiConfig {
            base_url: "http://localhost:8000/".into(),
            timeout_secs: 0,
        })
        .unwrap();
        assert_eq!(client.url(HEALTH_PATH), "http://localhost:8000/health");
    }
}
