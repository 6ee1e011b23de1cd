//! Core data models used throughout the client.
//!
//! These types represent the session, the active document, and the chat
//! transcript, plus the request/response bodies exchanged with the backend.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque bearer token issued by the backend. Never validated locally.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Display attributes of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub full_name: Option<String>,
}

impl Identity {
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ if !self.email.is_empty() => &self.email,
            _ => "User",
        }
    }
}

/// Authentication state. An identity can only exist alongside a credential.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated {
        credential: Credential,
        identity: Option<Identity>,
    },
}

impl Session {
    pub fn credential(&self) -> Option<&Credential> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { credential, .. } => Some(credential),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { identity, .. } => identity.as_ref(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }
}

/// Document handle issued by the backend.
///
/// Kept as the raw JSON value (the reference backend uses integers, other
/// deployments use strings) so it is sent back exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(serde_json::Value);

impl DocumentId {
    /// Wraps a JSON value; `null` is not an identifier.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            other => Some(Self(other.clone())),
        }
    }

    /// Parses an identifier typed by a user: integers stay integers.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(n) => Self(serde_json::Value::from(n)),
            Err(_) => Self(serde_json::Value::String(raw.trim().to_string())),
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            serde_json::Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

/// The single document questions are currently asked against.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDocument {
    pub id: DocumentId,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::User => "you",
            Speaker::Assistant => "assistant",
        }
    }
}

/// One message in the transcript.
#[derive(Debug, Clone)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Local>,
}

impl Turn {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            timestamp: Local::now(),
        }
    }
}

/// Append-only list of turns. Clearing starts a new generation so answers
/// to questions asked before the clear can be recognised and dropped.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
    generation: u64,
}

impl Transcript {
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.generation += 1;
    }
}

/// Tag attached to one in-flight question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionTicket {
    pub id: Uuid,
    pub generation: u64,
}

impl QuestionTicket {
    pub fn new(generation: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            generation,
        }
    }
}

// ============ Wire types ============

/// Body of `POST /api/v1/auth/register`.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /api/v1/questions/`.
#[derive(Debug, Clone, Serialize)]
pub struct AskRequest {
    pub question_text: String,
    pub document_id: DocumentId,
    /// Always present and always empty for now.
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// `GET /api/v1/users/me` response fields we display.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// One entry of `GET /api/v1/documents/`.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentSummary {
    pub id: serde_json::Value,
    pub title: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub processing_status: Option<String>,
}

/// One entry of `GET /api/v1/questions/`.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRecord {
    pub question_text: String,
    #[serde(default)]
    pub answer_text: Option<String>,
    pub document_id: serde_json::Value,
}
