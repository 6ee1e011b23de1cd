//! The client context handed to every handler.
//!
//! [`AppContext`] bundles what the handlers share: the HTTP client, the
//! session store, the active document, the transcript, the view state and
//! the notifier. It is an explicit value rather than global state, so tests
//! build one per case around a mock backend and a [`RecordingNotifier`].
//!
//! [`RecordingNotifier`]: crate::notify::RecordingNotifier

use anyhow::Result;

use crate::api::ApiClient;
use crate::config::Config;
use crate::models::{ActiveDocument, Credential, Identity, Transcript};
use crate::notify::Notifier;
use crate::session::{CredentialStore, FileCredentialStore, MemoryCredentialStore, SessionStore};
use crate::view::{Chrome, ViewState};

/// Outcome of one handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// A precondition failed before anything was sent.
    Rejected(Rejection),
    /// The server answered with a failure; carries the message shown.
    DomainError(String),
    TransportError,
    /// A reply arrived for a transcript that has since been cleared.
    Discarded,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Validation failures. `Display` is the warning shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Please enter a question")]
    EmptyQuestion,
    #[error("Please upload a document first")]
    NoActiveDocument,
    #[error("Please login first to upload documents")]
    NotAuthenticatedForUpload,
    #[error("Please login first")]
    NotAuthenticated,
}

/// Fixed message for every transport failure.
pub const NETWORK_ERROR: &str = "Network error. Please try again.";

pub struct AppContext {
    pub api: ApiClient,
    pub session: SessionStore,
    pub document: Option<ActiveDocument>,
    pub transcript: Transcript,
    pub view: ViewState,
    pub notifier: Box<dyn Notifier>,
}

impl AppContext {
    pub fn new(api: ApiClient, session: SessionStore, notifier: Box<dyn Notifier>) -> Self {
        let mut ctx = Self {
            api,
            session,
            document: None,
            transcript: Transcript::default(),
            view: ViewState::default(),
            notifier,
        };
        ctx.render_chrome();
        ctx
    }

    /// Builds a context from configuration. `ephemeral` keeps the credential
    /// in memory instead of the session file.
    pub fn from_config(config: &Config, notifier: Box<dyn Notifier>, ephemeral: bool) -> Result<Self> {
        let api = ApiClient::new(&config.api)?;
        let storage: Box<dyn CredentialStore> = if ephemeral {
            Box::new(MemoryCredentialStore::new())
        } else {
            Box::new(FileCredentialStore::new(config.session.resolved_path()))
        };
        let session = SessionStore::open(storage);
        Ok(Self::new(api, session, notifier))
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.session.current_credential()
    }

    pub fn render_chrome(&mut self) {
        let session = self.session.session();
        self.view.chrome = Chrome::for_session(session.is_authenticated(), session.identity());
    }

    /// Stores a new session and re-renders the chrome. A persistence failure
    /// keeps the in-memory session and is reported as a warning.
    pub fn set_session(&mut self, credential: Credential, identity: Identity) {
        if let Err(e) = self.session.set_session(credential, identity) {
            tracing::warn!(error = %e, "failed to persist credential");
            self.notifier
                .warning("Signed in, but the session could not be saved for next time.");
        }
        self.render_chrome();
    }

    pub fn set_identity(&mut self, identity: Identity) {
        if self.session.set_identity(identity) {
            self.render_chrome();
        }
    }

    pub fn clear_session(&mut self) {
        if let Err(e) = self.session.clear_session() {
            tracing::warn!(error = %e, "failed to remove persisted credential");
            self.notifier
                .warning("Signed out, but the saved session could not be removed.");
        }
        self.render_chrome();
    }

    /// Reports a rejection as a warning and returns it as the outcome.
    pub fn reject(&self, rejection: Rejection) -> Outcome {
        self.notifier.warning(&rejection.to_string());
        Outcome::Rejected(rejection)
    }

    /// Reports a domain failure, preferring the server's message.
    pub fn domain_error(&self, server: Option<String>, fallback: &str) -> Outcome {
        let message = server.unwrap_or_else(|| fallback.to_string());
        self.notifier.error(&message);
        Outcome::DomainError(message)
    }

    pub fn transport_error(&self, detail: &str) -> Outcome {
        tracing::debug!(detail, "transport error");
        self.notifier.error(NETWORK_ERROR);
        Outcome::TransportError
    }
}
