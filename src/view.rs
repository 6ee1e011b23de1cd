//! Presentation state, independent of how it is drawn.
//!
//! Handlers never print. They mutate a [`ViewState`] and emit notifications;
//! a front end (the interactive session in [`crate::repl`], or a test)
//! decides what that looks like.

use crate::models::{Identity, QuestionTicket};

/// Text shown in place of a document name when none is active.
pub const NO_DOCUMENT_LABEL: &str = "No document uploaded";

/// Header area: signed-in greeting or sign-in actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chrome {
    SignedOut,
    SignedIn { display_name: String },
}

impl Chrome {
    pub fn for_session(authenticated: bool, identity: Option<&Identity>) -> Self {
        if !authenticated {
            return Chrome::SignedOut;
        }
        Chrome::SignedIn {
            display_name: identity
                .map(|i| i.display_name().to_string())
                .unwrap_or_else(|| "User".to_string()),
        }
    }
}

/// Modal prompts. At most one is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Login,
    Register,
    Upload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub chrome: Chrome,
    pub open_prompt: Option<Prompt>,
    pub upload_in_progress: bool,
    pub question_input_enabled: bool,
    pub chat_visible: bool,
    pub document_label: String,
    /// Ticket of the question whose "typing" indicator is showing.
    pub pending: Option<QuestionTicket>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            chrome: Chrome::SignedOut,
            open_prompt: None,
            upload_in_progress: false,
            question_input_enabled: false,
            chat_visible: false,
            document_label: NO_DOCUMENT_LABEL.to_string(),
            pending: None,
        }
    }
}

impl ViewState {
    pub fn open(&mut self, prompt: Prompt) {
        self.open_prompt = Some(prompt);
    }

    /// Closes `prompt` if it is the one showing.
    pub fn close(&mut self, prompt: Prompt) {
        if self.open_prompt == Some(prompt) {
            self.open_prompt = None;
        }
    }

    /// Consumes the open prompt, for front ends that render it once.
    pub fn take_prompt(&mut self) -> Option<Prompt> {
        self.open_prompt.take()
    }

    pub fn show_chat(&mut self, document_name: &str) {
        self.document_label = document_name.to_string();
        self.chat_visible = true;
        self.question_input_enabled = true;
    }

    pub fn reset_chat(&mut self) {
        self.chat_visible = false;
        self.question_input_enabled = false;
        self.document_label = NO_DOCUMENT_LABEL.to_string();
        self.pending = None;
    }

    pub fn pending_visible(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_only_affects_matching_prompt() {
        let mut v = ViewState::default();
        v.open(Prompt::Login);
        v.close(Prompt::Upload);
        assert_eq!(v.open_prompt, Some(Prompt::Login));
        v.close(Prompt::Login);
        assert_eq!(v.open_prompt, None);
    }

    #[test]
    fn chrome_greets_by_name() {
        let id = Identity {
            email: "ada@example.com".into(),
            full_name: Some("Ada".into()),
        };
        assert_eq!(
            Chrome::for_session(true, Some(&id)),
            Chrome::SignedIn {
                display_name: "Ada".into()
            }
        );
        assert_eq!(
            Chrome::for_session(true, None),
            Chrome::SignedIn {
                display_name: "User".into()
            }
        );
        assert_eq!(Chrome::for_session(false, Some(&id)), Chrome::SignedOut);
    }

    #[test]
    fn reset_chat_restores_defaults() {
        let mut v = ViewState::default();
        v.show_chat("report.pdf");
        assert!(v.question_input_enabled);
        assert_eq!(v.document_label, "report.pdf");
        v.reset_chat();
        assert!(!v.chat_visible);
        assert!(!v.question_input_enabled);
        assert_eq!(v.document_label, NO_DOCUMENT_LABEL);
    }
}
