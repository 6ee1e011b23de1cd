//! Asking questions about the active document.
//!
//! One question moves `Idle → Sent → Answered | Errored`. The steps are
//! exposed separately so a front end can draw between them:
//!
//! 1. [`begin_ask`] checks preconditions, appends the user turn and shows
//!    the typing indicator.
//! 2. [`send`] performs the request.
//! 3. [`finish_ask`] hides the indicator and appends the assistant turn.
//!
//! [`ask`] runs all three.
//!
//! Each question carries a [`QuestionTicket`]. A newer question takes over
//! the indicator, and an answer only hides the indicator it owns. Answers
//! that arrive after the transcript was cleared are dropped.

use crate::api::ApiOutcome;
use crate::context::{AppContext, Outcome, Rejection, NETWORK_ERROR};
use crate::models::{AskRequest, QuestionTicket, Speaker, Turn};

/// Fallback when the backend answers without an answer or a message.
pub const NO_ANSWER: &str = "Sorry, I could not get an answer from the backend.";

/// A question that has been recorded and is waiting for its answer.
#[derive(Debug, Clone)]
pub struct PendingQuestion {
    pub ticket: QuestionTicket,
    pub request: AskRequest,
}

pub fn begin_ask(ctx: &mut AppContext, question: &str) -> Result<PendingQuestion, Outcome> {
    let question = question.trim();
    if question.is_empty() {
        return Err(ctx.reject(Rejection::EmptyQuestion));
    }
    let document_id = match &ctx.document {
        Some(doc) => doc.id.clone(),
        None => return Err(ctx.reject(Rejection::NoActiveDocument)),
    };

    ctx.transcript.push(Turn::new(Speaker::User, question));

    let ticket = QuestionTicket::new(ctx.transcript.generation());
    ctx.view.pending = Some(ticket);

    Ok(PendingQuestion {
        ticket,
        request: AskRequest {
            question_text: question.to_string(),
            document_id,
            metadata: serde_json::Map::new(),
        },
    })
}

pub async fn send(ctx: &AppContext, pending: &PendingQuestion) -> ApiOutcome<String> {
    ctx.api.ask(ctx.credential(), &pending.request).await
}

pub fn finish_ask(
    ctx: &mut AppContext,
    pending: PendingQuestion,
    outcome: ApiOutcome<String>,
) -> Outcome {
    if ctx.view.pending == Some(pending.ticket) {
        ctx.view.pending = None;
    }

    if pending.ticket.generation != ctx.transcript.generation() {
        tracing::debug!(ticket = %pending.ticket.id, "dropping answer for a cleared transcript");
        return Outcome::Discarded;
    }

    match outcome {
        ApiOutcome::Success(answer) => {
            ctx.transcript.push(Turn::new(Speaker::Assistant, answer));
            Outcome::Success
        }
        ApiOutcome::Domain(message) => {
            let text = message.unwrap_or_else(|| NO_ANSWER.to_string());
            ctx.transcript.push(Turn::new(Speaker::Assistant, text.clone()));
            Outcome::DomainError(text)
        }
        ApiOutcome::Transport(e) => {
            tracing::debug!(error = %e, "question failed");
            ctx.transcript.push(Turn::new(Speaker::Assistant, NETWORK_ERROR));
            Outcome::TransportError
        }
    }
}

pub async fn ask(ctx: &mut AppContext, question: &str) -> Outcome {
    let pending = match begin_ask(ctx, question) {
        Ok(p) => p,
        Err(outcome) => return outcome,
    };
    let outcome = send(ctx, &pending).await;
    finish_ask(ctx, pending, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::config::ApiConfig;
    use crate::models::{ActiveDocument, Credential, DocumentId, Identity};
    use crate::notify::{Level, RecordingNotifier};
    use crate::session::{MemoryCredentialStore, SessionStore};

    fn context() -> (AppContext, RecordingNotifier) {
        let api = ApiClient::new(&ApiConfig::default()).unwrap();
        let session = SessionStore::open(Box::new(MemoryCredentialStore::new()));
        let rec = RecordingNotifier::new();
        let mut ctx = AppContext::new(api, session, Box::new(rec.clone()));
        ctx.set_session(
            Credential::new("T"),
            Identity {
                email: "ada@example.com".into(),
                full_name: None,
            },
        );
        (ctx, rec)
    }

    fn with_document(ctx: &mut AppContext) {
        ctx.document = Some(ActiveDocument {
            id: DocumentId::parse("7"),
            display_name: "report.pdf".into(),
        });
    }

    #[test]
    fn blank_questions_are_rejected_without_turns() {
        let (mut ctx, rec) = context();
        with_document(&mut ctx);
        for q in ["", "   ", "\t\n"] {
            let err = begin_ask(&mut ctx, q).unwrap_err();
            assert_eq!(err, Outcome::Rejected(Rejection::EmptyQuestion));
        }
        assert!(ctx.transcript.is_empty());
        assert!(ctx.view.pending.is_none());
        assert!(rec
            .notifications()
            .iter()
            .filter(|n| n.level == Level::Warning)
            .all(|n| n.message == "Please enter a question"));
    }

    #[test]
    fn empty_check_runs_before_document_check() {
        let (mut ctx, rec) = context();
        let err = begin_ask(&mut ctx, " ").unwrap_err();
        assert_eq!(err, Outcome::Rejected(Rejection::EmptyQuestion));
        let err = begin_ask(&mut ctx, "What is this?").unwrap_err();
        assert_eq!(err, Outcome::Rejected(Rejection::NoActiveDocument));
        assert_eq!(rec.last().unwrap().message, "Please upload a document first");
        assert!(ctx.transcript.is_empty());
    }

    #[test]
    fn begin_records_trimmed_question_and_indicator() {
        let (mut ctx, _) = context();
        with_document(&mut ctx);
        let pending = begin_ask(&mut ctx, "  What is this?  ").unwrap();
        assert_eq!(pending.request.question_text, "What is this?");
        assert!(pending.request.metadata.is_empty());
        assert_eq!(ctx.view.pending, Some(pending.ticket));
        assert_eq!(ctx.transcript.len(), 1);
        assert_eq!(ctx.transcript.turns()[0].speaker, Speaker::User);
    }

    #[test]
    fn newer_question_owns_the_indicator() {
        let (mut ctx, _) = context();
        with_document(&mut ctx);
        let first = begin_ask(&mut ctx, "one").unwrap();
        let second = begin_ask(&mut ctx, "two").unwrap();

        finish_ask(&mut ctx, first, ApiOutcome::Success("1".into()));
        assert_eq!(ctx.view.pending, Some(second.ticket));

        finish_ask(&mut ctx, second, ApiOutcome::Success("2".into()));
        assert!(ctx.view.pending.is_none());
        let texts: Vec<&str> = ctx.transcript.turns().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "1", "2"]);
    }

    #[test]
    fn answers_after_clear_are_dropped() {
        let (mut ctx, _) = context();
        with_document(&mut ctx);
        let pending = begin_ask(&mut ctx, "still there?").unwrap();
        ctx.transcript.clear();
        ctx.view.reset_chat();

        let outcome = finish_ask(&mut ctx, pending, ApiOutcome::Success("late".into()));
        assert_eq!(outcome, Outcome::Discarded);
        assert!(ctx.transcript.is_empty());
    }

    #[test]
    fn domain_failure_without_message_uses_fallback() {
        let (mut ctx, _) = context();
        with_document(&mut ctx);
        let pending = begin_ask(&mut ctx, "why?").unwrap();
        let outcome = finish_ask(&mut ctx, pending, ApiOutcome::Domain(None));
        assert_eq!(outcome, Outcome::DomainError(NO_ANSWER.to_string()));
        assert_eq!(ctx.transcript.turns()[1].text, NO_ANSWER);
        assert_eq!(ctx.transcript.turns()[1].speaker, Speaker::Assistant);
    }

    #[test]
    fn transport_failure_appends_network_error_turn() {
        let (mut ctx, _) = context();
        with_document(&mut ctx);
        let pending = begin_ask(&mut ctx, "hello?").unwrap();
        let outcome = finish_ask(&mut ctx, pending, ApiOutcome::Transport("refused".into()));
        assert_eq!(outcome, Outcome::TransportError);
        assert!(ctx.view.pending.is_none());
        assert_eq!(ctx.transcript.turns()[1].text, NETWORK_ERROR);
    }
}
