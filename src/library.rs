//! Read-only views of what the signed-in user already has on the server:
//! uploaded documents and past questions. Neither changes the active
//! document.

use crate::api::ApiOutcome;
use crate::context::{AppContext, Outcome, Rejection};
use crate::models::{DocumentSummary, QuestionRecord};
use crate::view::Prompt;

pub async fn list_documents(ctx: &mut AppContext) -> Result<Vec<DocumentSummary>, Outcome> {
    if ctx.credential().is_none() {
        let outcome = ctx.reject(Rejection::NotAuthenticated);
        ctx.view.open(Prompt::Login);
        return Err(outcome);
    }
    match ctx.api.documents(ctx.credential()).await {
        ApiOutcome::Success(docs) => Ok(docs),
        ApiOutcome::Domain(message) => Err(ctx.domain_error(message, "Could not list documents")),
        ApiOutcome::Transport(e) => Err(ctx.transport_error(&e)),
    }
}

pub async fn question_history(ctx: &mut AppContext) -> Result<Vec<QuestionRecord>, Outcome> {
    if ctx.credential().is_none() {
        let outcome = ctx.reject(Rejection::NotAuthenticated);
        ctx.view.open(Prompt::Login);
        return Err(outcome);
    }
    match ctx.api.questions(ctx.credential()).await {
        ApiOutcome::Success(records) => Ok(records),
        ApiOutcome::Domain(message) => {
            Err(ctx.domain_error(message, "Could not load question history"))
        }
        ApiOutcome::Transport(e) => Err(ctx.transport_error(&e)),
    }
}

/// Formats a document listing as an aligned table.
pub fn format_documents(docs: &[DocumentSummary]) -> String {
    let mut out = format!("{:<10} {:<12} {:<8} TITLE\n", "ID", "STATUS", "TYPE");
    for doc in docs {
        let id = match &doc.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        out.push_str(&format!(
            "{:<10} {:<12} {:<8} {}\n",
            id,
            doc.processing_status.as_deref().unwrap_or("-"),
            doc.file_type.as_deref().unwrap_or("-"),
            doc.title
        ));
    }
    out
}

pub fn format_history(records: &[QuestionRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&format!("[doc {}] Q: {}\n", record.document_id, record.question_text));
        out.push_str(&format!(
            "          A: {}\n",
            record.answer_text.as_deref().unwrap_or("(no answer)")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_table_lists_every_row() {
        let docs: Vec<DocumentSummary> = serde_json::from_value(json!([
            {"id": 1, "title": "report.pdf", "file_type": "pdf", "processing_status": "completed"},
            {"id": "b2", "title": "notes.txt"}
        ]))
        .unwrap();
        let table = format_documents(&docs);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1 "));
        assert!(lines[1].contains("completed"));
        assert!(lines[2].starts_with("b2 "));
        assert!(lines[2].ends_with("notes.txt"));
    }

    #[test]
    fn history_marks_unanswered_questions() {
        let records: Vec<QuestionRecord> = serde_json::from_value(json!([
            {"question_text": "Main topic?", "answer_text": null, "document_id": 4}
        ]))
        .unwrap();
        let text = format_history(&records);
        assert!(text.contains("[doc 4] Q: Main topic?"));
        assert!(text.contains("(no answer)"));
    }
}
