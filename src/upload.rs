//! Document upload.
//!
//! One document is active at a time; a successful upload replaces whatever
//! was active before. Like a question, an upload runs in three steps
//! ([`begin_upload`], [`send`], [`finish_upload`]) so a front end can show
//! progress while the request is in flight. The progress flag and the
//! upload prompt are reset after every attempt, whichever way it ended.

use anyhow::{Context, Result};
use std::path::Path;

use crate::api::ApiOutcome;
use crate::context::{AppContext, Outcome, Rejection};
use crate::models::{ActiveDocument, DocumentId};
use crate::view::Prompt;

/// A file picked for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Reads a file from disk; the name is the final path component.
    pub async fn read(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("not a file path: {}", path.display()))?
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self { name, bytes })
    }
}

/// Checks the upload precondition: a credential must exist. Otherwise warns
/// and opens the login prompt. Front ends call this before reading a file
/// from disk.
pub fn ensure_signed_in(ctx: &mut AppContext) -> Result<(), Outcome> {
    if ctx.credential().is_none() {
        let outcome = ctx.reject(Rejection::NotAuthenticatedForUpload);
        ctx.view.open(Prompt::Login);
        return Err(outcome);
    }
    Ok(())
}

/// Opens the upload prompt, or asks for a login first.
pub fn open_upload_prompt(ctx: &mut AppContext) -> Outcome {
    if let Err(outcome) = ensure_signed_in(ctx) {
        return outcome;
    }
    ctx.view.open(Prompt::Upload);
    Outcome::Success
}

/// An upload that passed its precondition and is showing progress.
#[derive(Debug)]
pub struct PendingUpload {
    pub name: String,
    bytes: Vec<u8>,
}

/// Checks the precondition and raises the progress flag.
pub fn begin_upload(ctx: &mut AppContext, file: UploadFile) -> Result<PendingUpload, Outcome> {
    ensure_signed_in(ctx)?;
    ctx.view.upload_in_progress = true;
    Ok(PendingUpload {
        name: file.name,
        bytes: file.bytes,
    })
}

/// Transmits the file. The bytes are handed to the request, so each
/// pending upload is sent once.
pub async fn send(ctx: &AppContext, pending: &mut PendingUpload) -> ApiOutcome<DocumentId> {
    let bytes = std::mem::take(&mut pending.bytes);
    tracing::debug!(file = %pending.name, size = bytes.len(), "uploading");
    ctx.api.upload(ctx.credential(), &pending.name, bytes).await
}

/// Clears progress and the upload prompt, then applies the result.
pub fn finish_upload(
    ctx: &mut AppContext,
    pending: PendingUpload,
    outcome: ApiOutcome<DocumentId>,
) -> Outcome {
    ctx.view.upload_in_progress = false;
    ctx.view.close(Prompt::Upload);

    let name = pending.name;
    match outcome {
        ApiOutcome::Success(id) => {
            tracing::info!(file = %name, document_id = %id, "document uploaded");
            ctx.view.show_chat(&name);
            ctx.document = Some(ActiveDocument {
                id,
                display_name: name.clone(),
            });
            ctx.notifier.success(&format!(
                "File \"{}\" uploaded successfully! You can now ask questions.",
                name
            ));
            Outcome::Success
        }
        ApiOutcome::Domain(message) => ctx.domain_error(message, "Upload failed"),
        ApiOutcome::Transport(e) => ctx.transport_error(&e),
    }
}

pub async fn upload(ctx: &mut AppContext, file: UploadFile) -> Outcome {
    let mut pending = match begin_upload(ctx, file) {
        Ok(p) => p,
        Err(outcome) => return outcome,
    };
    let outcome = send(ctx, &mut pending).await;
    finish_upload(ctx, pending, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::config::ApiConfig;
    use crate::models::{Credential, Identity};
    use crate::notify::RecordingNotifier;
    use crate::session::{MemoryCredentialStore, SessionStore};
    use tempfile::TempDir;

    #[tokio::test]
    async fn read_uses_final_path_component() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let file = UploadFile::read(&path).await.unwrap();
        assert_eq!(file.name, "report.pdf");
        assert_eq!(file.bytes, b"%PDF-1.4");
    }

    fn signed_out() -> (AppContext, RecordingNotifier) {
        let api = ApiClient::new(&ApiConfig::default()).unwrap();
        let session = SessionStore::open(Box::new(MemoryCredentialStore::new()));
        let rec = RecordingNotifier::new();
        let ctx = AppContext::new(api, session, Box::new(rec.clone()));
        (ctx, rec)
    }

    #[test]
    fn signed_out_upload_is_refused_before_reading() {
        let (mut ctx, rec) = signed_out();
        let err = ensure_signed_in(&mut ctx).unwrap_err();
        assert_eq!(err, Outcome::Rejected(Rejection::NotAuthenticatedForUpload));
        assert_eq!(ctx.view.open_prompt, Some(Prompt::Login));
        assert_eq!(
            rec.last().unwrap().message,
            "Please login first to upload documents"
        );
    }

    #[test]
    fn progress_flag_spans_the_request() {
        let (mut ctx, _) = signed_out();
        ctx.set_session(
            Credential::new("T"),
            Identity {
                email: "ada@example.com".into(),
                full_name: None,
            },
        );
        ctx.view.open(Prompt::Upload);

        let pending = begin_upload(&mut ctx, UploadFile::new("report.pdf", vec![1, 2])).unwrap();
        assert!(ctx.view.upload_in_progress);
        assert_eq!(ctx.view.open_prompt, Some(Prompt::Upload));

        let outcome = finish_upload(&mut ctx, pending, ApiOutcome::Domain(None));
        assert_eq!(outcome, Outcome::DomainError("Upload failed".into()));
        assert!(!ctx.view.upload_in_progress);
        assert_eq!(ctx.view.open_prompt, None);
    }

    #[tokio::test]
    async fn read_missing_file_fails() {
        let tmp = TempDir::new().unwrap();
        let err = UploadFile::read(&tmp.path().join("gone.txt")).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
