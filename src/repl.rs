//! Interactive chat session (`docqa chat`).
//!
//! Draws an [`AppContext`] in the terminal with rustyline. Plain lines are
//! questions about the active document; lines starting with `/` are
//! commands. When a handler leaves a prompt open (login after registering,
//! login after an unauthenticated upload, upload without a path) the session
//! asks for that prompt's fields right away.
//!
//! | Command | Action |
//! |---------|--------|
//! | `/login` | Sign in |
//! | `/register` | Create an account |
//! | `/logout` | Sign out and clear the conversation |
//! | `/upload [PATH]` | Upload a document and make it active |
//! | `/whoami` | Refresh the signed-in profile |
//! | `/documents` | List uploaded documents |
//! | `/history` | List past questions |
//! | `/health` | Probe the backend |
//! | `/help` | Show commands |
//! | `/quit` | Leave |

use anyhow::Result;
use rustyline::completion::Completer;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{ColorMode, DefaultEditor, Editor, Helper};
use std::borrow::Cow;
use std::path::PathBuf;

use crate::context::AppContext;
use crate::upload::UploadFile;
use crate::view::{Chrome, Prompt};
use crate::{auth, chat, health, library, upload};

const HELP: &str = "\
Type a question to ask about the active document, or a command:
  /login               sign in
  /register            create an account
  /logout              sign out and clear the conversation
  /upload [PATH]       upload a document and make it active
  /whoami              refresh your profile
  /documents           list your uploaded documents
  /history             list your past questions
  /health              check the backend
  /help                show this help
  /quit                leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Login,
    Register,
    Logout,
    Upload(Option<PathBuf>),
    WhoAmI,
    Documents,
    History,
    Health,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Command::Ask(line.to_string());
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((n, a)) => (n, a.trim()),
            None => (rest, ""),
        };
        match name {
            "login" => Command::Login,
            "register" => Command::Register,
            "logout" => Command::Logout,
            "upload" if arg.is_empty() => Command::Upload(None),
            "upload" => Command::Upload(Some(PathBuf::from(arg))),
            "whoami" => Command::WhoAmI,
            "documents" | "docs" => Command::Documents,
            "history" => Command::History,
            "health" => Command::Health,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        }
    }
}

/// Terminal rendering state: what has already been printed.
struct Screen {
    rendered_turns: usize,
    rendered_generation: u64,
    chrome: Option<Chrome>,
}

impl Screen {
    fn new() -> Self {
        Self {
            rendered_turns: 0,
            rendered_generation: 0,
            chrome: None,
        }
    }

    fn render(&mut self, ctx: &AppContext) {
        if self.chrome.as_ref() != Some(&ctx.view.chrome) {
            match &ctx.view.chrome {
                Chrome::SignedIn { display_name } => println!("-- Welcome, {} --", display_name),
                Chrome::SignedOut => println!("-- Not signed in (/login or /register) --"),
            }
            self.chrome = Some(ctx.view.chrome.clone());
        }

        if ctx.transcript.generation() != self.rendered_generation {
            self.rendered_generation = ctx.transcript.generation();
            self.rendered_turns = 0;
        }
        for turn in &ctx.transcript.turns()[self.rendered_turns..] {
            println!(
                "[{}] {}: {}",
                turn.timestamp.format("%H:%M"),
                turn.speaker.label(),
                turn.text
            );
        }
        self.rendered_turns = ctx.transcript.len();
    }
}

fn read_field(rl: &mut DefaultEditor, label: &str) -> Result<Option<String>> {
    match rl.readline(&format!("{}: ", label)) {
        Ok(v) if v.trim().is_empty() => Ok(None),
        Ok(v) => Ok(Some(v.trim().to_string())),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Line helper that draws every typed character as `*`.
struct MaskedInput;

impl Completer for MaskedInput {
    type Candidate = String;
}

impl Hinter for MaskedInput {
    type Hint = String;
}

impl Validator for MaskedInput {}

impl Highlighter for MaskedInput {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned("*".repeat(line.chars().count()))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Helper for MaskedInput {}

/// Reads a secret without echoing it. Blank input or Ctrl-C/Ctrl-D give `None`.
pub fn read_secret(label: &str) -> Result<Option<String>> {
    let mut rl: Editor<MaskedInput, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(MaskedInput));
    rl.set_color_mode(ColorMode::Forced);
    match rl.readline(&format!("{}: ", label)) {
        Ok(v) if v.trim().is_empty() => Ok(None),
        Ok(v) => Ok(Some(v.trim().to_string())),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Runs whatever prompts handlers left open, until none remain.
async fn drive_prompts(ctx: &mut AppContext, rl: &mut DefaultEditor, screen: &mut Screen) -> Result<()> {
    while let Some(prompt) = ctx.view.take_prompt() {
        match prompt {
            Prompt::Login => {
                println!("Login (leave blank to cancel)");
                let Some(email) = read_field(rl, "email")? else { continue };
                let Some(password) = read_secret("password")? else { continue };
                auth::login(ctx, &email, &password).await;
            }
            Prompt::Register => {
                println!("Register (leave blank to cancel)");
                let Some(name) = read_field(rl, "full name")? else { continue };
                let Some(email) = read_field(rl, "email")? else { continue };
                let Some(password) = read_secret("password")? else { continue };
                auth::register(ctx, &name, &email, &password).await;
            }
            Prompt::Upload => {
                let Some(path) = read_field(rl, "file to upload")? else { continue };
                upload_path(ctx, PathBuf::from(path)).await;
            }
        }
        screen.render(ctx);
    }
    Ok(())
}

async fn upload_path(ctx: &mut AppContext, path: PathBuf) {
    if upload::ensure_signed_in(ctx).is_err() {
        return;
    }
    let file = match UploadFile::read(&path).await {
        Ok(file) => file,
        Err(e) => {
            ctx.notifier.error(&format!("{:#}", e));
            return;
        }
    };
    let mut pending = match upload::begin_upload(ctx, file) {
        Ok(p) => p,
        Err(_) => return,
    };
    if ctx.view.upload_in_progress {
        println!("uploading {}...", pending.name);
    }
    let outcome = upload::send(ctx, &mut pending).await;
    upload::finish_upload(ctx, pending, outcome);
}

async fn ask(ctx: &mut AppContext, screen: &mut Screen, question: &str) {
    let pending = match chat::begin_ask(ctx, question) {
        Ok(p) => p,
        Err(_) => return,
    };
    screen.render(ctx);
    if ctx.view.pending_visible() {
        println!("assistant is typing...");
    }
    let outcome = chat::send(ctx, &pending).await;
    chat::finish_ask(ctx, pending, outcome);
}

pub async fn run_chat(ctx: &mut AppContext, health_check: bool) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut screen = Screen::new();

    println!("Document Q&A. Type /help for commands.");
    if health_check {
        health::check_health(ctx).await;
    }
    if ctx.credential().is_some() && ctx.session.identity().is_none() {
        auth::whoami(ctx).await;
    }
    screen.render(ctx);

    loop {
        let label = match &ctx.document {
            Some(doc) => format!("[{}] > ", doc.display_name),
            None => "> ".to_string(),
        };
        let line = match rl.readline(&label) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if !line.trim().is_empty() {
            let _ = rl.add_history_entry(line.as_str());
        }

        match Command::parse(&line) {
            Command::Ask(question) => ask(ctx, &mut screen, &question).await,
            Command::Login => auth::open_login_prompt(ctx),
            Command::Register => auth::open_register_prompt(ctx),
            Command::Logout => {
                auth::logout(ctx);
            }
            Command::Upload(None) => {
                upload::open_upload_prompt(ctx);
            }
            Command::Upload(Some(path)) => upload_path(ctx, path).await,
            Command::WhoAmI => {
                auth::whoami(ctx).await;
            }
            Command::Documents => {
                if let Ok(docs) = library::list_documents(ctx).await {
                    print!("{}", library::format_documents(&docs));
                }
            }
            Command::History => {
                if let Ok(records) = library::question_history(ctx).await {
                    print!("{}", library::format_history(&records));
                }
            }
            Command::Health => {
                if health::check_health(ctx).await {
                    ctx.notifier.info("Backend is healthy");
                }
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
            Command::Unknown(name) => {
                ctx.notifier.warning(&format!("Unknown command: /{} (try /help)", name))
            }
        }

        screen.render(ctx);
        drive_prompts(ctx, &mut rl, &mut screen).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_question() {
        assert_eq!(
            Command::parse("What is the main topic?"),
            Command::Ask("What is the main topic?".into())
        );
    }

    #[test]
    fn upload_takes_optional_path() {
        assert_eq!(Command::parse("/upload"), Command::Upload(None));
        assert_eq!(
            Command::parse("/upload  docs/report.pdf "),
            Command::Upload(Some(PathBuf::from("docs/report.pdf")))
        );
    }

    fn mask(line: &str) -> String {
        MaskedInput.highlight(line, 0).into_owned()
    }

    #[test]
    fn secrets_render_as_stars() {
        assert_eq!(mask("hunter22"), "********");
        assert_eq!(mask(""), "");
        assert!(MaskedInput.highlight_char("x", 1, false));
    }

    #[test]
    fn aliases_and_unknown_commands() {
        assert_eq!(Command::parse("/docs"), Command::Documents);
        assert_eq!(Command::parse("/exit"), Command::Quit);
        assert_eq!(Command::parse("/frobnicate"), Command::Unknown("frobnicate".into()));
    }
}
