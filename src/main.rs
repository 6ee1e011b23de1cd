//! # docqa CLI
//!
//! The `docqa` binary talks to a document Q&A backend. One-shot commands
//! cover a single action each; `docqa chat` opens an interactive session.
//!
//! ## Usage
//!
//! ```bash
//! docqa --config ./config/docqa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docqa health` | Check that the backend is reachable |
//! | `docqa login --email <E>` | Sign in and save the session |
//! | `docqa register --name <N> --email <E>` | Create an account |
//! | `docqa logout` | Forget the saved session |
//! | `docqa whoami` | Show the signed-in profile |
//! | `docqa upload <PATH>` | Upload a document, print its id |
//! | `docqa ask --document <ID> "<question>"` | Ask one question |
//! | `docqa documents` | List uploaded documents |
//! | `docqa history` | List past questions |
//! | `docqa chat` | Interactive session |
//!
//! ## Examples
//!
//! ```bash
//! docqa login --email ada@example.com
//! docqa upload ./report.pdf
//! docqa ask --document 12 "What are the main conclusions?"
//! docqa chat --api-url http://qa.internal:8000
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docqa::context::{AppContext, Outcome};
use docqa::models::{ActiveDocument, DocumentId, Speaker};
use docqa::upload::UploadFile;
use docqa::{auth, chat, config, health, library, repl, upload};

/// docqa — terminal client for a document question-answering service.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means defaults (backend on localhost:8000).
#[derive(Parser)]
#[command(
    name = "docqa",
    about = "docqa — terminal client for a document question-answering service",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docqa.toml")]
    config: PathBuf,

    /// Backend base URL; overrides `api.base_url` and `DOCQA_API_URL`.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Keep the session in memory only; nothing is read from or written to disk.
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Debug logging on stderr (same as `RUST_LOG=docqa=debug`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the backend answers `/health` with `healthy`.
    Health,

    /// Sign in. The session is saved for later commands.
    Login {
        #[arg(long)]
        email: String,
        /// Read interactively when omitted.
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account. Does not sign in.
    Register {
        /// Full name shown in the greeting.
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Read interactively when omitted.
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the saved session.
    Logout,

    /// Show the signed-in user's profile.
    Whoami,

    /// Upload a document and print the id the backend assigned.
    Upload {
        path: PathBuf,
    },

    /// Ask one question about a previously uploaded document.
    Ask {
        /// Document id, as printed by `upload` or listed by `documents`.
        #[arg(long)]
        document: String,
        question: String,
    },

    /// List documents you have uploaded.
    Documents,

    /// List questions you have asked.
    History,

    /// Start an interactive session.
    Chat,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "docqa=debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_password() -> anyhow::Result<String> {
    repl::read_secret("password")?.ok_or_else(|| anyhow::anyhow!("A password is required"))
}

fn exit_on_failure(outcome: Outcome) {
    if !outcome.is_success() {
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_config(&cli.config)?.with_api_override(cli.api_url.clone())?;
    let notifier = cfg.ui.notify_mode().notifier();
    let mut ctx = AppContext::from_config(&cfg, notifier, cli.ephemeral)?;

    match cli.command {
        Commands::Health => {
            if !health::check_health(&ctx).await {
                std::process::exit(1);
            }
            println!("healthy");
        }
        Commands::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => read_password()?,
            };
            exit_on_failure(auth::login(&mut ctx, &email, &password).await);
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            let password = match password {
                Some(p) => p,
                None => read_password()?,
            };
            exit_on_failure(auth::register(&mut ctx, &name, &email, &password).await);
        }
        Commands::Logout => {
            exit_on_failure(auth::logout(&mut ctx));
        }
        Commands::Whoami => {
            exit_on_failure(auth::whoami(&mut ctx).await);
            if let Some(identity) = ctx.session.identity() {
                println!("email:     {}", identity.email);
                println!(
                    "full_name: {}",
                    identity.full_name.as_deref().unwrap_or("(not set)")
                );
            }
        }
        Commands::Upload { path } => {
            if let Err(outcome) = upload::ensure_signed_in(&mut ctx) {
                exit_on_failure(outcome);
            }
            let file = UploadFile::read(&path).await?;
            exit_on_failure(upload::upload(&mut ctx, file).await);
            if let Some(doc) = &ctx.document {
                println!("{}", doc.id);
            }
        }
        Commands::Ask { document, question } => {
            ctx.document = Some(ActiveDocument {
                id: DocumentId::parse(&document),
                display_name: document.clone(),
            });
            let outcome = chat::ask(&mut ctx, &question).await;
            if let Some(turn) = ctx
                .transcript
                .turns()
                .last()
                .filter(|t| t.speaker == Speaker::Assistant)
            {
                println!("{}", turn.text);
            }
            exit_on_failure(outcome);
        }
        Commands::Documents => match library::list_documents(&mut ctx).await {
            Ok(docs) => print!("{}", library::format_documents(&docs)),
            Err(outcome) => exit_on_failure(outcome),
        },
        Commands::History => match library::question_history(&mut ctx).await {
            Ok(records) => print!("{}", library::format_history(&records)),
            Err(outcome) => exit_on_failure(outcome),
        },
        Commands::Chat => {
            repl::run_chat(&mut ctx, cfg.ui.health_check).await?;
        }
    }

    Ok(())
}
