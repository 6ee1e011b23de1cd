//! # docqa
//!
//! Terminal client for a document question-answering service.
//!
//! The backend does the real work (accounts, document parsing, answering).
//! This crate signs in, uploads one document at a time, and relays
//! question/answer turns, keeping a transcript of the conversation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────────────────┐   ┌──────────┐
//! │  CLI / REPL  │──▶│ handlers: auth upload chat │──▶│ ApiClient │──▶ backend
//! │ (rendering)  │◀──│     AppContext + View      │◀──│ (reqwest) │
//! └──────────────┘   └───────────────────────────┘   └──────────┘
//! ```
//!
//! Handlers take an explicit [`context::AppContext`], mutate its state and
//! view, emit notifications, and return a tagged [`context::Outcome`]. None
//! of them print, so everything below the REPL runs in tests against a mock
//! backend.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Session, document, transcript and wire types |
//! | [`notify`] | User-facing notifications |
//! | [`session`] | Session store and credential persistence |
//! | [`api`] | HTTP request helper and response classification |
//! | [`view`] | Presentation state |
//! | [`context`] | Shared handler context and outcomes |
//! | [`auth`] | Login, registration, logout, profile |
//! | [`upload`] | Document upload |
//! | [`chat`] | Question/answer turns |
//! | [`health`] | Backend connectivity probe |
//! | [`library`] | Document and question listings |
//! | [`repl`] | Interactive terminal session |

pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod context;
pub mod health;
pub mod library;
pub mod models;
pub mod notify;
pub mod repl;
pub mod session;
pub mod upload;
pub mod view;
