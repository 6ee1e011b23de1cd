//! Login, registration, logout and identity lookup.
//!
//! A failed login or registration leaves the session exactly as it was, so
//! both can simply be retried.

use crate::api::ApiOutcome;
use crate::context::{AppContext, Outcome, Rejection};
use crate::models::Identity;
use crate::view::Prompt;

pub async fn login(ctx: &mut AppContext, email: &str, password: &str) -> Outcome {
    match ctx.api.login(email, password).await {
        ApiOutcome::Success(credential) => {
            ctx.set_session(
                credential,
                Identity {
                    email: email.to_string(),
                    full_name: None,
                },
            );
            ctx.view.close(Prompt::Login);
            ctx.notifier.success("Login successful!");
            tracing::info!(email, "logged in");
            Outcome::Success
        }
        ApiOutcome::Domain(message) => ctx.domain_error(message, "Login failed"),
        ApiOutcome::Transport(e) => ctx.transport_error(&e),
    }
}

/// Registers an account. Never signs in; opens the login prompt instead.
pub async fn register(ctx: &mut AppContext, full_name: &str, email: &str, password: &str) -> Outcome {
    match ctx.api.register(full_name, email, password).await {
        ApiOutcome::Success(()) => {
            ctx.view.close(Prompt::Register);
            ctx.notifier.success("Registration successful! Please login.");
            ctx.view.open(Prompt::Login);
            Outcome::Success
        }
        ApiOutcome::Domain(message) => ctx.domain_error(message, "Registration failed"),
        ApiOutcome::Transport(e) => ctx.transport_error(&e),
    }
}

/// Drops the credential, the active document and the transcript.
pub fn logout(ctx: &mut AppContext) -> Outcome {
    ctx.clear_session();
    ctx.document = None;
    ctx.transcript.clear();
    ctx.view.reset_chat();
    ctx.notifier.success("Logged out successfully");
    Outcome::Success
}

/// Fetches the signed-in user's profile and attaches it to the session.
pub async fn whoami(ctx: &mut AppContext) -> Outcome {
    if ctx.credential().is_none() {
        return ctx.reject(Rejection::NotAuthenticated);
    }
    match ctx.api.me(ctx.credential()).await {
        ApiOutcome::Success(profile) => {
            ctx.set_identity(Identity {
                email: profile.email,
                full_name: profile.full_name,
            });
            Outcome::Success
        }
        ApiOutcome::Domain(message) => ctx.domain_error(message, "Could not load your profile"),
        ApiOutcome::Transport(e) => ctx.transport_error(&e),
    }
}

pub fn open_login_prompt(ctx: &mut AppContext) {
    ctx.view.open(Prompt::Login);
}

pub fn open_register_prompt(ctx: &mut AppContext) {
    ctx.view.open(Prompt::Register);
}
