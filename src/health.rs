//! Backend connectivity probe.

use crate::api::ApiOutcome;
use crate::context::AppContext;

pub const UNREACHABLE: &str =
    "Cannot connect to API server. Please ensure the backend is running.";

/// `true` when `/health` reports `healthy`; otherwise warns the user.
pub async fn check_health(ctx: &AppContext) -> bool {
    let healthy = match ctx.api.health().await {
        ApiOutcome::Success(healthy) => healthy,
        ApiOutcome::Domain(_) => false,
        ApiOutcome::Transport(e) => {
            tracing::debug!(error = %e, base_url = ctx.api.base_url(), "health probe failed");
            false
        }
    };
    if !healthy {
        ctx.notifier.warning(UNREACHABLE);
    }
    healthy
}
