use sha2::{Digest, Sha256};

use crate::core::config::UpstreamService;
use crate::core::state::AppState;
use crate::schemas::user::{Role, User, UserBody};
use crate::services::upstream::{Credentials, UpstreamError};

/// The caller of one request: the bearer token it presented and the user the
/// auth service resolved it to. Built once by the guard, then passed by
/// reference into every upstream call the handler makes.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub(crate) token: String,
    pub(crate) user: User,
    pub(crate) request_id: String,
}

impl Session {
    pub(crate) fn credentials(&self) -> Credentials<'_> {
        Credentials { token: &self.token, request_id: &self.request_id }
    }

    pub(crate) fn user_id(&self) -> &str {
        &self.user.id
    }

    pub(crate) fn role(&self) -> Role {
        self.user.role
    }
}

pub(crate) fn cache_key(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("session:{}", hex::encode(digest))
}

/// Resolves `token` to its user, consulting the short-lived session cache
/// first. Errors are the auth service's own; the guard decides which of them
/// mean "not signed in".
pub(crate) async fn resolve(
    state: &AppState,
    token: &str,
    request_id: &str,
) -> Result<Session, UpstreamError> {
    let key = cache_key(token);

    match state.redis().get(&key).await {
        Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
            Ok(user) => {
                return Ok(Session {
                    token: token.to_string(),
                    user,
                    request_id: request_id.to_string(),
                });
            }
            Err(err) => tracing::warn!(error = %err, "Ignoring unreadable cached session"),
        },
        Ok(None) => {}
        Err(err) => tracing::warn!(error = %err, "Session cache lookup failed"),
    }

    let credentials = Credentials { token, request_id };
    let me: UserBody = state
        .upstream()
        .get_json(credentials, UpstreamService::Auth, "/api/auth/me", "verify session")
        .await?;
    let user = me.into_user();

    match serde_json::to_string(&user) {
        Ok(raw) => {
            let ttl = state.settings().listing().session_cache_seconds;
            if let Err(err) = state.redis().set_ex(&key, &raw, ttl).await {
                tracing::warn!(error = %err, "Failed to cache session");
            }
        }
        Err(err) => tracing::warn!(error = %err, "Failed to encode session for cache"),
    }

    Ok(Session { token: token.to_string(), user, request_id: request_id.to_string() })
}
