use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::schemas::user::Role;
use crate::services::mutations::MutationGuard;
use crate::services::session::{self, Session};
use crate::services::upstream::UpstreamError;

const ACCESS_DENIED: &str = "Access Denied";

pub(crate) struct CurrentSession(pub(crate) Session);
pub(crate) struct CurrentAdmin(pub(crate) Session);
/// Teachers and admins.
pub(crate) struct CurrentTeacher(pub(crate) Session);
pub(crate) struct CurrentStudent(pub(crate) Session);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

fn request_id(parts: &Parts) -> String {
    parts
        .headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let token = bearer_token(parts).ok_or(ApiError::Unauthorized(ACCESS_DENIED))?;
        let request_id = request_id(parts);

        match session::resolve(&app_state, token, &request_id).await {
            Ok(session) => Ok(CurrentSession(session)),
            Err(UpstreamError::Status { status, .. })
                if status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN =>
            {
                Err(ApiError::Unauthorized(ACCESS_DENIED))
            }
            Err(err) => Err(err.into()),
        }
    }
}

async fn session_with_role(
    parts: &mut Parts,
    state: &AppState,
    allowed: &[Role],
) -> Result<Session, ApiError> {
    let CurrentSession(session) = CurrentSession::from_request_parts(parts, state).await?;

    if allowed.contains(&session.role()) {
        Ok(session)
    } else {
        tracing::info!(
            user_id = %session.user_id(),
            role = session.role().as_str(),
            path = %parts.uri.path(),
            "Role not permitted for route"
        );
        Err(ApiError::Forbidden(ACCESS_DENIED))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        session_with_role(parts, state, &[Role::Admin]).await.map(CurrentAdmin)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentTeacher {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        session_with_role(parts, state, &[Role::Teacher, Role::Admin]).await.map(CurrentTeacher)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentStudent {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        session_with_role(parts, state, &[Role::Student]).await.map(CurrentStudent)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ConfirmQuery {
    #[serde(default)]
    pub(crate) confirm: Option<bool>,
}

/// Destructive actions run only when the caller explicitly confirmed them.
pub(crate) fn require_confirmation(query: &ConfirmQuery, thing: &str) -> Result<(), ApiError> {
    if query.confirm.unwrap_or(false) {
        Ok(())
    } else {
        Err(ApiError::PreconditionRequired(format!("Confirmation required to delete {thing}")))
    }
}

/// Claims `key` for the duration of one mutation; a concurrent mutation of
/// the same key is refused before it reaches the service.
pub(crate) fn lock_mutation(state: &AppState, key: String) -> Result<MutationGuard, ApiError> {
    state.mutations().try_acquire(key).ok_or_else(|| {
        ApiError::Conflict("Another change to this item is still in progress".to_string())
    })
}
