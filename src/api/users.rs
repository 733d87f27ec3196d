use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use reqwest::Method;

use crate::api::errors::ApiError;
use crate::api::guards::{lock_mutation, CurrentAdmin, CurrentSession};
use crate::api::pagination::{list_page, ListQuery};
use crate::api::remote::{fetch_collection, snapshots, RemoteCollection};
use crate::core::config::UpstreamService;
use crate::core::state::AppState;
use crate::schemas::user::{RoleUpdate, User, UserBody};
use crate::services::collections::replace_item;
use crate::services::listing::Page;
use crate::services::presence::PresenceSnapshot;

const USERS: RemoteCollection<'static> = RemoteCollection {
    service: UpstreamService::Auth,
    path: "/api/users",
    resource: "users",
    action: "fetch users",
};

/// Mounted under `/admin/users`.
pub(crate) fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/online", get(online_users))
        .route("/:user_id", get(get_user))
        .route("/:user_id/role", patch(update_role))
}

/// Mounted under `/users`.
pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

async fn me(CurrentSession(session): CurrentSession) -> Json<User> {
    Json(session.user)
}

async fn list_users(
    Query(params): Query<ListQuery>,
    CurrentAdmin(session): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Page<User>>, ApiError> {
    let mut users: Vec<User> = fetch_collection(&state, &session, USERS, params.refresh()).await?;

    let presence = state.presence().snapshot().await;
    apply_presence(&mut users, &presence);

    Ok(Json(list_page(&users, &params, state.settings())))
}

/// Once the presence task has reported, its view of who is online wins over
/// the flag stored with the user.
fn apply_presence(users: &mut [User], presence: &PresenceSnapshot) {
    if presence.refreshed_at.is_none() {
        return;
    }
    for user in users.iter_mut() {
        user.is_online = presence.is_online(&user.id);
    }
}

async fn get_user(
    Path(user_id): Path<String>,
    CurrentAdmin(session): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<User>, ApiError> {
    let body: UserBody = state
        .upstream()
        .get_json(
            session.credentials(),
            UpstreamService::Auth,
            &format!("/api/users/{user_id}"),
            "fetch user",
        )
        .await
        .map_err(|err| ApiError::from_upstream(err, "User not found"))?;

    Ok(Json(body.into_user()))
}

async fn update_role(
    Path(user_id): Path<String>,
    CurrentAdmin(session): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<RoleUpdate>,
) -> Result<Json<User>, ApiError> {
    if user_id == session.user_id() {
        return Err(ApiError::BadRequest("You cannot change your own role".to_string()));
    }

    let _lock = lock_mutation(&state, format!("users:{user_id}"))?;

    let body: UserBody = state
        .upstream()
        .send_json(
            Method::PUT,
            session.credentials(),
            UpstreamService::Auth,
            &format!("/api/users/{user_id}/role"),
            &payload,
            "update user role",
        )
        .await
        .map_err(|err| ApiError::from_upstream(err, "User not found"))?;
    let user = body.into_user();

    snapshots(&state)
        .update(session.user_id(), USERS.resource, |users: &mut Vec<User>| {
            replace_item(users, user.clone());
        })
        .await;

    tracing::info!(
        admin_id = %session.user_id(),
        user_id = %user.id,
        role = user.role.as_str(),
        action = "user_role_update",
        "Admin changed user role"
    );

    Ok(Json(user))
}

async fn online_users(
    CurrentAdmin(_session): CurrentAdmin,
    State(state): State<AppState>,
) -> Json<PresenceSnapshot> {
    Json(state.presence().snapshot().await)
}
