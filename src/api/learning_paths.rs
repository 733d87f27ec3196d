use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use reqwest::Method;
use serde_json::{json, Value};

use crate::api::errors::ApiError;
use crate::api::guards::{lock_mutation, CurrentSession};
use crate::api::pagination::{list_page, ListQuery};
use crate::api::remote::{fetch_collection, snapshots, RemoteCollection};
use crate::core::config::UpstreamService;
use crate::core::state::AppState;
use crate::schemas::learning::{Achievement, LearningPath, Skill};
use crate::services::collections::replace_item;
use crate::services::listing::Page;

const PATHS: RemoteCollection<'static> = RemoteCollection {
    service: UpstreamService::LearningPath,
    path: "/api/learning-paths",
    resource: "learning_paths",
    action: "fetch learning paths",
};

const SKILLS: RemoteCollection<'static> = RemoteCollection {
    service: UpstreamService::LearningPath,
    path: "/api/learning-paths/skills",
    resource: "skills",
    action: "fetch skills",
};

const ACHIEVEMENTS: RemoteCollection<'static> = RemoteCollection {
    service: UpstreamService::LearningPath,
    path: "/api/learning-paths/achievements",
    resource: "achievements",
    action: "fetch achievements",
};

/// Mounted under `/learning-paths`.
pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_paths))
        .route("/skills", get(list_skills))
        .route("/achievements", get(list_achievements))
        .route("/progress", get(progress))
        .route("/recommendations", get(recommendations))
        .route("/:id", get(get_path))
        .route("/:id/enroll", post(enroll))
}

async fn list_paths(
    Query(params): Query<ListQuery>,
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<Page<LearningPath>>, ApiError> {
    let paths: Vec<LearningPath> =
        fetch_collection(&state, &session, PATHS, params.refresh()).await?;
    Ok(Json(list_page(&paths, &params, state.settings())))
}

async fn list_skills(
    Query(params): Query<ListQuery>,
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<Page<Skill>>, ApiError> {
    let skills: Vec<Skill> = fetch_collection(&state, &session, SKILLS, params.refresh()).await?;
    Ok(Json(list_page(&skills, &params, state.settings())))
}

async fn list_achievements(
    Query(params): Query<ListQuery>,
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<Page<Achievement>>, ApiError> {
    let achievements: Vec<Achievement> =
        fetch_collection(&state, &session, ACHIEVEMENTS, params.refresh()).await?;
    Ok(Json(list_page(&achievements, &params, state.settings())))
}

async fn progress(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let progress: Value = state
        .upstream()
        .get_json(
            session.credentials(),
            UpstreamService::LearningPath,
            "/api/learning-paths/progress",
            "fetch learning progress",
        )
        .await?;
    Ok(Json(progress))
}

async fn recommendations(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let recommended: Value = state
        .upstream()
        .get_json(
            session.credentials(),
            UpstreamService::LearningPath,
            "/api/learning-paths/recommendations",
            "fetch recommendations",
        )
        .await?;
    Ok(Json(recommended))
}

async fn get_path(
    Path(path_id): Path<String>,
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<LearningPath>, ApiError> {
    let path: LearningPath = state
        .upstream()
        .get_json(
            session.credentials(),
            UpstreamService::LearningPath,
            &format!("/api/learning-paths/{path_id}"),
            "fetch learning path",
        )
        .await
        .map_err(|err| ApiError::from_upstream(err, "Learning path not found"))?;
    Ok(Json(path))
}

async fn enroll(
    Path(path_id): Path<String>,
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<LearningPath>, ApiError> {
    let _lock = lock_mutation(&state, format!("learning_paths:{}:{path_id}", session.user_id()))?;

    let path: LearningPath = state
        .upstream()
        .send_json(
            Method::POST,
            session.credentials(),
            UpstreamService::LearningPath,
            &format!("/api/learning-paths/{path_id}/enroll"),
            &json!({}),
            "enroll in learning path",
        )
        .await
        .map_err(|err| ApiError::from_upstream(err, "Learning path not found"))?;

    snapshots(&state)
        .update(session.user_id(), PATHS.resource, |paths: &mut Vec<LearningPath>| {
            replace_item(paths, path.clone());
        })
        .await;

    tracing::info!(
        user_id = %session.user_id(),
        learning_path_id = %path.id,
        action = "learning_path_enroll",
        "Enrolled in learning path"
    );

    Ok(Json(path))
}
