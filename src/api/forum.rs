use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use reqwest::Method;
use serde_json::Value;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{lock_mutation, require_confirmation, ConfirmQuery, CurrentSession};
use crate::api::pagination::{list_page, ListQuery};
use crate::api::remote::{fetch_collection, snapshots, RemoteCollection};
use crate::core::config::UpstreamService;
use crate::core::state::AppState;
use crate::schemas::forum::{
    sort_threads, ForumCategory, ForumThread, PostCreate, ReportCreate, ThreadCreate, ThreadDetail,
};
use crate::schemas::DeletedResponse;
use crate::services::collections::{insert_item, remove_item};
use crate::services::listing::Page;
use crate::services::upstream::UpstreamError;

const CATEGORIES: RemoteCollection<'static> = RemoteCollection {
    service: UpstreamService::Forum,
    path: "/api/forum/categories",
    resource: "forum_categories",
    action: "fetch forum categories",
};

const THREADS: RemoteCollection<'static> = RemoteCollection {
    service: UpstreamService::Forum,
    path: "/api/forum/threads",
    resource: "forum_threads",
    action: "fetch forum threads",
};

/// Mounted under `/forum`.
pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/threads", get(list_threads).post(create_thread))
        .route("/threads/:id", get(get_thread).delete(delete_thread))
        .route("/threads/:id/posts", post(create_post))
        .route("/posts/:id/report", post(report_post))
}

async fn list_categories(
    Query(params): Query<ListQuery>,
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<Vec<ForumCategory>>, ApiError> {
    let categories: Vec<ForumCategory> =
        fetch_collection(&state, &session, CATEGORIES, params.refresh()).await?;
    Ok(Json(categories))
}

async fn list_threads(
    Query(params): Query<ListQuery>,
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<Page<ForumThread>>, ApiError> {
    let mut threads: Vec<ForumThread> =
        fetch_collection(&state, &session, THREADS, params.refresh()).await?;
    sort_threads(&mut threads);
    Ok(Json(list_page(&threads, &params, state.settings())))
}

async fn get_thread(
    Path(thread_id): Path<String>,
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<ThreadDetail>, ApiError> {
    let detail: ThreadDetail = state
        .upstream()
        .get_json(
            session.credentials(),
            UpstreamService::Forum,
            &format!("/api/forum/threads/{thread_id}"),
            "fetch thread",
        )
        .await
        .map_err(|err| ApiError::from_upstream(err, "Thread not found"))?;
    Ok(Json(detail))
}

async fn create_thread(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(payload): Json<ThreadCreate>,
) -> Result<(StatusCode, Json<ForumThread>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let _lock = lock_mutation(&state, format!("forum_threads:new:{}", session.user_id()))?;

    let thread: ForumThread = state
        .upstream()
        .send_json(
            Method::POST,
            session.credentials(),
            UpstreamService::Forum,
            THREADS.path,
            &payload,
            "create thread",
        )
        .await
        .map_err(|err| ApiError::from_upstream(err, "Forum category not found"))?;

    snapshots(&state)
        .update(session.user_id(), THREADS.resource, |threads: &mut Vec<ForumThread>| {
            insert_item(threads, thread.clone());
        })
        .await;

    tracing::info!(
        user_id = %session.user_id(),
        thread_id = %thread.id,
        action = "forum_thread_create",
        "Forum thread created"
    );

    Ok((StatusCode::CREATED, Json(thread)))
}

async fn create_post(
    Path(thread_id): Path<String>,
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(payload): Json<PostCreate>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let _lock =
        lock_mutation(&state, format!("forum_threads:{thread_id}:reply:{}", session.user_id()))?;

    let post: Value = state
        .upstream()
        .send_json(
            Method::POST,
            session.credentials(),
            UpstreamService::Forum,
            &format!("/api/forum/threads/{thread_id}/posts"),
            &payload,
            "reply to thread",
        )
        .await
        .map_err(|err| match err {
            // the forum answers 403 for replies to locked threads
            UpstreamError::Status { status, message } if status == reqwest::StatusCode::FORBIDDEN => {
                ApiError::Conflict(message)
            }
            other => ApiError::from_upstream(other, "Thread not found"),
        })?;

    // reply counts changed
    snapshots(&state).invalidate(session.user_id(), THREADS.resource).await;

    Ok((StatusCode::CREATED, Json(post)))
}

async fn report_post(
    Path(post_id): Path<String>,
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(payload): Json<ReportCreate>,
) -> Result<Json<Value>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let report: Value = state
        .upstream()
        .send_json(
            Method::POST,
            session.credentials(),
            UpstreamService::Forum,
            &format!("/api/forum/posts/{post_id}/report"),
            &payload,
            "report post",
        )
        .await
        .map_err(|err| ApiError::from_upstream(err, "Post not found"))?;

    tracing::info!(
        user_id = %session.user_id(),
        post_id = %post_id,
        action = "forum_post_report",
        "Forum post reported"
    );

    Ok(Json(report))
}

async fn delete_thread(
    Path(thread_id): Path<String>,
    Query(confirm): Query<ConfirmQuery>,
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<DeletedResponse>, ApiError> {
    require_confirmation(&confirm, "thread")?;

    let _lock = lock_mutation(&state, format!("forum_threads:{thread_id}"))?;

    state
        .upstream()
        .delete(
            session.credentials(),
            UpstreamService::Forum,
            &format!("/api/forum/threads/{thread_id}"),
            "delete thread",
        )
        .await
        .map_err(|err| ApiError::from_upstream(err, "Thread not found"))?;

    snapshots(&state)
        .update(session.user_id(), THREADS.resource, |threads: &mut Vec<ForumThread>| {
            remove_item(threads, &thread_id);
        })
        .await;

    tracing::info!(
        user_id = %session.user_id(),
        thread_id = %thread_id,
        action = "forum_thread_delete",
        "Forum thread deleted"
    );

    Ok(Json(DeletedResponse { id: thread_id, deleted: true }))
}
