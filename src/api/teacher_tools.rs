use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use reqwest::Method;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{lock_mutation, require_confirmation, ConfirmQuery, CurrentTeacher};
use crate::api::pagination::{list_page, ListQuery};
use crate::api::remote::{fetch_collection, snapshots, RemoteCollection};
use crate::core::config::UpstreamService;
use crate::core::state::AppState;
use crate::schemas::document::{Document, DocumentKind, DocumentUpdate};
use crate::schemas::DeletedResponse;
use crate::services::collections::{remove_item, replace_item};
use crate::services::listing::Page;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/:kind", get(list_documents))
        .route("/:kind/:id", get(get_document).put(update_document).delete(delete_document))
}

fn parse_kind(kind: &str) -> Result<DocumentKind, ApiError> {
    DocumentKind::parse(kind)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown document type '{kind}'")))
}

fn document_path(kind: DocumentKind, id: &str) -> String {
    format!("/api/teacher-tools/{}/{id}", kind.segment())
}

async fn list_documents(
    Path(kind): Path<String>,
    Query(params): Query<ListQuery>,
    CurrentTeacher(session): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<Page<Document>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let path = format!("/api/teacher-tools/{}", kind.segment());
    let action = format!("fetch {}", kind.plural_label());
    let remote = RemoteCollection {
        service: UpstreamService::TeacherTools,
        path: &path,
        resource: kind.segment(),
        action: &action,
    };

    let documents: Vec<Document> =
        fetch_collection(&state, &session, remote, params.refresh()).await?;

    Ok(Json(list_page(&documents, &params, state.settings())))
}

async fn get_document(
    Path((kind, id)): Path<(String, String)>,
    CurrentTeacher(session): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<Document>, ApiError> {
    let kind = parse_kind(&kind)?;

    let document: Document = state
        .upstream()
        .get_json(
            session.credentials(),
            UpstreamService::TeacherTools,
            &document_path(kind, &id),
            &format!("fetch {}", kind.label()),
        )
        .await
        .map_err(|err| ApiError::from_upstream(err, &kind.not_found()))?;

    Ok(Json(document))
}

async fn update_document(
    Path((kind, id)): Path<(String, String)>,
    CurrentTeacher(session): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<DocumentUpdate>,
) -> Result<Json<Document>, ApiError> {
    let kind = parse_kind(&kind)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if payload.is_empty() {
        return Err(ApiError::BadRequest("At least one field must be provided".to_string()));
    }

    let _lock = lock_mutation(&state, format!("{}:{id}", kind.segment()))?;

    let document: Document = state
        .upstream()
        .send_json(
            Method::PUT,
            session.credentials(),
            UpstreamService::TeacherTools,
            &document_path(kind, &id),
            &payload,
            &format!("update {}", kind.label()),
        )
        .await
        .map_err(|err| ApiError::from_upstream(err, &kind.not_found()))?;

    snapshots(&state)
        .update(session.user_id(), kind.segment(), |documents: &mut Vec<Document>| {
            replace_item(documents, document.clone());
        })
        .await;

    tracing::info!(
        user_id = %session.user_id(),
        document_id = %document.id,
        kind = kind.segment(),
        action = "document_update",
        "Document updated"
    );

    Ok(Json(document))
}

async fn delete_document(
    Path((kind, id)): Path<(String, String)>,
    Query(confirm): Query<ConfirmQuery>,
    CurrentTeacher(session): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    require_confirmation(&confirm, kind.label())?;

    let _lock = lock_mutation(&state, format!("{}:{id}", kind.segment()))?;

    state
        .upstream()
        .delete(
            session.credentials(),
            UpstreamService::TeacherTools,
            &document_path(kind, &id),
            &format!("delete {}", kind.label()),
        )
        .await
        .map_err(|err| ApiError::from_upstream(err, &kind.not_found()))?;

    snapshots(&state)
        .update(session.user_id(), kind.segment(), |documents: &mut Vec<Document>| {
            remove_item(documents, &id);
        })
        .await;

    tracing::info!(
        user_id = %session.user_id(),
        document_id = %id,
        kind = kind.segment(),
        action = "document_delete",
        "Document deleted"
    );

    Ok(Json(DeletedResponse { id, deleted: true }))
}
