use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde_json::Value;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentSession, CurrentTeacher};
use crate::api::validation::{content_type_for, validate_upload};
use crate::core::config::{Settings, UpstreamService};
use crate::core::state::AppState;
use crate::schemas::content::{
    AskRequest, AudienceType, PageMatches, Textbook, TextbookSearchQuery, TextbookSearchResponse,
};
use crate::services::highlight::{find_matches, snippet};

const SNIPPET_RADIUS: usize = 40;
const AI_ASK_WINDOW_SECONDS: u64 = 60;
/// Room for multipart boundaries and the text fields around the file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Mounted directly under the API prefix.
pub(crate) fn router(settings: &Settings) -> Router<AppState> {
    let max_upload_bytes =
        usize::try_from(settings.limits().max_upload_size_mb.saturating_mul(1024 * 1024))
            .unwrap_or(usize::MAX)
            .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route(
            "/content/upload/sbc",
            post(upload_sbc).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/textbooks/:id/search", get(search_textbook))
        .route("/ai/ask", post(ask))
}

struct UploadedFile {
    filename: String,
    bytes: Vec<u8>,
}

async fn upload_sbc(
    CurrentTeacher(session): CurrentTeacher,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let limits = state.settings().limits();
    let max_bytes = limits.max_upload_size_mb.saturating_mul(1024 * 1024);

    let mut file: Option<UploadedFile> = None;
    let mut audience: Option<String> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            let filename = field.file_name().unwrap_or("").to_string();
            let mut bytes = Vec::new();
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|_| ApiError::BadRequest("Failed to read file".to_string()))?
            {
                if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                    return Err(ApiError::BadRequest(format!(
                        "File exceeds the {} MB limit",
                        limits.max_upload_size_mb
                    )));
                }
                bytes.extend_from_slice(&chunk);
            }
            file = Some(UploadedFile { filename, bytes });
        } else if name == "audience_type" {
            let text = field
                .text()
                .await
                .map_err(|_| ApiError::BadRequest("Invalid audience_type".to_string()))?;
            audience = Some(text);
        }
    }

    let file = file.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))?;
    let audience = audience
        .as_deref()
        .and_then(AudienceType::parse)
        .ok_or_else(|| {
            ApiError::BadRequest("audience_type must be one of student, teacher, general".to_string())
        })?;

    let extension = validate_upload(
        &file.filename,
        file.bytes.len(),
        &limits.allowed_upload_extensions,
        limits.max_upload_size_mb,
    )?;

    let size = file.bytes.len();
    let part = Part::bytes(file.bytes)
        .file_name(file.filename.clone())
        .mime_str(content_type_for(&extension))
        .map_err(|e| ApiError::internal(e, "Failed to prepare upload"))?;
    let form = Form::new().part("file", part).text("audience_type", audience.as_str());

    let uploaded: Value = state
        .upstream()
        .post_multipart(
            session.credentials(),
            UpstreamService::Content,
            "/api/content/upload/sbc",
            form,
            "upload file",
        )
        .await?;

    tracing::info!(
        user_id = %session.user_id(),
        filename = %file.filename,
        size_bytes = size,
        audience = audience.as_str(),
        action = "content_upload",
        "Content uploaded"
    );

    Ok((StatusCode::CREATED, Json(uploaded)))
}

async fn search_textbook(
    Path(textbook_id): Path<String>,
    Query(query): Query<TextbookSearchQuery>,
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<TextbookSearchResponse>, ApiError> {
    let needle = query.q.trim();
    if needle.is_empty() {
        return Err(ApiError::BadRequest("Search query must not be empty".to_string()));
    }

    let textbook: Textbook = state
        .upstream()
        .get_json(
            session.credentials(),
            UpstreamService::Content,
            &format!("/api/content/textbooks/{textbook_id}"),
            "fetch textbook",
        )
        .await
        .map_err(|err| ApiError::from_upstream(err, "Textbook not found"))?;

    Ok(Json(search_pages(textbook, needle)))
}

fn search_pages(textbook: Textbook, needle: &str) -> TextbookSearchResponse {
    let pages: Vec<PageMatches> = textbook
        .pages
        .iter()
        .filter_map(|page| {
            let highlights = find_matches(&page.text, needle);
            if highlights.is_empty() {
                return None;
            }
            let snippets =
                highlights.iter().map(|hit| snippet(&page.text, *hit, SNIPPET_RADIUS)).collect();
            Some(PageMatches { page: page.number, highlights, snippets })
        })
        .collect();

    TextbookSearchResponse {
        textbook_id: textbook.id,
        title: textbook.title,
        query: needle.to_string(),
        total_matches: pages.iter().map(|page| page.highlights.len()).sum(),
        pages,
    }
}

async fn ask(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<Value>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let limit = state.settings().limits().ai_ask_rate_limit;
    let key = format!("rl:ai:{}", session.user_id());
    match state.redis().rate_limit(&key, limit, AI_ASK_WINDOW_SECONDS).await {
        Ok(true) => {}
        Ok(false) => {
            return Err(ApiError::TooManyRequests("Too many questions, try again in a minute"));
        }
        Err(err) => tracing::warn!(error = %err, "AI rate limit check failed"),
    }

    let answer: Value = state
        .upstream()
        .send_json(
            Method::POST,
            session.credentials(),
            UpstreamService::Ai,
            "/api/ask",
            &payload,
            "ask the assistant",
        )
        .await?;

    Ok(Json(answer))
}
