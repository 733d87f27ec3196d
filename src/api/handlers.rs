use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::collections::HashMap;

use crate::core::config::UpstreamService;
use crate::core::metrics;
use crate::core::redis::RedisHealth;
use crate::core::state::AppState;
use crate::schemas::{HealthResponse, RootResponse};

pub(crate) async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    let api = state.settings().api();
    let response = RootResponse {
        message: api.project_name.clone(),
        version: api.version.clone(),
        api_prefix: api.prefix.clone(),
    };

    Json(response)
}

/// Redis is optional, so losing it only degrades the gateway; losing the auth
/// service means no request can pass the session guard.
pub(crate) async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut status = "healthy".to_string();
    let mut components = HashMap::new();

    match state.redis().health().await {
        RedisHealth::Healthy => {
            components.insert("redis".to_string(), "healthy".to_string());
        }
        RedisHealth::Disconnected => {
            components.insert("redis".to_string(), "disconnected".to_string());
        }
        RedisHealth::Unhealthy(error) => {
            components.insert("redis".to_string(), format!("unhealthy: {error}"));
            status = "degraded".to_string();
        }
    }

    match state.upstream().probe(UpstreamService::Auth).await {
        Ok(code) if !code.is_server_error() => {
            components.insert("auth_service".to_string(), "reachable".to_string());
        }
        Ok(code) => {
            components.insert("auth_service".to_string(), format!("unhealthy: status {code}"));
            status = "degraded".to_string();
        }
        Err(err) => {
            tracing::warn!(error = %err, "Auth service health probe failed");
            components.insert("auth_service".to_string(), "unreachable".to_string());
            status = "degraded".to_string();
        }
    }

    Json(HealthResponse { service: "learnbridge-gateway".to_string(), status, components })
}

pub(crate) async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    if !state.settings().telemetry().prometheus_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    match metrics::render() {
        Some(body) => ([(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
            .into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
