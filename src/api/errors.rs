use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::upstream::UpstreamError;

pub(crate) const LOGIN_PATH: &str = "/login";
pub(crate) const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<String>,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    /// The student already has an attempt for the quiz they tried to open.
    AlreadyAttempted { attempt_id: String },
    PreconditionRequired(String),
    TooManyRequests(&'static str),
    BadGateway(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    /// Maps a failed upstream call onto the gateway's own taxonomy; `missing`
    /// is the message shown when the service answers 404.
    pub(crate) fn from_upstream(err: UpstreamError, missing: &str) -> Self {
        match err {
            UpstreamError::Status { status, message } => match status {
                reqwest::StatusCode::UNAUTHORIZED => Self::Unauthorized("Access Denied"),
                reqwest::StatusCode::FORBIDDEN => Self::Forbidden("Access Denied"),
                reqwest::StatusCode::NOT_FOUND => Self::NotFound(missing.to_string()),
                reqwest::StatusCode::BAD_REQUEST | reqwest::StatusCode::UNPROCESSABLE_ENTITY => {
                    Self::BadRequest(message)
                }
                reqwest::StatusCode::CONFLICT => Self::Conflict(message),
                reqwest::StatusCode::TOO_MANY_REQUESTS => {
                    Self::TooManyRequests("Too many requests, try again later")
                }
                _ => Self::BadGateway(message),
            },
            network @ UpstreamError::Network { .. } => Self::BadGateway(network.to_string()),
            UpstreamError::Decode { action, source } => {
                tracing::error!(error = %source, action = %action, "Undecodable upstream response");
                Self::BadGateway(format!("Unexpected response while trying to {action}"))
            }
        }
    }

    fn parts(self) -> (StatusCode, String, Option<String>) {
        match self {
            ApiError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, message.to_string(), Some(LOGIN_PATH.to_string()))
            }
            ApiError::Forbidden(message) => {
                (StatusCode::FORBIDDEN, message.to_string(), Some(DASHBOARD_PATH.to_string()))
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message, None),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message, None),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message, None),
            ApiError::AlreadyAttempted { attempt_id } => (
                StatusCode::CONFLICT,
                "You have already attempted this quiz".to_string(),
                Some(format!("/quizzes/attempts/{attempt_id}/review")),
            ),
            ApiError::PreconditionRequired(message) => {
                (StatusCode::PRECONDITION_REQUIRED, message, None)
            }
            ApiError::TooManyRequests(message) => {
                (StatusCode::TOO_MANY_REQUESTS, message.to_string(), None)
            }
            ApiError::BadGateway(message) => {
                tracing::warn!(error = %message, "Upstream failure surfaced to caller");
                (StatusCode::BAD_GATEWAY, message, None)
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, message, None)
            }
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        Self::from_upstream(err, "Not found")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail, redirect) = self.parts();
        let mut response =
            (status, Json(ErrorResponse { status: status.as_u16(), detail, redirect }))
                .into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}
