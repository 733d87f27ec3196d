use std::time::{Duration, Instant};

use anyhow::Context;
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::{Settings, UpstreamService, UpstreamSettings};
use crate::core::metrics;

/// Bearer credentials of the caller, forwarded verbatim to every service.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Credentials<'a> {
    pub(crate) token: &'a str,
    pub(crate) request_id: &'a str,
}

#[derive(Debug, Error)]
pub(crate) enum UpstreamError {
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    #[error("Network error while trying to {action}")]
    Network {
        action: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Unexpected response while trying to {action}")]
    Decode {
        action: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Thin JSON client over the remote LearnBridge services. No retries: every
/// failure is reported once and left to the caller.
#[derive(Debug, Clone)]
pub(crate) struct UpstreamClient {
    client: Client,
    settings: UpstreamSettings,
}

impl UpstreamClient {
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(settings.upstream().timeout_seconds))
            .build()
            .context("Failed to build upstream HTTP client")?;

        Ok(Self { client, settings: settings.upstream().clone() })
    }

    pub(crate) fn url(&self, service: UpstreamService, path: &str) -> String {
        format!("{}{}", self.settings.base_url(service), path)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        auth: Credentials<'_>,
        service: UpstreamService,
        path: &str,
        action: &str,
    ) -> Result<T, UpstreamError> {
        let request = self.request(Method::GET, auth, service, path);
        let response = self.execute(request, service, path, action).await?;
        decode(response, action).await
    }

    pub(crate) async fn send_json<B, T>(
        &self,
        method: Method,
        auth: Credentials<'_>,
        service: UpstreamService,
        path: &str,
        body: &B,
        action: &str,
    ) -> Result<T, UpstreamError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(method, auth, service, path).json(body);
        let response = self.execute(request, service, path, action).await?;
        decode(response, action).await
    }

    pub(crate) async fn delete(
        &self,
        auth: Credentials<'_>,
        service: UpstreamService,
        path: &str,
        action: &str,
    ) -> Result<(), UpstreamError> {
        let request = self.request(Method::DELETE, auth, service, path);
        self.execute(request, service, path, action).await?;
        Ok(())
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        auth: Credentials<'_>,
        service: UpstreamService,
        path: &str,
        form: Form,
        action: &str,
    ) -> Result<T, UpstreamError> {
        let request = self.request(Method::POST, auth, service, path).multipart(form);
        let response = self.execute(request, service, path, action).await?;
        decode(response, action).await
    }

    /// Reachability check for health reporting; any HTTP answer counts.
    pub(crate) async fn probe(&self, service: UpstreamService) -> Result<StatusCode, reqwest::Error> {
        let response = self.client.get(self.url(service, "/health")).send().await?;
        Ok(response.status())
    }

    fn request(
        &self,
        method: Method,
        auth: Credentials<'_>,
        service: UpstreamService,
        path: &str,
    ) -> RequestBuilder {
        self.client
            .request(method, self.url(service, path))
            .bearer_auth(auth.token)
            .header("x-request-id", auth.request_id)
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        service: UpstreamService,
        path: &str,
        action: &str,
    ) -> Result<Response, UpstreamError> {
        let timer = Instant::now();
        let result = request.send().await;
        let elapsed = timer.elapsed().as_secs_f64();

        let response = match result {
            Ok(response) => response,
            Err(source) => {
                metrics::record_upstream(service, "network_error", elapsed);
                tracing::warn!(
                    service = service.as_str(),
                    path,
                    error = %source,
                    "Upstream request failed"
                );
                return Err(UpstreamError::Network { action: action.to_string(), source });
            }
        };

        let status = response.status();
        if status.is_success() {
            metrics::record_upstream(service, "ok", elapsed);
            return Ok(response);
        }

        metrics::record_upstream(service, "error_status", elapsed);
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body, action, status);
        tracing::warn!(
            service = service.as_str(),
            path,
            status = status.as_u16(),
            error = %message,
            "Upstream returned an error status"
        );

        Err(UpstreamError::Status { status, message })
    }
}

async fn decode<T: DeserializeOwned>(response: Response, action: &str) -> Result<T, UpstreamError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|source| UpstreamError::Network { action: action.to_string(), source })?;

    let payload: &[u8] =
        if bytes.iter().all(u8::is_ascii_whitespace) { b"null".as_slice() } else { &bytes[..] };
    serde_json::from_slice(payload)
        .map_err(|source| UpstreamError::Decode { action: action.to_string(), source })
}

/// Prefers the service's own `{error}` message, falling back to a generic
/// "Failed to <action> (status N)".
pub(crate) fn error_message(body: &str, action: &str, status: StatusCode) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error.or(parsed.message))
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("Failed to {action} (status {})", status.as_u16()))
}
