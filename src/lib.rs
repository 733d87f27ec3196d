pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod schemas;
pub(crate) mod services;
pub(crate) mod tasks;

#[cfg(test)]
mod test_support;

use crate::core::{config::Settings, redis::RedisHandle, shutdown, state::AppState, telemetry};
use crate::services::upstream::UpstreamClient;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let redis = RedisHandle::new(settings.redis().redis_url());
    if let Err(err) = redis.connect().await {
        tracing::error!(error = %err, "Failed to connect to Redis; continuing without cache");
    } else {
        tracing::info!("Redis connected successfully");
    }

    let upstream = UpstreamClient::from_settings(&settings)?;
    let state = AppState::new(settings, redis.clone(), upstream);

    let (shutdown_tx, shutdown_rx) = shutdown::channel();
    let background = tokio::spawn(tasks::scheduler::run(state.clone(), shutdown_rx));

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        "LearnBridge gateway listening"
    );

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::signal_and_broadcast(shutdown_tx))
        .await;

    if let Err(err) = background.await {
        tracing::error!(error = %err, "Background task ended abnormally");
    }

    redis.disconnect().await;
    tracing::info!("Redis disconnected");

    result?;

    Ok(())
}
