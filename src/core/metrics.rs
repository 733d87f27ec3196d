use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::{Settings, UpstreamService};

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_upstream(service: UpstreamService, outcome: &'static str, seconds: f64) {
    metrics::counter!(
        "upstream_requests_total",
        "service" => service.as_str(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("upstream_request_duration_seconds", "service" => service.as_str())
        .record(seconds);
}
