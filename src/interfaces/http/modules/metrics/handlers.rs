//! Prometheus metrics handler
//!
//! `GET /metrics` renders the process-wide `metrics-exporter-prometheus`
//! recorder: HTTP traffic plus `zone_resolutions_total{method}` and
//! `fare_calculations_total{outcome}`.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
}

pub async fn prometheus_metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.handle.render(),
    )
}
