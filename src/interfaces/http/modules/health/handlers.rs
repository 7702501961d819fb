//! Health check handler

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::ParkingService;

#[derive(Clone)]
pub struct HealthState {
    pub service: Arc<ParkingService>,
    /// Rows read from the tariff dataset at startup
    pub dataset_rows: usize,
    pub started_at: Arc<Instant>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `ok`, `degraded` (address registry down) or `unhealthy` (no zones)
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub zones_loaded: usize,
    pub dataset_rows: usize,
    pub cached_resolutions: usize,
    pub address_lookup: ComponentHealth,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealth {
    pub status: String,
    pub latency_ms: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Zones loaded", body = HealthResponse),
        (status = 503, description = "No zones loaded", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let resolver = state.service.resolver();
    let zones_loaded = resolver.catalog().len();

    let lookup_start = Instant::now();
    let address_lookup = if resolver.address_lookup().health_check().await {
        ComponentHealth {
            status: "ok".to_string(),
            latency_ms: Some(lookup_start.elapsed().as_millis() as u64),
        }
    } else {
        ComponentHealth {
            status: "unavailable".to_string(),
            latency_ms: None,
        }
    };

    let (http_status, status) = if zones_loaded == 0 {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    } else if address_lookup.status != "ok" {
        (StatusCode::OK, "degraded")
    } else {
        (StatusCode::OK, "ok")
    };

    (
        http_status,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            zones_loaded,
            dataset_rows: state.dataset_rows,
            cached_resolutions: resolver.cached_entries(),
            address_lookup,
        }),
    )
}
