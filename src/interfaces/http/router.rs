//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::ParkingService;

use super::common::ApiResponse;
use super::modules::calculate::{self, CalculateRequest, CalculateResponse};
use super::modules::health::{self, HealthState};
use super::modules::metrics::{http_metrics_middleware, prometheus_metrics, MetricsState};
use super::modules::request_id::request_id_middleware;
use super::modules::zones::{self, ParkingState};

/// State behind every `/api/v1` route and `/health`.
/// Handlers extract their own state via `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<ParkingService>,
    pub dataset_rows: usize,
    pub started_at: Arc<Instant>,
}

impl FromRef<ApiState> for ParkingState {
    fn from_ref(s: &ApiState) -> Self {
        ParkingState {
            service: Arc::clone(&s.service),
        }
    }
}

impl FromRef<ApiState> for HealthState {
    fn from_ref(s: &ApiState) -> Self {
        HealthState {
            service: Arc::clone(&s.service),
            dataset_rows: s.dataset_rows,
            started_at: Arc::clone(&s.started_at),
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        calculate::calculate,
        zones::list_zones,
        zones::search_zones,
        zones::get_zone_tariff,
    ),
    components(
        schemas(
            ApiResponse<String>,
            health::HealthResponse,
            health::ComponentHealth,
            CalculateRequest,
            CalculateResponse,
            calculate::BreakdownLineDto,
            calculate::UnitRateDto,
            calculate::CoordinatesDto,
            calculate::ZoneDetectionDto,
            zones::ZoneDto,
            zones::ZoneListResponse,
            zones::ZoneSearchResponse,
            zones::TariffStructureDto,
            zones::TariffBracketDto,
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Calculate", description = "Parking fee calculation for an address and interval"),
        (name = "Zones", description = "NPR tariff zones and their tariff structures"),
    ),
    info(
        title = "NPR Parking Fee API",
        version = "1.0.0",
        description = "Parking fees for Dutch addresses from the NPR open tariff dataset",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(
    service: Arc<ParkingService>,
    dataset_rows: usize,
    prometheus_handle: PrometheusHandle,
) -> Router {
    let state = ApiState {
        service,
        dataset_rows,
        started_at: Arc::new(Instant::now()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let calculate_routes = Router::new()
        .route("/", post(calculate::calculate))
        .with_state(state.clone());

    let zone_routes = Router::new()
        .route("/", get(zones::list_zones))
        .route("/search", get(zones::search_zones))
        .route("/{zone_id}/tariff", get(zones::get_zone_tariff))
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(prometheus_metrics))
        .with_state(MetricsState {
            handle: prometheus_handle,
        });

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger_routes)
        .route("/health", get(health::health_check))
        .nest("/api/v1/calculate", calculate_routes)
        .nest("/api/v1/zones", zone_routes)
        .with_state(state)
        .merge(metrics_routes)
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ── Tests ──────────────────────────────────────────────────────
