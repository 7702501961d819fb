//! Zone REST API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Local;

use super::dto::{TariffStructureDto, ZoneDto, ZoneListResponse, ZoneSearchParams, ZoneSearchResponse};
use crate::application::ParkingService;
use crate::domain::{CalcDate, ZoneKey};
use crate::interfaces::http::common::{api_error, ApiError, ApiResponse};

/// State shared by the zone and calculation handlers
#[derive(Clone)]
pub struct ParkingState {
    pub service: Arc<ParkingService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/zones",
    tag = "Zones",
    responses(
        (status = 200, description = "All zones, most popular first", body = ApiResponse<ZoneListResponse>)
    )
)]
pub async fn list_zones(State(state): State<ParkingState>) -> Json<ApiResponse<ZoneListResponse>> {
    let zones: Vec<ZoneDto> = state
        .service
        .resolver()
        .catalog()
        .all_zones()
        .iter()
        .map(ZoneDto::from)
        .collect();
    let total = zones.len();
    Json(ApiResponse::success(ZoneListResponse { zones, total }))
}

#[utoipa::path(
    get,
    path = "/api/v1/zones/search",
    tag = "Zones",
    params(ZoneSearchParams),
    responses(
        (status = 200, description = "Matching zones", body = ApiResponse<ZoneSearchResponse>),
        (status = 400, description = "Missing query")
    )
)]
pub async fn search_zones(
    State(state): State<ParkingState>,
    Query(params): Query<ZoneSearchParams>,
) -> Result<Json<ApiResponse<ZoneSearchResponse>>, ApiError> {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Query parameter 'q' is required",
        ));
    }

    let results: Vec<ZoneDto> = state
        .service
        .resolver()
        .catalog()
        .search(&query)
        .iter()
        .map(ZoneDto::from)
        .collect();
    let count = results.len();
    Ok(Json(ApiResponse::success(ZoneSearchResponse {
        query,
        results,
        count,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/zones/{zone_id}/tariff",
    tag = "Zones",
    params(("zone_id" = String, Path, description = "Zone id, e.g. 14_TAR01")),
    responses(
        (status = 200, description = "Tariff valid today", body = ApiResponse<TariffStructureDto>),
        (status = 404, description = "Unknown zone or no tariff today")
    )
)]
pub async fn get_zone_tariff(
    State(state): State<ParkingState>,
    Path(zone_id): Path<String>,
) -> Result<Json<ApiResponse<TariffStructureDto>>, ApiError> {
    let not_found = || api_error(StatusCode::NOT_FOUND, format!("Zone {} not found", zone_id));

    let key: ZoneKey = zone_id.parse().map_err(|_| not_found())?;
    let zone = state
        .service
        .resolver()
        .catalog()
        .zone_by_key(&key)
        .ok_or_else(not_found)?;

    let today = CalcDate::from_date(Local::now().date_naive());
    match state.service.engine().tariff_structure(zone, today) {
        Some(structure) => Ok(Json(ApiResponse::success(TariffStructureDto::from(
            &structure,
        )))),
        None => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("No tariff for zone {} on {}", zone_id, today),
        )),
    }
}
