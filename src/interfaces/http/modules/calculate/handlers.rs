//! Parking fee calculation handler

use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use super::dto::{CalculateRequest, CalculateResponse};
use crate::application::address_query;
use crate::interfaces::http::common::{api_error, ApiError, ApiResponse, ValidatedJson};
use crate::interfaces::http::modules::zones::ParkingState;
use crate::shared::errors::PricingError;
use crate::shared::time::parse_datetime;

const TIME_FORMAT_HINT: &str = "use YYYY-MM-DDTHH:MM:SS";

fn status_for(error: &PricingError) -> StatusCode {
    match error {
        PricingError::InvalidInterval(_) => StatusCode::BAD_REQUEST,
        PricingError::ZoneNotResolvable(_) | PricingError::NoApplicableTariff { .. } => {
            StatusCode::NOT_FOUND
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/calculate",
    tag = "Calculate",
    request_body = CalculateRequest,
    responses(
        (status = 200, description = "Parking fee", body = ApiResponse<CalculateResponse>),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "No zone or tariff for the address and date")
    )
)]
pub async fn calculate(
    State(state): State<ParkingState>,
    ValidatedJson(req): ValidatedJson<CalculateRequest>,
) -> Result<Json<ApiResponse<CalculateResponse>>, ApiError> {
    let start = parse_datetime(&req.start_time).ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Invalid start_time '{}': {}", req.start_time, TIME_FORMAT_HINT),
        )
    })?;
    let end = parse_datetime(&req.end_time).ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Invalid end_time '{}': {}", req.end_time, TIME_FORMAT_HINT),
        )
    })?;

    info!(
        postcode = %req.postcode,
        house_number = req.house_number,
        %start,
        %end,
        "Calculating parking fee"
    );

    let query = address_query(
        &req.postcode,
        req.house_number.to_string(),
        req.house_letter.clone(),
        req.house_number_addition.clone(),
    );
    match state.service.quote(query, start, end).await {
        Ok(quote) => Ok(Json(ApiResponse::success(CalculateResponse::from_quote(
            &quote, &req,
        )))),
        Err(e) => Err(api_error(status_for(&e), e.to_string())),
    }
}

// ── Tests ──────────────────────────────────────────────────────
