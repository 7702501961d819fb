//! Parking fee calculation DTOs

use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::ParkingQuote;
use crate::domain::{CostBreakdownLine, UnitRate};
use crate::interfaces::http::modules::zones::TariffStructureDto;
use crate::shared::time::format_duration_display;

/// Fee request for an address and a parking interval
///
/// The Dutch field names of the NPR API (`huisnummer`, `start_tijd`, ...)
/// are accepted as well.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CalculateRequest {
    /// `1012JS` or `1012 JS`
    #[validate(length(min = 6, max = 7, message = "postcode must be 6 or 7 characters"))]
    pub postcode: String,
    #[serde(alias = "huisnummer", deserialize_with = "house_number")]
    #[validate(range(min = 1, message = "house number must be at least 1"))]
    #[schema(value_type = u32, example = 1)]
    pub house_number: u32,
    #[serde(default, alias = "huisletter")]
    pub house_letter: Option<String>,
    #[serde(default, alias = "huisnummertoevoeging")]
    pub house_number_addition: Option<String>,
    /// `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD HH:MM`
    #[serde(alias = "start_tijd")]
    #[schema(example = "2024-06-01T10:00:00")]
    pub start_time: String,
    #[serde(alias = "eind_tijd")]
    #[schema(example = "2024-06-01T11:30:00")]
    pub end_time: String,
}

/// House numbers arrive as JSON numbers or as strings.
fn house_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid house number '{}'", s))),
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BreakdownLineDto {
    pub bracket_start: i64,
    pub bracket_end: i64,
    #[schema(value_type = String, example = "1.00")]
    pub amount_per_step: Decimal,
    pub step_size_minutes: i64,
}

impl From<&CostBreakdownLine> for BreakdownLineDto {
    fn from(line: &CostBreakdownLine) -> Self {
        Self {
            bracket_start: line.bracket_start,
            bracket_end: line.bracket_end,
            amount_per_step: line.amount_per_step,
            step_size_minutes: line.step_size_minutes,
        }
    }
}

/// Price of the first bracket that was billed
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnitRateDto {
    #[schema(value_type = String, example = "1.00")]
    pub amount: Decimal,
    /// e.g. `15 minuten`
    pub unit: String,
}

impl From<&UnitRate> for UnitRateDto {
    fn from(rate: &UnitRate) -> Self {
        Self {
            amount: rate.amount_per_step,
            unit: rate.unit_label(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CoordinatesDto {
    pub lat: f64,
    pub lng: f64,
}

/// How the zone was picked
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ZoneDetectionDto {
    /// `city_heuristic`, `most_popular`, `fallback_most_popular` or `error_fallback`
    pub method: String,
    pub area_manager_id: i64,
    pub fare_calculation_code: String,
    /// `false` when the address registry gave no answer
    pub address_found: bool,
    pub coordinates: Option<CoordinatesDto>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CalculateResponse {
    pub zone: String,
    pub zone_id: String,
    pub address: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: i64,
    /// e.g. `1 uur en 30 minuten`
    pub duration_display: String,
    #[schema(value_type = String, example = "5.50")]
    pub total_cost: Decimal,
    pub breakdown: Vec<BreakdownLineDto>,
    pub unit_rate: Option<UnitRateDto>,
    pub tariff_structure: Option<TariffStructureDto>,
    pub zone_detection: ZoneDetectionDto,
}

impl CalculateResponse {
    pub fn from_quote(quote: &ParkingQuote, request: &CalculateRequest) -> Self {
        let resolution = &quote.resolution;
        let key = &resolution.resolved.zone_key;

        Self {
            zone: resolution.zone.display_name.clone(),
            zone_id: resolution.zone.id(),
            address: resolution.address.display_line(),
            start_time: request.start_time.clone(),
            end_time: request.end_time.clone(),
            duration_minutes: quote.cost.duration_minutes,
            duration_display: format_duration_display(quote.cost.duration_minutes),
            total_cost: quote.cost.total_cost,
            breakdown: quote.cost.breakdown.iter().map(Into::into).collect(),
            unit_rate: quote.cost.unit_rate.as_ref().map(Into::into),
            tariff_structure: quote.tariff_structure.as_ref().map(Into::into),
            zone_detection: ZoneDetectionDto {
                method: resolution.resolved.detection_method.to_string(),
                area_manager_id: key.area_id,
                fare_calculation_code: key.fare_code.clone(),
                address_found: resolution.address_found,
                coordinates: resolution.address.coordinates.map(|c| CoordinatesDto {
                    lat: c.lat,
                    lng: c.lng,
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_dutch_field_names() {
        let req: CalculateRequest = serde_json::from_value(serde_json::json!({
            "postcode": "1012 JS",
            "huisnummer": "12",
            "huisletter": "A",
            "start_tijd": "2024-06-01T10:00:00",
            "eind_tijd": "2024-06-01T11:30:00"
        }))
        .unwrap();
        assert_eq!(req.house_number, 12);
        assert_eq!(req.house_letter.as_deref(), Some("A"));
        assert!(req.house_number_addition.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn house_number_must_be_numeric() {
        let result: Result<CalculateRequest, _> = serde_json::from_value(serde_json::json!({
            "postcode": "1012JS",
            "house_number": "twelve",
            "start_time": "2024-06-01T10:00:00",
            "end_time": "2024-06-01T11:30:00"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn validation_bounds() {
        let req: CalculateRequest = serde_json::from_value(serde_json::json!({
            "postcode": "1012",
            "house_number": 0,
            "start_time": "2024-06-01T10:00:00",
            "end_time": "2024-06-01T11:30:00"
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("postcode"));
        assert!(fields.contains_key("house_number"));
    }
}
