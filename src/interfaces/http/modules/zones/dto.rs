//! Zone DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{TariffBracket, TariffStructure, Zone};

/// A tariff zone discovered in the NPR dataset
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ZoneDto {
    /// `{area_manager_id}_{fare_calculation_code}`
    pub zone_id: String,
    pub zone_name: String,
    pub area_manager_id: i64,
    pub fare_calculation_code: String,
    /// Dataset rows behind the zone
    pub record_count: usize,
}

impl From<&Zone> for ZoneDto {
    fn from(zone: &Zone) -> Self {
        Self {
            zone_id: zone.id(),
            zone_name: zone.display_name.clone(),
            area_manager_id: zone.key.area_id,
            fare_calculation_code: zone.key.fare_code.clone(),
            record_count: zone.record_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ZoneListResponse {
    /// Most popular first
    pub zones: Vec<ZoneDto>,
    pub total: usize,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ZoneSearchParams {
    /// Part of a zone name, fare code, area id or city
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ZoneSearchResponse {
    pub query: String,
    pub results: Vec<ZoneDto>,
    pub count: usize,
}

/// One duration bracket of a tariff
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TariffBracketDto {
    /// Minutes since the start of parking
    pub start_duration: i64,
    /// 999999 means unbounded
    pub end_duration: i64,
    #[schema(value_type = String, example = "0.75")]
    pub amount: Decimal,
    pub step_size: i64,
    #[schema(value_type = String, example = "0.00")]
    pub cumulative_amount: Decimal,
}

impl From<&TariffBracket> for TariffBracketDto {
    fn from(b: &TariffBracket) -> Self {
        Self {
            start_duration: b.start_duration,
            end_duration: b.end_duration,
            amount: b.amount,
            step_size: b.step_size,
            cumulative_amount: b.cumulative_amount,
        }
    }
}

/// Every bracket of a zone valid on one day
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TariffStructureDto {
    pub zone_id: String,
    pub zone_name: String,
    pub brackets: Vec<TariffBracketDto>,
    /// `YYYYMMDD`
    pub valid_from: String,
    /// `YYYYMMDD`
    pub valid_to: String,
}

impl From<&TariffStructure> for TariffStructureDto {
    fn from(s: &TariffStructure) -> Self {
        Self {
            zone_id: s.zone_id.clone(),
            zone_name: s.zone_name.clone(),
            brackets: s.brackets.iter().map(Into::into).collect(),
            valid_from: s.valid_from.clone(),
            valid_to: s.valid_to.clone(),
        }
    }
}
