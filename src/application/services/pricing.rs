//! Parking quotes: zone resolution followed by fare computation

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::domain::{AddressQuery, CalcDate, CostCalculation, TariffStructure};
use crate::shared::errors::PricingError;
use crate::shared::time::duration_minutes;

use super::fare::FareEngine;
use super::resolver::{AddressResolution, ZoneResolver};

/// Everything known about one fee calculation.
#[derive(Debug, Clone)]
pub struct ParkingQuote {
    pub resolution: AddressResolution,
    pub cost: CostCalculation,
    pub tariff_structure: Option<TariffStructure>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Combines the resolver and the fare engine into one operation.
pub struct ParkingService {
    resolver: Arc<ZoneResolver>,
    engine: Arc<FareEngine>,
}

impl ParkingService {
    pub fn new(resolver: Arc<ZoneResolver>, engine: Arc<FareEngine>) -> Self {
        Self { resolver, engine }
    }

    pub fn resolver(&self) -> &ZoneResolver {
        &self.resolver
    }

    pub fn engine(&self) -> &FareEngine {
        &self.engine
    }

    /// Fee for parking at `query` between `start` and `end`.
    pub async fn quote(
        &self,
        query: AddressQuery,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<ParkingQuote, PricingError> {
        let result = self.try_quote(query, start, end).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(PricingError::InvalidInterval(_)) => "invalid_interval",
            Err(PricingError::ZoneNotResolvable(_)) => "no_zone",
            Err(PricingError::NoApplicableTariff { .. }) => "no_tariff",
        };
        metrics::counter!("fare_calculations_total", "outcome" => outcome).increment(1);
        result
    }

    async fn try_quote(
        &self,
        query: AddressQuery,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<ParkingQuote, PricingError> {
        if end <= start {
            return Err(PricingError::InvalidInterval(
                "end time must be after start time".to_string(),
            ));
        }
        if duration_minutes(&start, &end) < 1 {
            return Err(PricingError::InvalidInterval(
                "interval is shorter than one minute".to_string(),
            ));
        }

        let postcode = query.postcode.to_string();
        let resolution = self
            .resolver
            .resolve_address(query)
            .await
            .ok_or_else(|| PricingError::ZoneNotResolvable(postcode))?;

        let zone_key = &resolution.resolved.zone_key;
        let date = CalcDate::from_datetime(&start);
        let Some(cost) = self.engine.compute_cost(zone_key, start, end) else {
            warn!(zone = %zone_key, %date, "No applicable tariff");
            return Err(PricingError::NoApplicableTariff {
                zone: zone_key.to_string(),
                date: date.to_string(),
            });
        };
        let tariff_structure = self.engine.tariff_structure(&resolution.zone, date);

        info!(
            zone = %zone_key,
            method = %resolution.resolved.detection_method,
            minutes = cost.duration_minutes,
            total = %cost.total_cost,
            "Parking quote ready"
        );

        Ok(ParkingQuote {
            resolution,
            cost,
            tariff_structure,
            start,
            end,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::application::ports::DisabledAddressLookup;
    use crate::application::services::{address_query, ZoneCatalog};
    use crate::domain::{DetectionMethod, TariffRow, TariffTable, UNBOUNDED_MINUTES};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn bracket(fare_code: &str, start: i64, end: i64, amount: &str, step: i64) -> TariffRow {
        TariffRow {
            area_id: 14,
            fare_code: Some(fare_code.to_string()),
            valid_from: CalcDate(20240101),
            valid_to: CalcDate(20241231),
            bracket_start_minute: start,
            bracket_end_minute: end,
            amount_per_step: dec(amount),
            step_size_minutes: step,
            cumulative_amount: Decimal::ZERO,
        }
    }

    fn service(rows: Vec<TariffRow>) -> ParkingService {
        let table = Arc::new(TariffTable::from_rows(rows));
        let catalog = Arc::new(ZoneCatalog::build(&table));
        let resolver = Arc::new(ZoneResolver::new(catalog, Arc::new(DisabledAddressLookup)));
        ParkingService::new(resolver, Arc::new(FareEngine::new(table)))
    }

    fn amsterdam() -> ParkingService {
        service(vec![
            bracket("TAR01", 0, 60, "1.00", 15),
            bracket("TAR01", 60, UNBOUNDED_MINUTES, "0.75", 15),
        ])
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn ninety_minutes_in_amsterdam() {
        let quote = amsterdam()
            .quote(address_query("1012JS", "1", None, None), at(10, 0), at(11, 30))
            .await
            .unwrap();
        assert_eq!(quote.cost.total_cost, dec("5.50"));
        assert_eq!(quote.resolution.zone.id(), "14_TAR01");
        assert_eq!(
            quote.resolution.resolved.detection_method,
            DetectionMethod::CityHeuristic
        );
        assert_eq!(quote.tariff_structure.unwrap().brackets.len(), 2);
    }

    #[tokio::test]
    async fn reversed_interval_is_rejected() {
        let err = amsterdam()
            .quote(address_query("1012JS", "1", None, None), at(11, 0), at(10, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, PricingError::InvalidInterval(_)));
    }

    #[tokio::test]
    async fn sub_minute_interval_is_rejected() {
        let start = at(10, 0);
        let end = start + chrono::Duration::seconds(30);
        let err = amsterdam()
            .quote(address_query("1012JS", "1", None, None), start, end)
            .await
            .unwrap_err();
        assert!(matches!(err, PricingError::InvalidInterval(_)));
    }

    #[tokio::test]
    async fn empty_dataset_cannot_resolve() {
        let err = service(vec![])
            .quote(address_query("1012JS", "1", None, None), at(10, 0), at(11, 0))
            .await
            .unwrap_err();
        assert_eq!(err, PricingError::ZoneNotResolvable("1012JS".into()));
    }

    #[tokio::test]
    async fn date_outside_validity_has_no_tariff() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let err = amsterdam()
            .quote(
                address_query("1012JS", "1", None, None),
                start,
                start + chrono::Duration::hours(1),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PricingError::NoApplicableTariff {
                zone: "14_TAR01".into(),
                date: "20250301".into(),
            }
        );
    }
}
