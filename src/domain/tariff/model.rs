//! Tariff domain entities
//!
//! A tariff is a set of duration brackets ("fare parts" in the NPR dataset)
//! shared by one [`ZoneKey`]. Each bracket bills per started step while the
//! accumulated parking duration falls inside `[start, end)` minutes.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

/// Bracket end marking an open-ended tail bracket.
pub const UNBOUNDED_MINUTES: i64 = 999_999;

/// Upper bound reported for tariff structures without an explicit end date.
pub const OPEN_END_DATE: &str = "99991231";

/// Composite zone identity: `(area manager id, fare calculation code)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneKey {
    pub area_id: i64,
    pub fare_code: String,
}

impl ZoneKey {
    pub fn new(area_id: i64, fare_code: impl Into<String>) -> Self {
        Self {
            area_id,
            fare_code: fare_code.into(),
        }
    }
}

impl fmt::Display for ZoneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.area_id, self.fare_code)
    }
}

/// Error returned when a zone id string is not `{area_id}_{fare_code}`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid zone id: {0}")]
pub struct ParseZoneKeyError(pub String);

impl FromStr for ZoneKey {
    type Err = ParseZoneKeyError;

    /// Splits on the first `_`; fare codes such as `34_TAR01` keep their own
    /// underscores (`"34_34_TAR01"` → `(34, "34_TAR01")`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (area, code) = s
            .split_once('_')
            .ok_or_else(|| ParseZoneKeyError(s.to_string()))?;
        let area_id = area
            .parse::<i64>()
            .map_err(|_| ParseZoneKeyError(s.to_string()))?;
        if code.is_empty() {
            return Err(ParseZoneKeyError(s.to_string()));
        }
        Ok(Self::new(area_id, code))
    }
}

/// Calendar date in the dataset's `YYYYMMDD` integer form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalcDate(pub u32);

impl CalcDate {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.year() as u32 * 10_000 + date.month() * 100 + date.day())
    }

    pub fn from_datetime(dt: &NaiveDateTime) -> Self {
        Self::from_date(dt.date())
    }
}

impl fmt::Display for CalcDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}", self.0)
    }
}

/// One row of the NPR tariff dataset: a single duration bracket.
#[derive(Debug, Clone, PartialEq)]
pub struct TariffRow {
    pub area_id: i64,
    /// `None` when the dataset cell holds its missing marker (empty / NaN).
    pub fare_code: Option<String>,
    pub valid_from: CalcDate,
    pub valid_to: CalcDate,
    pub bracket_start_minute: i64,
    pub bracket_end_minute: i64,
    pub amount_per_step: Decimal,
    pub step_size_minutes: i64,
    pub cumulative_amount: Decimal,
}

impl TariffRow {
    pub fn zone_key(&self) -> Option<ZoneKey> {
        self.fare_code
            .as_ref()
            .map(|code| ZoneKey::new(self.area_id, code.clone()))
    }

    pub fn belongs_to(&self, key: &ZoneKey) -> bool {
        self.area_id == key.area_id && self.fare_code.as_deref() == Some(key.fare_code.as_str())
    }

    /// Inclusive on both ends.
    pub fn is_valid_on(&self, date: CalcDate) -> bool {
        self.valid_from <= date && date <= self.valid_to
    }

    pub fn is_unbounded(&self) -> bool {
        self.bracket_end_minute == UNBOUNDED_MINUTES
    }

    /// Cost of billing `minutes` inside this bracket: started steps are
    /// charged in full, and the cumulative amount is added once.
    pub fn cost_for(&self, minutes: i64) -> Decimal {
        if minutes <= 0 {
            return Decimal::ZERO;
        }
        let steps = (minutes + self.step_size_minutes - 1) / self.step_size_minutes;
        Decimal::from(steps) * self.amount_per_step + self.cumulative_amount
    }
}

/// Informational line describing a bracket that contributed cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdownLine {
    pub bracket_start: i64,
    pub bracket_end: i64,
    pub amount_per_step: Decimal,
    pub step_size_minutes: i64,
}

impl From<&TariffRow> for CostBreakdownLine {
    fn from(row: &TariffRow) -> Self {
        Self {
            bracket_start: row.bracket_start_minute,
            bracket_end: row.bracket_end_minute,
            amount_per_step: row.amount_per_step,
            step_size_minutes: row.step_size_minutes,
        }
    }
}

/// Price of the first bracket that contributed cost.
///
/// Not an average over the whole interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnitRate {
    pub amount_per_step: Decimal,
    pub step_size_minutes: i64,
}

impl UnitRate {
    pub fn unit_label(&self) -> String {
        format!("{} minuten", self.step_size_minutes)
    }
}

/// Result of a fare computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostCalculation {
    pub duration_minutes: i64,
    /// Rounded to cents, half-up.
    pub total_cost: Decimal,
    pub breakdown: Vec<CostBreakdownLine>,
    pub unit_rate: Option<UnitRate>,
}

/// A bracket as published in a tariff structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TariffBracket {
    pub start_duration: i64,
    pub end_duration: i64,
    pub amount: Decimal,
    pub step_size: i64,
    pub cumulative_amount: Decimal,
}

impl From<&TariffRow> for TariffBracket {
    fn from(row: &TariffRow) -> Self {
        Self {
            start_duration: row.bracket_start_minute,
            end_duration: row.bracket_end_minute,
            amount: row.amount_per_step,
            step_size: row.step_size_minutes,
            cumulative_amount: row.cumulative_amount,
        }
    }
}

/// Full bracket list of a zone valid on one calculation date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TariffStructure {
    pub zone_id: String,
    pub zone_name: String,
    pub brackets: Vec<TariffBracket>,
    pub valid_from: String,
    pub valid_to: String,
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn bracket(start: i64, end: i64, step: i64, amount: &str, cumulative: &str) -> TariffRow {
        TariffRow {
            area_id: 14,
            fare_code: Some("TAR01".into()),
            valid_from: CalcDate(20240101),
            valid_to: CalcDate(20241231),
            bracket_start_minute: start,
            bracket_end_minute: end,
            amount_per_step: dec(amount),
            step_size_minutes: step,
            cumulative_amount: dec(cumulative),
        }
    }

    #[test]
    fn zone_key_display() {
        assert_eq!(ZoneKey::new(14, "TAR01").to_string(), "14_TAR01");
    }

    #[test]
    fn zone_key_parse_keeps_underscores_in_fare_code() {
        let key: ZoneKey = "34_34_TAR01".parse().unwrap();
        assert_eq!(key, ZoneKey::new(34, "34_TAR01"));
    }

    #[test]
    fn zone_key_parse_rejects_garbage() {
        assert!("TAR01".parse::<ZoneKey>().is_err());
        assert!("abc_TAR01".parse::<ZoneKey>().is_err());
        assert!("14_".parse::<ZoneKey>().is_err());
    }

    #[test]
    fn calc_date_from_datetime() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        assert_eq!(CalcDate::from_datetime(&dt), CalcDate(20240307));
        assert_eq!(CalcDate(20240307).to_string(), "20240307");
    }

    #[test]
    fn validity_window_is_inclusive() {
        let row = bracket(0, 60, 15, "1.00", "0.00");
        assert!(row.is_valid_on(CalcDate(20240101)));
        assert!(row.is_valid_on(CalcDate(20241231)));
        assert!(!row.is_valid_on(CalcDate(20250101)));
        assert!(!row.is_valid_on(CalcDate(20231231)));
    }

    #[test]
    fn cost_rounds_partial_steps_up() {
        let row = bracket(0, 60, 15, "1.00", "0.00");
        assert_eq!(row.cost_for(60), dec("4.00"));
        assert_eq!(row.cost_for(61), dec("5.00"));
        assert_eq!(row.cost_for(1), dec("1.00"));
    }

    #[test]
    fn cost_adds_cumulative_once() {
        let row = bracket(0, 60, 10, "0.50", "2.00");
        // 3 steps * 0.50 + 2.00
        assert_eq!(row.cost_for(25), dec("3.50"));
    }

    #[test]
    fn cost_of_zero_minutes_is_zero() {
        let row = bracket(0, 60, 10, "0.50", "2.00");
        assert_eq!(row.cost_for(0), Decimal::ZERO);
    }

    #[test]
    fn belongs_to_ignores_missing_fare_code() {
        let mut row = bracket(0, 60, 10, "0.50", "0.00");
        assert!(row.belongs_to(&ZoneKey::new(14, "TAR01")));
        row.fare_code = None;
        assert!(!row.belongs_to(&ZoneKey::new(14, "TAR01")));
        assert!(row.zone_key().is_none());
    }

    #[test]
    fn unit_label() {
        let rate = UnitRate {
            amount_per_step: dec("1.50"),
            step_size_minutes: 30,
        };
        assert_eq!(rate.unit_label(), "30 minuten");
    }
}
