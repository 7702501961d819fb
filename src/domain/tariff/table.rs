//! In-memory tariff table
//!
//! Built once at startup from the dataset and never mutated afterwards.

use super::model::{TariffRow, ZoneKey};

/// Read-only collection of all dataset rows.
#[derive(Debug, Clone, Default)]
pub struct TariffTable {
    rows: Vec<TariffRow>,
}

impl TariffTable {
    pub fn from_rows(rows: Vec<TariffRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[TariffRow] {
        &self.rows
    }

    /// All rows sharing `key`, in dataset order.
    pub fn rows_for(&self, key: &ZoneKey) -> Vec<&TariffRow> {
        self.rows.iter().filter(|r| r.belongs_to(key)).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::tariff::CalcDate;

    fn row(area_id: i64, fare_code: Option<&str>, start: i64) -> TariffRow {
        TariffRow {
            area_id,
            fare_code: fare_code.map(String::from),
            valid_from: CalcDate(20240101),
            valid_to: CalcDate(20241231),
            bracket_start_minute: start,
            bracket_end_minute: start + 60,
            amount_per_step: Decimal::ONE,
            step_size_minutes: 15,
            cumulative_amount: Decimal::ZERO,
        }
    }

    #[test]
    fn rows_for_filters_by_key() {
        let table = TariffTable::from_rows(vec![
            row(14, Some("TAR01"), 60),
            row(14, Some("TAR02"), 0),
            row(14, Some("TAR01"), 0),
            row(14, None, 0),
            row(17, Some("TAR01"), 0),
        ]);

        let rows = table.rows_for(&ZoneKey::new(14, "TAR01"));
        assert_eq!(rows.len(), 2);
        // dataset order, unsorted
        assert_eq!(rows[0].bracket_start_minute, 60);
        assert_eq!(rows[1].bracket_start_minute, 0);
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn unknown_key_yields_nothing() {
        let table = TariffTable::from_rows(vec![row(14, Some("TAR01"), 0)]);
        assert!(table.rows_for(&ZoneKey::new(99, "X")).is_empty());
        assert!(TariffTable::default().is_empty());
    }
}
