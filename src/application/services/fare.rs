//! Fare engine: piecewise, cumulative cost over duration brackets

use std::sync::Arc;

use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info, warn};

use crate::domain::tariff::OPEN_END_DATE;
use crate::domain::{
    CalcDate, CostBreakdownLine, CostCalculation, TariffBracket, TariffRow, TariffStructure,
    TariffTable, UnitRate, Zone, ZoneKey,
};
use crate::shared::time::duration_minutes;

/// Brackets listed in a cost breakdown.
const MAX_BREAKDOWN_LINES: usize = 3;

/// Computes parking costs from the tariff table.
pub struct FareEngine {
    table: Arc<TariffTable>,
}

impl FareEngine {
    pub fn new(table: Arc<TariffTable>) -> Self {
        Self { table }
    }

    /// Brackets of `zone` valid on `date`, ascending by start minute.
    pub fn brackets_for(&self, zone: &ZoneKey, date: CalcDate) -> Vec<TariffRow> {
        let mut brackets: Vec<TariffRow> = self
            .table
            .rows_for(zone)
            .into_iter()
            .filter(|row| row.is_valid_on(date))
            .cloned()
            .collect();
        brackets.sort_by_key(|row| row.bracket_start_minute);

        debug!(zone = %zone, %date, brackets = brackets.len(), "Selected tariff brackets");
        brackets
    }

    pub fn has_valid_tariff(&self, zone: &ZoneKey, date: CalcDate) -> bool {
        !self.brackets_for(zone, date).is_empty()
    }

    /// Cost of parking in `zone` from `start` to `end`.
    ///
    /// `None` when the interval is shorter than a minute or no bracket of the
    /// zone is valid on the start date.
    pub fn compute_cost(
        &self,
        zone: &ZoneKey,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Option<CostCalculation> {
        let minutes = duration_minutes(&start, &end);
        if minutes <= 0 {
            return None;
        }

        let date = CalcDate::from_datetime(&start);
        let brackets = self.brackets_for(zone, date);
        if brackets.is_empty() {
            warn!(zone = %zone, %date, "No tariff brackets valid for date");
            return None;
        }

        let calculation = accumulate(&brackets, minutes);
        info!(
            zone = %zone,
            %date,
            minutes,
            total = %calculation.total_cost,
            "Parking cost calculated"
        );
        Some(calculation)
    }

    /// Every bracket of `zone` valid on `date`.
    pub fn tariff_structure(&self, zone: &Zone, date: CalcDate) -> Option<TariffStructure> {
        let brackets = self.brackets_for(&zone.key, date);
        if brackets.is_empty() {
            return None;
        }

        Some(TariffStructure {
            zone_id: zone.id(),
            zone_name: zone.display_name.clone(),
            brackets: brackets.iter().map(TariffBracket::from).collect(),
            valid_from: date.to_string(),
            valid_to: OPEN_END_DATE.to_string(),
        })
    }
}

/// Walks sorted brackets, attributing the duration cumulatively.
///
/// A bracket is skipped while the minutes already attributed have not reached
/// its start. Minutes left after the walk go to the last bracket only when it
/// is unbounded; otherwise they stay unbilled.
fn accumulate(brackets: &[TariffRow], duration: i64) -> CostCalculation {
    let mut total = Decimal::ZERO;
    let mut remaining = duration;
    let mut breakdown: Vec<CostBreakdownLine> = Vec::new();
    let mut unit_rate: Option<UnitRate> = None;

    let mut record = |row: &TariffRow, cost: Decimal, breakdown: &mut Vec<CostBreakdownLine>| {
        if breakdown.len() < MAX_BREAKDOWN_LINES {
            let line = CostBreakdownLine::from(row);
            if !breakdown.contains(&line) {
                breakdown.push(line);
            }
        }
        // free brackets never set the advertised rate
        if unit_rate.is_none() && !cost.is_zero() {
            unit_rate = Some(UnitRate {
                amount_per_step: row.amount_per_step,
                step_size_minutes: row.step_size_minutes,
            });
        }
    };

    for row in brackets {
        if remaining <= 0 {
            break;
        }
        let consumed = duration - remaining;
        if consumed < row.bracket_start_minute {
            continue;
        }

        let minutes = remaining.min(row.bracket_end_minute - row.bracket_start_minute.max(consumed));
        if minutes > 0 {
            let cost = row.cost_for(minutes);
            debug!(
                start = row.bracket_start_minute,
                end = row.bracket_end_minute,
                minutes,
                %cost,
                "Bracket applied"
            );
            total += cost;
            remaining -= minutes;
            record(row, cost, &mut breakdown);
        }
    }

    if remaining > 0 {
        match brackets.last() {
            Some(tail) if tail.is_unbounded() => {
                let cost = tail.cost_for(remaining);
                debug!(minutes = remaining, %cost, "Open-ended tail applied");
                total += cost;
                record(tail, cost, &mut breakdown);
            }
            _ => debug!(minutes = remaining, "Duration beyond last bracket left unbilled"),
        }
    }

    CostCalculation {
        duration_minutes: duration,
        total_cost: round_currency(total),
        breakdown,
        unit_rate,
    }
}

/// Cents, half-up (midpoint away from zero). Always carries two decimals.
pub fn round_currency(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

// ── Tests ──────────────────────────────────────────────────────
