//! Tariff aggregate
//!
//! Contains the dataset row (duration bracket), zone key, cost result types
//! and the in-memory tariff table.

pub mod model;
pub mod table;

pub use model::{
    CalcDate, CostBreakdownLine, CostCalculation, ParseZoneKeyError, TariffBracket, TariffRow,
    TariffStructure, UnitRate, ZoneKey, OPEN_END_DATE, UNBOUNDED_MINUTES,
};
pub use table::TariffTable;
