//! Domain layer: dataset rows, zones and addresses.

pub mod address;
pub mod tariff;
pub mod zone;

pub use address::{Address, AddressQuery, AddressResolutionInput, Coordinates, Postcode};
pub use tariff::{
    CalcDate, CostBreakdownLine, CostCalculation, TariffBracket, TariffRow, TariffStructure,
    TariffTable, UnitRate, ZoneKey, UNBOUNDED_MINUTES,
};
pub use zone::{DetectionMethod, ResolvedZone, Zone};
