//! Application services

mod catalog;
mod fare;
mod pricing;
mod resolver;

pub use catalog::ZoneCatalog;
pub use fare::{round_currency, FareEngine};
pub use pricing::{ParkingQuote, ParkingService};
pub use resolver::{address_query, AddressResolution, ZoneResolver};
