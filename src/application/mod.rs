pub mod ports;
pub mod services;

// Re-export key types for convenience
pub use ports::{AddressLookupError, AddressLookupPort, DisabledAddressLookup};
pub use services::{
    address_query, AddressResolution, FareEngine, ParkingQuote, ParkingService, ZoneCatalog,
    ZoneResolver,
};
