//! Address value objects used for zone resolution.

pub mod model;

pub use model::{
    Address, AddressQuery, AddressResolutionInput, Coordinates, Postcode, UNKNOWN_STREET,
};
