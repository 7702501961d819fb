//! Application ports
//!
//! - [`outbound`]: address lookup collaborator

pub mod outbound;

pub use outbound::{AddressLookupError, AddressLookupPort, DisabledAddressLookup};
