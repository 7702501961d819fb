//! Outbound ports: services outside the process
//!
//! [`AddressLookupPort`] decouples zone resolution from the concrete address
//! registry. The production implementation is the BAG client in
//! [`crate::infrastructure::bag`]; [`DisabledAddressLookup`] stands in when
//! no registry is configured.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Address, AddressQuery};

/// Why an address lookup produced no address.
///
/// Every variant is recoverable: the resolver continues with the postcode only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressLookupError {
    #[error("address not found")]
    NotFound,

    #[error("address registry rejected the credentials")]
    Unauthorized,

    #[error("address registry unavailable: {0}")]
    Unavailable(String),
}

/// Port for looking up a Dutch address by postcode and house number.
#[async_trait]
pub trait AddressLookupPort: Send + Sync {
    async fn lookup(&self, query: &AddressQuery) -> Result<Address, AddressLookupError>;

    /// Whether the registry answers at all.
    async fn health_check(&self) -> bool;
}

/// Lookup used when the address registry is switched off in the config.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledAddressLookup;

#[async_trait]
impl AddressLookupPort for DisabledAddressLookup {
    async fn lookup(&self, _query: &AddressQuery) -> Result<Address, AddressLookupError> {
        Err(AddressLookupError::Unavailable(
            "address lookup disabled".to_string(),
        ))
    }

    async fn health_check(&self) -> bool {
        false
    }
}
