//! # NPR Parking Fee Service
//!
//! Computes parking fees for Dutch addresses from the NPR (Nationaal
//! Parkeerregister) open tariff dataset.
//!
//! ## Architecture
//!
//! - **domain**: tariff rows, zones, addresses and the city heuristics
//! - **application**: zone catalog, zone resolver, fare engine and the
//!   address lookup port
//! - **infrastructure**: CSV dataset loader and BAG address API client
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: runtime assembly, logging and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export API router
pub use interfaces::create_api_router;
