//! BAG address registry adapter

mod client;

pub use client::{BagClient, BagClientConfig};
