//! Infrastructure layer - external concerns

pub mod bag;
pub mod dataset;

pub use bag::{BagClient, BagClientConfig};
