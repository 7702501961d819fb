//! Zone aggregate
//!
//! Zones derived from the tariff dataset, resolution provenance, and the
//! fixed city heuristics.

pub mod heuristics;
pub mod model;

pub use heuristics::{
    area_ids_for_city_term, city_candidates, guess_city_from_postcode, UNKNOWN_CITY,
};
pub use model::{DetectionMethod, ResolvedZone, Zone};
