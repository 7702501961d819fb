//! Zone domain entities

use serde::Serialize;

use crate::domain::tariff::ZoneKey;

/// A billable tariff grouping discovered in the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub key: ZoneKey,
    pub display_name: String,
    /// Number of dataset rows sharing the key; popularity signal only.
    pub record_count: usize,
}

impl Zone {
    pub fn new(key: ZoneKey, record_count: usize) -> Self {
        let display_name = format!("Zone {} - {}", key.area_id, key.fare_code);
        Self {
            key,
            display_name,
            record_count,
        }
    }

    pub fn id(&self) -> String {
        self.key.to_string()
    }
}

/// How a zone was picked for an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    CityHeuristic,
    /// Municipality known, but not covered by the city table.
    MostPopular,
    /// No municipality known at all.
    FallbackMostPopular,
    /// Input could not be interpreted; never cached.
    ErrorFallback,
}

impl DetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CityHeuristic => "city_heuristic",
            Self::MostPopular => "most_popular",
            Self::FallbackMostPopular => "fallback_most_popular",
            Self::ErrorFallback => "error_fallback",
        }
    }
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of zone resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedZone {
    pub zone_key: ZoneKey,
    pub detection_method: DetectionMethod,
}
