//! Zone catalog: the zones discoverable in the tariff table

use std::collections::BTreeMap;

use tracing::info;

use crate::domain::zone::area_ids_for_city_term;
use crate::domain::{TariffTable, Zone, ZoneKey};

/// Read-only index of zones, ordered by popularity.
#[derive(Debug, Clone, Default)]
pub struct ZoneCatalog {
    /// Sorted descending by `record_count`; ties keep ascending key order.
    zones: Vec<Zone>,
}

impl ZoneCatalog {
    /// Groups rows by `(area_id, fare_code)`; rows without a fare code are skipped.
    pub fn build(table: &TariffTable) -> Self {
        let mut groups: BTreeMap<ZoneKey, usize> = BTreeMap::new();
        for key in table.rows().iter().filter_map(|row| row.zone_key()) {
            *groups.entry(key).or_insert(0) += 1;
        }

        let mut zones: Vec<Zone> = groups
            .into_iter()
            .map(|(key, count)| Zone::new(key, count))
            .collect();
        // stable: equal counts stay in key order
        zones.sort_by(|a, b| b.record_count.cmp(&a.record_count));

        info!(
            rows = table.len(),
            zones = zones.len(),
            "Zone catalog built"
        );
        for (i, zone) in zones.iter().take(5).enumerate() {
            info!(
                rank = i + 1,
                zone = %zone.key,
                records = zone.record_count,
                "Popular zone"
            );
        }

        Self { zones }
    }

    pub fn all_zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn zone_by_key(&self, key: &ZoneKey) -> Option<&Zone> {
        self.zones.iter().find(|z| &z.key == key)
    }

    pub fn contains(&self, key: &ZoneKey) -> bool {
        self.zone_by_key(key).is_some()
    }

    /// Zone with the highest record count.
    pub fn most_popular(&self) -> Option<&Zone> {
        self.zones.first()
    }

    /// Case-insensitive substring search over display name, fare code and
    /// area id. A known city name (`"utrecht"`) also matches that city's zones.
    pub fn search(&self, term: &str) -> Vec<Zone> {
        let needle = term.trim().to_lowercase();
        let city_areas = area_ids_for_city_term(&needle);

        self.zones
            .iter()
            .filter(|zone| {
                zone.display_name.to_lowercase().contains(&needle)
                    || zone.key.fare_code.to_lowercase().contains(&needle)
                    || zone.key.area_id.to_string().contains(&needle)
                    || city_areas.contains(&zone.key.area_id)
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

// ── Tests ──────────────────────────────────────────────────────
