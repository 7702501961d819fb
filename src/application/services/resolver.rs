//! Zone resolver: picks one tariff zone for an address

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::application::ports::{AddressLookupError, AddressLookupPort};
use crate::domain::zone::{city_candidates, guess_city_from_postcode, UNKNOWN_CITY};
use crate::domain::{
    Address, AddressQuery, AddressResolutionInput, DetectionMethod, Postcode, ResolvedZone, Zone,
    ZoneKey,
};

use super::catalog::ZoneCatalog;

/// Zone chosen for an address, with the address data that led to it.
#[derive(Debug, Clone)]
pub struct AddressResolution {
    pub resolved: ResolvedZone,
    pub zone: Zone,
    pub address: Address,
    /// `false` when the address was synthesized from the postcode.
    pub address_found: bool,
}

/// Cache key: normalized postcode and lower-cased municipality.
type CacheKey = (String, String);

/// Resolves addresses to zones; memoizes per `(postcode, municipality)`.
pub struct ZoneResolver {
    catalog: Arc<ZoneCatalog>,
    address_lookup: Arc<dyn AddressLookupPort>,
    cache: DashMap<CacheKey, ResolvedZone>,
}

impl ZoneResolver {
    pub fn new(catalog: Arc<ZoneCatalog>, address_lookup: Arc<dyn AddressLookupPort>) -> Self {
        Self {
            catalog,
            address_lookup,
            cache: DashMap::new(),
        }
    }

    pub fn catalog(&self) -> &ZoneCatalog {
        &self.catalog
    }

    pub fn address_lookup(&self) -> &Arc<dyn AddressLookupPort> {
        &self.address_lookup
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Picks a zone for already-known address data.
    ///
    /// Only `None` when the catalog holds no zones.
    pub fn resolve(&self, input: &AddressResolutionInput) -> Option<ResolvedZone> {
        let municipality = input.municipality_key();
        let cache_key = (input.postcode.to_string(), municipality.clone());

        if let Some(hit) = self.cache.get(&cache_key) {
            debug!(postcode = %input.postcode, %municipality, zone = %hit.zone_key, "Zone cache hit");
            return Some(hit.clone());
        }

        let resolved = match self.match_city(&municipality) {
            Some(zone_key) => {
                info!(zone = %zone_key, %municipality, "Zone found via city heuristic");
                ResolvedZone {
                    zone_key,
                    detection_method: DetectionMethod::CityHeuristic,
                }
            }
            None => {
                let method = if municipality.is_empty() {
                    DetectionMethod::FallbackMostPopular
                } else {
                    DetectionMethod::MostPopular
                };
                self.most_popular(method)?
            }
        };

        // Last writer wins; the outcome is deterministic for a given key.
        self.cache.insert(cache_key, resolved.clone());
        Some(resolved)
    }

    /// Looks the address up, then resolves. Lookup failures degrade to the
    /// postcode-based city guess and never abort resolution.
    pub async fn resolve_address(&self, query: AddressQuery) -> Option<AddressResolution> {
        if !query.postcode.is_well_formed() {
            warn!(postcode = %query.postcode, "Malformed postcode, using fallback zone");
            return self.error_fallback(&query);
        }

        let (address, address_found) = match self.address_lookup.lookup(&query).await {
            Ok(address) => (address, true),
            Err(e) => {
                match &e {
                    AddressLookupError::NotFound => {
                        info!(postcode = %query.postcode, house_number = %query.house_number, "Address not found")
                    }
                    _ => {
                        warn!(postcode = %query.postcode, house_number = %query.house_number, error = %e, "Address lookup failed")
                    }
                }
                (self.synthesize_address(&query)?, false)
            }
        };

        let input = AddressResolutionInput::from_query(&query, address.municipality.clone());
        let resolved = self.resolve(&input)?;
        record_resolution(&resolved);
        let zone = self.catalog.zone_by_key(&resolved.zone_key)?.clone();

        Some(AddressResolution {
            resolved,
            zone,
            address,
            address_found,
        })
    }

    fn synthesize_address(&self, query: &AddressQuery) -> Option<Address> {
        let digits = query.postcode.digits()?;
        let city = guess_city_from_postcode(digits);
        debug!(postcode = %query.postcode, city, "Using postcode city guess");
        Some(Address::synthesized(query, city))
    }

    /// Most popular zone for input that cannot be interpreted. Not cached.
    fn error_fallback(&self, query: &AddressQuery) -> Option<AddressResolution> {
        let resolved = self.most_popular(DetectionMethod::ErrorFallback)?;
        let zone = self.catalog.zone_by_key(&resolved.zone_key)?.clone();
        record_resolution(&resolved);
        let mut address = Address::synthesized(query, UNKNOWN_CITY);
        address.municipality = None;

        Some(AddressResolution {
            resolved,
            zone,
            address,
            address_found: false,
        })
    }

    fn match_city(&self, municipality: &str) -> Option<ZoneKey> {
        city_candidates(municipality)
            .map(|(area_id, fare_code)| ZoneKey::new(area_id, fare_code))
            .find(|key| self.catalog.contains(key))
    }

    fn most_popular(&self, method: DetectionMethod) -> Option<ResolvedZone> {
        let Some(zone) = self.catalog.most_popular() else {
            warn!("Zone catalog is empty, cannot resolve any address");
            return None;
        };
        info!(zone = %zone.key, records = zone.record_count, method = %method, "Using most popular zone");
        Some(ResolvedZone {
            zone_key: zone.key.clone(),
            detection_method: method,
        })
    }
}

fn record_resolution(resolved: &ResolvedZone) {
    metrics::counter!(
        "zone_resolutions_total",
        "method" => resolved.detection_method.as_str()
    )
    .increment(1);
}

/// Builds a lookup query with a normalized postcode.
pub fn address_query(
    postcode: &str,
    house_number: impl Into<String>,
    house_letter: Option<String>,
    house_number_addition: Option<String>,
) -> AddressQuery {
    AddressQuery {
        postcode: Postcode::normalize(postcode),
        house_number: house_number.into(),
        house_letter: house_letter.filter(|s| !s.trim().is_empty()),
        house_number_addition: house_number_addition.filter(|s| !s.trim().is_empty()),
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use super::*;
    use crate::application::ports::DisabledAddressLookup;
    use crate::domain::{CalcDate, TariffRow, TariffTable};

    fn row(area_id: i64, fare_code: &str) -> TariffRow {
        TariffRow {
            area_id,
            fare_code: Some(fare_code.to_string()),
            valid_from: CalcDate(20240101),
            valid_to: CalcDate(20241231),
            bracket_start_minute: 0,
            bracket_end_minute: 60,
            amount_per_step: Decimal::ONE,
            step_size_minutes: 15,
            cumulative_amount: Decimal::ZERO,
        }
    }

    /// 999_X is the most popular zone; Amsterdam's second candidate exists.
    fn catalog() -> Arc<ZoneCatalog> {
        let mut rows = vec![row(14, "TAR02"), row(34, "34_TAR01"), row(17, "GAR01")];
        rows.extend(std::iter::repeat_with(|| row(999, "X")).take(5));
        Arc::new(ZoneCatalog::build(&TariffTable::from_rows(rows)))
    }

    fn input(postcode: &str, municipality: Option<&str>) -> AddressResolutionInput {
        AddressResolutionInput {
            postcode: Postcode::normalize(postcode),
            house_number: "1".into(),
            house_letter: None,
            house_number_addition: None,
            municipality: municipality.map(String::from),
        }
    }

    fn resolver_with(lookup: Arc<dyn AddressLookupPort>) -> ZoneResolver {
        ZoneResolver::new(catalog(), lookup)
    }

    fn resolver() -> ZoneResolver {
        resolver_with(Arc::new(DisabledAddressLookup))
    }

    struct FixedLookup {
        result: Result<Address, AddressLookupError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AddressLookupPort for FixedLookup {
        async fn lookup(&self, _query: &AddressQuery) -> Result<Address, AddressLookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }

        async fn health_check(&self) -> bool {
            self.result.is_ok()
        }
    }

    fn found(municipality: &str) -> Arc<FixedLookup> {
        Arc::new(FixedLookup {
            result: Ok(Address {
                postcode: "3011AA".into(),
                house_number: "1".into(),
                house_letter: None,
                house_number_addition: None,
                street: "Coolsingel".into(),
                city: "Rotterdam".into(),
                municipality: Some(municipality.into()),
                coordinates: None,
            }),
            calls: AtomicUsize::new(0),
        })
    }

    #[test]
    fn city_heuristic_picks_first_existing_candidate() {
        let r = resolver();
        let got = r.resolve(&input("1012JS", Some("Amsterdam"))).unwrap();
        // TAR01 is absent, TAR02 is next in line
        assert_eq!(got.zone_key, ZoneKey::new(14, "TAR02"));
        assert_eq!(got.detection_method, DetectionMethod::CityHeuristic);
    }

    #[test]
    fn unknown_municipality_falls_back_to_most_popular() {
        let got = resolver()
            .resolve(&input("9711AA", Some("Groningen")))
            .unwrap();
        assert_eq!(got.zone_key, ZoneKey::new(999, "X"));
        assert_eq!(got.detection_method, DetectionMethod::MostPopular);
    }

    #[test]
    fn missing_municipality_is_tagged_separately() {
        let got = resolver().resolve(&input("9711AA", None)).unwrap();
        assert_eq!(got.zone_key, ZoneKey::new(999, "X"));
        assert_eq!(got.detection_method, DetectionMethod::FallbackMostPopular);
    }

    #[test]
    fn city_without_catalog_match_falls_back() {
        // Den Haag candidates are not in the catalog
        let got = resolver().resolve(&input("2511AA", Some("Den Haag"))).unwrap();
        assert_eq!(got.zone_key, ZoneKey::new(999, "X"));
        assert_eq!(got.detection_method, DetectionMethod::MostPopular);
    }

    #[test]
    fn resolve_is_idempotent_and_cached() {
        let r = resolver();
        let first = r.resolve(&input("3511AB", Some("Utrecht"))).unwrap();
        let second = r.resolve(&input("3511 ab", Some("UTRECHT"))).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.zone_key, ZoneKey::new(34, "34_TAR01"));
        assert_eq!(r.cached_entries(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_resolves_of_new_postcode_agree() {
        let r = Arc::new(resolver());
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let r = r.clone();
                tokio::spawn(async move { r.resolve(&input("3011AA", Some("Rotterdam"))) })
            })
            .collect();

        let mut keys = Vec::new();
        for task in tasks {
            keys.push(task.await.unwrap().unwrap().zone_key);
        }
        assert!(keys.iter().all(|k| *k == keys[0]));
        assert_eq!(r.cached_entries(), 1);
    }

    #[test]
    fn empty_catalog_resolves_nothing() {
        let r = ZoneResolver::new(
            Arc::new(ZoneCatalog::default()),
            Arc::new(DisabledAddressLookup),
        );
        assert!(r.resolve(&input("1012JS", Some("amsterdam"))).is_none());
        assert_eq!(r.cached_entries(), 0);
    }

    #[tokio::test]
    async fn lookup_municipality_drives_heuristic() {
        let lookup = found("Rotterdam");
        let r = resolver_with(lookup.clone());
        let res = r
            .resolve_address(address_query("3011 aa", "1", None, None))
            .await
            .unwrap();
        assert!(res.address_found);
        assert_eq!(res.resolved.zone_key, ZoneKey::new(17, "GAR01"));
        assert_eq!(res.resolved.detection_method, DetectionMethod::CityHeuristic);
        assert_eq!(res.zone.display_name, "Zone 17 - GAR01");
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn lookup_failure_uses_postcode_guess() {
        let r = resolver();
        let res = r
            .resolve_address(address_query("1012JS", "1", None, None))
            .await
            .unwrap();
        assert!(!res.address_found);
        assert_eq!(res.address.street, "Onbekend");
        assert_eq!(res.address.city, "Amsterdam");
        assert_eq!(res.resolved.zone_key, ZoneKey::new(14, "TAR02"));
        assert_eq!(res.resolved.detection_method, DetectionMethod::CityHeuristic);
    }

    #[tokio::test]
    async fn not_found_is_absorbed_like_unavailable() {
        let lookup = Arc::new(FixedLookup {
            result: Err(AddressLookupError::NotFound),
            calls: AtomicUsize::new(0),
        });
        let r = resolver_with(lookup);
        let res = r
            .resolve_address(address_query("9711AA", "5", None, None))
            .await
            .unwrap();
        assert_eq!(res.address.city, "Nederland");
        // "nederland" is a known municipality string, not a missing one
        assert_eq!(res.resolved.detection_method, DetectionMethod::MostPopular);
    }

    #[tokio::test]
    async fn malformed_postcode_gets_uncached_error_fallback() {
        let r = resolver();
        let res = r
            .resolve_address(address_query("ABCDEF", "1", None, None))
            .await
            .unwrap();
        assert_eq!(res.resolved.zone_key, ZoneKey::new(999, "X"));
        assert_eq!(res.resolved.detection_method, DetectionMethod::ErrorFallback);
        assert_eq!(r.cached_entries(), 0);
    }

    #[test]
    fn address_query_drops_blank_optionals() {
        let q = address_query("1012 js", "12", Some(" ".into()), Some("bis".into()));
        assert_eq!(q.postcode.as_str(), "1012JS");
        assert!(q.house_letter.is_none());
        assert_eq!(q.house_number_addition.as_deref(), Some("bis"));
    }
}
