//! Fixed city knowledge used when the dataset lacks geospatial signal.

/// Known-good zones per municipality, tried in order: each entry is an area
/// manager id with its candidate fare codes.
const CITY_PATTERNS: &[(&str, &[(i64, &[&str])])] = &[
    (
        "amsterdam",
        &[
            (14, &["TAR01", "TAR02", "TAR03", "TAR04"]),
            (14, &["14_DAGTAR", "PRTAR01"]),
        ],
    ),
    (
        "utrecht",
        &[(34, &["34_TAR01", "34_TAR02"]), (34, &["34_DAG01", "34_DAG02"])],
    ),
    ("rotterdam", &[(17, &["TAR01", "GAR01"]), (5, &["PR01"])]),
    ("den haag", &[(10, &["TAR01", "CPL01"]), (3, &["PR01"])]),
    ("'s-gravenhage", &[(10, &["TAR01", "CPL01"]), (3, &["PR01"])]),
];

/// Label used when the postcode falls outside every known range.
pub const UNKNOWN_CITY: &str = "Nederland";

/// Ordered `(area_id, fare_code)` candidates for a lower-cased municipality.
pub fn city_candidates(municipality: &str) -> impl Iterator<Item = (i64, &'static str)> + '_ {
    CITY_PATTERNS
        .iter()
        .filter(move |(name, _)| *name == municipality)
        .flat_map(|(_, pairs)| pairs.iter())
        .flat_map(|(area_id, codes)| codes.iter().map(move |code| (*area_id, *code)))
}

/// Area ids listed for every municipality whose name contains `term`.
pub fn area_ids_for_city_term(term: &str) -> Vec<i64> {
    let term = term.to_lowercase();
    let mut ids: Vec<i64> = CITY_PATTERNS
        .iter()
        .filter(|(name, _)| !term.is_empty() && name.contains(term.as_str()))
        .flat_map(|(_, pairs)| pairs.iter().map(|(area_id, _)| *area_id))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Best-effort city label from the numeric postcode prefix. Not authoritative.
pub fn guess_city_from_postcode(digits: u16) -> &'static str {
    match digits {
        1000..=1299 => "Amsterdam",
        3000..=3299 => "Rotterdam",
        3500..=3599 => "Utrecht",
        2500..=2699 => "Den Haag",
        _ => UNKNOWN_CITY,
    }
}
