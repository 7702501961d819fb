//! Address value objects

use serde::Serialize;

/// Street name used when no address data is available.
pub const UNKNOWN_STREET: &str = "Onbekend";

/// Dutch postcode, normalized to upper case without spaces (`1012 js` → `1012JS`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Postcode(String);

impl Postcode {
    pub fn normalize(raw: &str) -> Self {
        Self(
            raw.chars()
                .filter(|c| !c.is_whitespace())
                .flat_map(char::to_uppercase)
                .collect(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric part (`1012` for `1012JS`), if the first four characters are digits.
    pub fn digits(&self) -> Option<u16> {
        let prefix = self.0.get(..4)?;
        if !prefix.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        prefix.parse().ok()
    }

    /// Four digits followed by two letters.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == 6
            && self.digits().is_some()
            && self.0[4..].chars().all(|c| c.is_ascii_alphabetic())
    }
}

impl std::fmt::Display for Postcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Query sent to the address lookup collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressQuery {
    pub postcode: Postcode,
    pub house_number: String,
    pub house_letter: Option<String>,
    pub house_number_addition: Option<String>,
}

/// WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Address as returned by the lookup, or synthesized from the postcode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Address {
    pub postcode: String,
    pub house_number: String,
    pub house_letter: Option<String>,
    pub house_number_addition: Option<String>,
    pub street: String,
    pub city: String,
    pub municipality: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl Address {
    /// Placeholder address for when the lookup gave nothing back.
    pub fn synthesized(query: &AddressQuery, city_guess: &str) -> Self {
        Self {
            postcode: query.postcode.to_string(),
            house_number: query.house_number.clone(),
            house_letter: query.house_letter.clone(),
            house_number_addition: query.house_number_addition.clone(),
            street: UNKNOWN_STREET.to_string(),
            city: city_guess.to_string(),
            municipality: Some(city_guess.to_lowercase()),
            coordinates: None,
        }
    }

    /// `"Damrak 1, 1012JS Amsterdam"`
    pub fn display_line(&self) -> String {
        let mut number = self.house_number.clone();
        if let Some(letter) = &self.house_letter {
            number.push_str(letter);
        }
        if let Some(addition) = &self.house_number_addition {
            number.push('-');
            number.push_str(addition);
        }
        format!("{} {}, {} {}", self.street, number, self.postcode, self.city)
    }
}

/// Input of the zone resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressResolutionInput {
    pub postcode: Postcode,
    pub house_number: String,
    pub house_letter: Option<String>,
    pub house_number_addition: Option<String>,
    pub municipality: Option<String>,
}

impl AddressResolutionInput {
    pub fn from_query(query: &AddressQuery, municipality: Option<String>) -> Self {
        Self {
            postcode: query.postcode.clone(),
            house_number: query.house_number.clone(),
            house_letter: query.house_letter.clone(),
            house_number_addition: query.house_number_addition.clone(),
            municipality,
        }
    }

    pub fn municipality_key(&self) -> String {
        self.municipality
            .as_deref()
            .map(|m| m.trim().to_lowercase())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postcode_is_normalized() {
        assert_eq!(Postcode::normalize(" 1012 js ").as_str(), "1012JS");
    }

    #[test]
    fn postcode_digits() {
        assert_eq!(Postcode::normalize("3511AB").digits(), Some(3511));
        assert_eq!(Postcode::normalize("AB3511").digits(), None);
        assert_eq!(Postcode::normalize("35").digits(), None);
    }

    #[test]
    fn postcode_shape() {
        assert!(Postcode::normalize("1012 JS").is_well_formed());
        assert!(!Postcode::normalize("1012J").is_well_formed());
        assert!(!Postcode::normalize("1012J5").is_well_formed());
        assert!(!Postcode::normalize("X012JS").is_well_formed());
    }

    #[test]
    fn synthesized_address_lowercases_municipality() {
        let query = AddressQuery {
            postcode: Postcode::normalize("1012JS"),
            house_number: "1".into(),
            house_letter: None,
            house_number_addition: None,
        };
        let addr = Address::synthesized(&query, "Amsterdam");
        assert_eq!(addr.street, UNKNOWN_STREET);
        assert_eq!(addr.municipality.as_deref(), Some("amsterdam"));
        assert_eq!(addr.display_line(), "Onbekend 1, 1012JS Amsterdam");
    }

    #[test]
    fn display_line_includes_letter_and_addition() {
        let addr = Address {
            postcode: "1012JS".into(),
            house_number: "12".into(),
            house_letter: Some("A".into()),
            house_number_addition: Some("2".into()),
            street: "Damrak".into(),
            city: "Amsterdam".into(),
            municipality: Some("Amsterdam".into()),
            coordinates: None,
        };
        assert_eq!(addr.display_line(), "Damrak 12A-2, 1012JS Amsterdam");
    }

    #[test]
    fn municipality_key_is_lowercased() {
        let input = AddressResolutionInput {
            postcode: Postcode::normalize("1012JS"),
            house_number: "1".into(),
            house_letter: None,
            house_number_addition: None,
            municipality: Some(" Amsterdam ".into()),
        };
        assert_eq!(input.municipality_key(), "amsterdam");
    }
}
