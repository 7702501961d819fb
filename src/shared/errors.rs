use thiserror::Error;

/// Fatal dataset problems; the service must not start serving.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("Dataset file not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),
}

/// Why a fee could not be produced.
///
/// The core components answer with `None`; [`ParkingService`] picks the
/// variant from the context it was called in. A dataset that cannot be loaded
/// is a [`DataLoadError`] at startup and never reaches a request.
///
/// [`ParkingService`]: crate::application::ParkingService
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("No parking zone could be resolved for {0}")]
    ZoneNotResolvable(String),

    #[error("No applicable tariff for zone {zone} on {date}")]
    NoApplicableTariff { zone: String, date: String },

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_error_messages() {
        let err = PricingError::NoApplicableTariff {
            zone: "14_TAR01".into(),
            date: "20240101".into(),
        };
        assert_eq!(
            err.to_string(),
            "No applicable tariff for zone 14_TAR01 on 20240101"
        );
    }

    #[test]
    fn missing_column_message() {
        let err = DataLoadError::MissingColumn("AreaManagerId");
        assert_eq!(err.to_string(), "Missing required column: AreaManagerId");
    }
}
