//! Error types and handling for the `aircheck` application

use thiserror::Error;

/// Failure modes of one submission, in pipeline order.
///
/// Transport and timeout failures are not represented here: they travel as
/// `anyhow::Error` through the provider seam and the service folds them into
/// `GeocodeNotFound` / `AirQualityUnavailable` before anything user-facing
/// sees them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AirCheckError {
    /// No API key configured; every submission fails until it is fixed
    #[error("missing API credential")]
    MissingCredential,

    /// The submitted city string was empty after trimming
    #[error("empty city input")]
    EmptyInput,

    /// Geocoding produced no candidate for the query
    #[error("no geocoding result")]
    GeocodeNotFound,

    /// The pollution endpoint returned no current reading
    #[error("no air quality data")]
    AirQualityUnavailable,
}

impl AirCheckError {
    /// Short message rendered to the user for this submission.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            AirCheckError::MissingCredential => {
                "API key not found. Please set OPENWEATHER_API_KEY in the environment."
            }
            AirCheckError::EmptyInput => "Please enter a city name.",
            AirCheckError::GeocodeNotFound => {
                "City not found. Try again with country code (e.g., Paris,FR)."
            }
            AirCheckError::AirQualityUnavailable => "Failed to retrieve air quality data.",
        }
    }

    /// Stable machine-readable tag, used by the JSON API.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            AirCheckError::MissingCredential => "missing_credential",
            AirCheckError::EmptyInput => "empty_input",
            AirCheckError::GeocodeNotFound => "geocode_not_found",
            AirCheckError::AirQualityUnavailable => "air_quality_unavailable",
        }
    }
}
