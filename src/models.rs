//! Domain values for one submission
//!
//! Everything here is request-scoped: produced while handling one form
//! submission and dropped after the page is rendered, cache entries aside.

use serde::{Deserialize, Serialize};

/// Geographic coordinates as resolved by geocoding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinates {
    /// Format as the coordinates readout shown to the user.
    #[must_use]
    pub fn display(&self) -> String {
        format!("({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// Current air-quality measurement for one location.
///
/// The pollutant set is open: `components` holds whatever codes the provider
/// returned, in the provider's own order, with concentrations in µg/m³. Keys
/// are stored exactly as received; uppercasing happens at presentation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityReading {
    /// AQI category, 1 (Good) to 5 (Very Poor) per the provider contract
    pub aqi: i64,
    /// Pollutant code → concentration in µg/m³, provider order preserved
    pub components: Vec<(String, f64)>,
    /// Unix timestamp of the observation, when the provider sent one
    pub observed_at: Option<i64>,
}

impl AirQualityReading {
    /// Presentation rows for the pollutant table and chart labels:
    /// keys uppercased, concentrations formatted to two decimal places.
    #[must_use]
    pub fn display_rows(&self) -> Vec<(String, String)> {
        self.components
            .iter()
            .map(|(code, value)| (code.to_uppercase(), format_concentration(*value)))
            .collect()
    }
}

/// Format a concentration value for display.
#[must_use]
pub fn format_concentration(value: f64) -> String {
    format!("{value:.2}")
}

/// Assembled result of one successful submission, ready for rendering
#[derive(Debug, Clone, Serialize)]
pub struct AirReport {
    /// The trimmed query the user submitted
    pub query: String,
    /// Where the query resolved to
    pub coordinates: Coordinates,
    /// The current reading at those coordinates
    pub reading: AirQualityReading,
    /// Human label for the AQI category
    pub label: &'static str,
    /// Health advice for the AQI category
    pub advice: &'static str,
}
