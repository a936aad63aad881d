//! OpenWeatherMap client for geocoding and air-pollution lookups.
//!
//! Both calls share one HTTP client with a bounded timeout. Wire-format
//! structs live in the private `wire` module; everything past the trait
//! boundary is domain types.

use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::config::ProviderConfig;
use crate::models::{AirQualityReading, Coordinates};
use crate::service::{AirQualityProvider, GeocodeProvider};

/// HTTP client for the two OpenWeatherMap endpoints
pub struct OpenWeatherClient {
    client: reqwest::Client,
    geocoding_url: String,
    pollution_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    /// Create a client from provider configuration.
    ///
    /// The credential gate lives in the service; a client built without a
    /// key is never asked to make a call.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent("aircheck/0.1.0")
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self {
            client,
            geocoding_url: config.geocoding_url.clone(),
            pollution_url: config.pollution_url.clone(),
            api_key: config.api_key.clone().unwrap_or_default(),
        })
    }
}

#[async_trait]
impl GeocodeProvider for OpenWeatherClient {
    /// Resolve a free-text query to the first geocoding candidate.
    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>> {
        info!("Geocoding location: '{}'", query);
        let start = Instant::now();

        let url = format!(
            "{}?q={}&limit=1&appid={}",
            self.geocoding_url,
            urlencoding::encode(query),
            self.api_key
        );
        debug!(
            "Geocoding request URL: {}",
            url.split("appid=").next().unwrap_or(&url)
        );

        let candidates: Vec<wire::GeoCandidate> = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| "Failed to parse geocoding response")?;

        let coordinates = candidates.first().map(|candidate| Coordinates {
            latitude: candidate.lat,
            longitude: candidate.lon,
        });

        match &coordinates {
            Some(coords) => info!(
                "Resolved '{}' to {} in {:.3}s",
                query,
                coords.display(),
                start.elapsed().as_secs_f64()
            ),
            None => warn!("No geocoding candidate for '{}'", query),
        }

        Ok(coordinates)
    }
}

#[async_trait]
impl AirQualityProvider for OpenWeatherClient {
    /// Fetch the current pollution reading for the given coordinates.
    #[instrument(skip(self))]
    async fn current_air_quality(&self, lat: f64, lon: f64) -> Result<Option<AirQualityReading>> {
        info!("Fetching air quality for ({}, {})", lat, lon);
        let start = Instant::now();

        let url = format!(
            "{}?lat={}&lon={}&appid={}",
            self.pollution_url, lat, lon, self.api_key
        );
        debug!(
            "Air-pollution request URL: {}",
            url.split("appid=").next().unwrap_or(&url)
        );

        let response: wire::PollutionResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| "Failed to parse air-pollution response")?;

        let Some(entry) = response.list.into_iter().next() else {
            warn!("Air-pollution response carried no readings");
            return Ok(None);
        };

        let reading = entry.into_reading();
        info!(
            "Retrieved AQI {} with {} components in {:.3}s",
            reading.aqi,
            reading.components.len(),
            start.elapsed().as_secs_f64()
        );

        Ok(Some(reading))
    }
}

/// OpenWeatherMap response structures and conversions
mod wire {
    use serde::Deserialize;

    use crate::models::AirQualityReading;

    /// One direct-geocoding candidate; only the coordinates are read
    #[derive(Debug, Deserialize)]
    pub struct GeoCandidate {
        pub lat: f64,
        pub lon: f64,
    }

    /// Air-pollution response envelope
    #[derive(Debug, Deserialize)]
    pub struct PollutionResponse {
        #[serde(default)]
        pub list: Vec<PollutionEntry>,
    }

    /// One pollution reading; the current one is `list[0]`
    #[derive(Debug, Deserialize)]
    pub struct PollutionEntry {
        pub main: PollutionIndex,
        #[serde(default)]
        pub components: serde_json::Map<String, serde_json::Value>,
        pub dt: Option<i64>,
    }

    #[derive(Debug, Deserialize)]
    pub struct PollutionIndex {
        pub aqi: i64,
    }

    impl PollutionEntry {
        /// Convert to the domain reading, keeping the provider's component
        /// order and skipping any non-numeric concentration values.
        pub fn into_reading(self) -> AirQualityReading {
            let components = self
                .components
                .into_iter()
                .filter_map(|(code, value)| value.as_f64().map(|v| (code, v)))
                .collect();

            AirQualityReading {
                aqi: self.main.aqi,
                components,
                observed_at: self.dt,
            }
        }
    }
}
