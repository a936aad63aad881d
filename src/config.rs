//! Configuration management for the `aircheck` application
//!
//! Everything is read once from the environment at startup and passed to the
//! clients at construction. A missing API key is a reportable condition on
//! each submission, never a startup crash.

use std::env;
use std::time::Duration;

use tracing::warn;

const DEFAULT_GEOCODING_URL: &str = "http://api.openweathermap.org/geo/1.0/direct";
const DEFAULT_POLLUTION_URL: &str = "http://api.openweathermap.org/data/2.5/air_pollution";
const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_PORT: u16 = 3000;

/// Root configuration for the `aircheck` application
#[derive(Debug, Clone)]
pub struct AirCheckConfig {
    /// Provider endpoints and credential
    pub provider: ProviderConfig,
    /// Memoization windows
    pub cache: CacheConfig,
    /// Web server settings
    pub server: ServerConfig,
}

/// OpenWeatherMap endpoint settings
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API key; `None` when `OPENWEATHER_API_KEY` is unset or blank
    pub api_key: Option<String>,
    /// Direct-geocoding endpoint
    pub geocoding_url: String,
    /// Air-pollution endpoint
    pub pollution_url: String,
    /// Bound on each outbound call
    pub timeout: Duration,
}

/// TTL windows for the two memo caches. Air quality is more volatile than a
/// city's coordinates, so its window is shorter.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub geocode_ttl: Duration,
    pub air_quality_ttl: Duration,
}

/// Web server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for AirCheckConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig {
                api_key: None,
                geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
                pollution_url: DEFAULT_POLLUTION_URL.to_string(),
                timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            },
            cache: CacheConfig {
                geocode_ttl: Duration::from_secs(10 * 60),
                air_quality_ttl: Duration::from_secs(5 * 60),
            },
            server: ServerConfig { port: DEFAULT_PORT },
        }
    }
}

impl AirCheckConfig {
    /// Load configuration from the environment, falling back to defaults for
    /// anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.provider.api_key = env::var("OPENWEATHER_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        if let Ok(url) = env::var("AIRCHECK_GEOCODING_URL") {
            config.provider.geocoding_url = url;
        }
        if let Ok(url) = env::var("AIRCHECK_POLLUTION_URL") {
            config.provider.pollution_url = url;
        }

        if let Ok(raw) = env::var("AIRCHECK_PORT") {
            match raw.parse::<u16>() {
                Ok(port) => config.server.port = port,
                Err(_) => warn!("Ignoring unparsable AIRCHECK_PORT value: {raw}"),
            }
        }

        config
    }

    /// Whether an API credential is configured.
    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.provider.api_key.is_some()
    }
}
