//! `aircheck` - city-based air quality lookup
//!
//! This library resolves a city name to coordinates, retrieves the current
//! air-quality reading from OpenWeatherMap, and renders AQI, pollutant
//! concentrations and health advice through a small web UI.

pub mod advisory;
pub mod cache;
pub mod chart;
pub mod config;
pub mod error;
pub mod models;
pub mod openweather;
pub mod service;
pub mod web;

// Re-export core types for public API
pub use cache::TtlCache;
pub use config::AirCheckConfig;
pub use error::AirCheckError;
pub use models::{AirQualityReading, AirReport, Coordinates};
pub use openweather::OpenWeatherClient;
pub use service::{AirQualityProvider, AirQualityService, GeocodeProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AirCheckError>;
