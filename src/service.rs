//! Submission pipeline: validate input, geocode, fetch air quality,
//! assemble the report.
//!
//! One submission runs the whole pipeline before the next begins; any step
//! failure is terminal for that submission and maps to exactly one
//! `AirCheckError` variant. Providers and caches are injected at
//! construction so tests can substitute fakes.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::advisory::{advice_for, label_for};
use crate::cache::TtlCache;
use crate::config::AirCheckConfig;
use crate::error::AirCheckError;
use crate::models::{AirQualityReading, AirReport, Coordinates};

/// Resolves a free-text location query to coordinates.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// `Ok(None)` means the provider had no candidate; `Err` is a transport
    /// failure the caller folds into the same user-facing outcome.
    async fn geocode(&self, query: &str) -> anyhow::Result<Option<Coordinates>>;
}

/// Retrieves the current pollution reading for coordinates.
#[async_trait]
pub trait AirQualityProvider: Send + Sync {
    /// `Ok(None)` means the provider returned no current reading.
    async fn current_air_quality(
        &self,
        lat: f64,
        lon: f64,
    ) -> anyhow::Result<Option<AirQualityReading>>;
}

/// Bit-exact cache key for a coordinate pair.
fn coordinate_key(coordinates: Coordinates) -> (u64, u64) {
    (
        coordinates.latitude.to_bits(),
        coordinates.longitude.to_bits(),
    )
}

/// Orchestrates one submission end to end.
pub struct AirQualityService {
    geocoder: Arc<dyn GeocodeProvider>,
    air_quality: Arc<dyn AirQualityProvider>,
    geocode_cache: TtlCache<String, Option<Coordinates>>,
    air_quality_cache: TtlCache<(u64, u64), Option<AirQualityReading>>,
    has_credential: bool,
}

impl AirQualityService {
    /// Wire the service from configuration, with system-clock caches.
    #[must_use]
    pub fn new(
        config: &AirCheckConfig,
        geocoder: Arc<dyn GeocodeProvider>,
        air_quality: Arc<dyn AirQualityProvider>,
    ) -> Self {
        Self::with_caches(
            config.has_credential(),
            geocoder,
            air_quality,
            TtlCache::new(config.cache.geocode_ttl),
            TtlCache::new(config.cache.air_quality_ttl),
        )
    }

    /// Wire the service with explicit caches. Tests use this to inject a
    /// fake clock.
    #[must_use]
    pub fn with_caches(
        has_credential: bool,
        geocoder: Arc<dyn GeocodeProvider>,
        air_quality: Arc<dyn AirQualityProvider>,
        geocode_cache: TtlCache<String, Option<Coordinates>>,
        air_quality_cache: TtlCache<(u64, u64), Option<AirQualityReading>>,
    ) -> Self {
        Self {
            geocoder,
            air_quality,
            geocode_cache,
            air_quality_cache,
            has_credential,
        }
    }

    /// Run one submission through the pipeline.
    #[instrument(skip(self))]
    pub async fn check(&self, raw_query: &str) -> Result<AirReport, AirCheckError> {
        if !self.has_credential {
            warn!("Submission rejected: no API credential configured");
            return Err(AirCheckError::MissingCredential);
        }

        let query = raw_query.trim();
        if query.is_empty() {
            return Err(AirCheckError::EmptyInput);
        }

        let coordinates = self
            .geocode_cached(query)
            .await?
            .ok_or(AirCheckError::GeocodeNotFound)?;

        let reading = self
            .air_quality_cached(coordinates)
            .await?
            .ok_or(AirCheckError::AirQualityUnavailable)?;

        info!(
            "Report ready for '{}': AQI {} at {}",
            query,
            reading.aqi,
            coordinates.display()
        );

        Ok(AirReport {
            query: query.to_string(),
            coordinates,
            label: label_for(reading.aqi),
            advice: advice_for(reading.aqi),
            reading,
        })
    }

    /// Geocode through the memo cache. Lookup results (including misses at
    /// the provider) are cached; transport errors are folded and not cached.
    async fn geocode_cached(
        &self,
        query: &str,
    ) -> Result<Option<Coordinates>, AirCheckError> {
        if let Some(hit) = self.geocode_cache.get(&query.to_string()) {
            debug!("Geocode cache hit for '{}'", query);
            return Ok(hit);
        }

        match self.geocoder.geocode(query).await {
            Ok(result) => {
                self.geocode_cache.insert(query.to_string(), result);
                Ok(result)
            }
            Err(error) => {
                warn!("Geocoding failed for '{}': {:#}", query, error);
                Err(AirCheckError::GeocodeNotFound)
            }
        }
    }

    /// Fetch air quality through the memo cache, keyed by the exact
    /// coordinate pair.
    async fn air_quality_cached(
        &self,
        coordinates: Coordinates,
    ) -> Result<Option<AirQualityReading>, AirCheckError> {
        let key = coordinate_key(coordinates);
        if let Some(hit) = self.air_quality_cache.get(&key) {
            debug!("Air-quality cache hit for {}", coordinates.display());
            return Ok(hit);
        }

        match self
            .air_quality
            .current_air_quality(coordinates.latitude, coordinates.longitude)
            .await
        {
            Ok(result) => {
                self.air_quality_cache.insert(key, result.clone());
                Ok(result)
            }
            Err(error) => {
                warn!(
                    "Air-quality fetch failed for {}: {:#}",
                    coordinates.display(),
                    error
                );
                Err(AirCheckError::AirQualityUnavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_support::FakeClock;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Scripted geocoder that counts outbound calls.
    struct ScriptedGeocoder {
        result: Option<Coordinates>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl ScriptedGeocoder {
        fn returning(result: Option<Coordinates>) -> Self {
            Self {
                result,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                result: None,
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GeocodeProvider for ScriptedGeocoder {
        async fn geocode(&self, _query: &str) -> anyhow::Result<Option<Coordinates>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(anyhow!("connection timed out"));
            }
            Ok(self.result)
        }
    }

    /// Scripted pollution provider recording the coordinates it was given.
    struct ScriptedAirQuality {
        result: Option<AirQualityReading>,
        fail: bool,
        calls: AtomicUsize,
        seen: std::sync::Mutex<Vec<(f64, f64)>>,
    }

    impl ScriptedAirQuality {
        fn returning(result: Option<AirQualityReading>) -> Self {
            Self {
                result,
                fail: false,
                calls: AtomicUsize::new(0),
                seen: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                result: None,
                fail: true,
                calls: AtomicUsize::new(0),
                seen: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn seen(&self) -> Vec<(f64, f64)> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AirQualityProvider for ScriptedAirQuality {
        async fn current_air_quality(
            &self,
            lat: f64,
            lon: f64,
        ) -> anyhow::Result<Option<AirQualityReading>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push((lat, lon));
            if self.fail {
                return Err(anyhow!("bad gateway"));
            }
            Ok(self.result.clone())
        }
    }

    fn taipei() -> Coordinates {
        Coordinates {
            latitude: 25.03,
            longitude: 121.56,
        }
    }

    fn fair_reading() -> AirQualityReading {
        AirQualityReading {
            aqi: 2,
            components: vec![("pm2_5".to_string(), 15.2), ("o3".to_string(), 40.1)],
            observed_at: Some(1693765200),
        }
    }

    fn service_with(
        geocoder: Arc<ScriptedGeocoder>,
        air_quality: Arc<ScriptedAirQuality>,
    ) -> AirQualityService {
        AirQualityService::with_caches(
            true,
            geocoder,
            air_quality,
            TtlCache::new(Duration::from_secs(600)),
            TtlCache::new(Duration::from_secs(300)),
        )
    }

    #[tokio::test]
    async fn test_successful_submission() {
        let geocoder = Arc::new(ScriptedGeocoder::returning(Some(taipei())));
        let air_quality = Arc::new(ScriptedAirQuality::returning(Some(fair_reading())));
        let service = service_with(geocoder, air_quality.clone());

        let report = service.check("Taipei").await.unwrap();

        assert_eq!(report.query, "Taipei");
        assert_eq!(report.coordinates, taipei());
        assert_eq!(report.reading.aqi, 2);
        assert_eq!(report.label, "Fair");
        assert_eq!(
            report.advice,
            "Acceptable air quality. Minor precautions for sensitive groups."
        );
        // Coordinates reach the pollution provider exactly as geocoded.
        assert_eq!(air_quality.seen(), vec![(25.03, 121.56)]);
    }

    #[tokio::test]
    async fn test_missing_credential_short_circuits() {
        let geocoder = Arc::new(ScriptedGeocoder::returning(Some(taipei())));
        let air_quality = Arc::new(ScriptedAirQuality::returning(Some(fair_reading())));
        let service = AirQualityService::with_caches(
            false,
            geocoder.clone(),
            air_quality.clone(),
            TtlCache::new(Duration::from_secs(600)),
            TtlCache::new(Duration::from_secs(300)),
        );

        let error = service.check("Taipei").await.unwrap_err();

        assert_eq!(error, AirCheckError::MissingCredential);
        assert_eq!(geocoder.calls(), 0);
        assert_eq!(air_quality.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_input_short_circuits() {
        let geocoder = Arc::new(ScriptedGeocoder::returning(Some(taipei())));
        let air_quality = Arc::new(ScriptedAirQuality::returning(Some(fair_reading())));
        let service = service_with(geocoder.clone(), air_quality.clone());

        for raw in ["", "   ", "\t\n"] {
            let error = service.check(raw).await.unwrap_err();
            assert_eq!(error, AirCheckError::EmptyInput);
        }
        assert_eq!(geocoder.calls(), 0);
        assert_eq!(air_quality.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_city_stops_before_air_quality() {
        let geocoder = Arc::new(ScriptedGeocoder::returning(None));
        let air_quality = Arc::new(ScriptedAirQuality::returning(Some(fair_reading())));
        let service = service_with(geocoder, air_quality.clone());

        let error = service.check("Qwxyzzy123").await.unwrap_err();

        assert_eq!(error, AirCheckError::GeocodeNotFound);
        assert_eq!(air_quality.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_reading_list_is_unavailable() {
        let geocoder = Arc::new(ScriptedGeocoder::returning(Some(taipei())));
        let air_quality = Arc::new(ScriptedAirQuality::returning(None));
        let service = service_with(geocoder, air_quality);

        let error = service.check("Taipei").await.unwrap_err();
        assert_eq!(error, AirCheckError::AirQualityUnavailable);
    }

    #[tokio::test]
    async fn test_transport_errors_fold_into_step_failures() {
        let geocoder = Arc::new(ScriptedGeocoder::failing());
        let air_quality = Arc::new(ScriptedAirQuality::returning(Some(fair_reading())));
        let service = service_with(geocoder, air_quality);
        let error = service.check("Taipei").await.unwrap_err();
        assert_eq!(error, AirCheckError::GeocodeNotFound);

        let geocoder = Arc::new(ScriptedGeocoder::returning(Some(taipei())));
        let air_quality = Arc::new(ScriptedAirQuality::failing());
        let service = service_with(geocoder, air_quality);
        let error = service.check("Taipei").await.unwrap_err();
        assert_eq!(error, AirCheckError::AirQualityUnavailable);
    }

    #[tokio::test]
    async fn test_repeat_query_hits_cache() {
        let geocoder = Arc::new(ScriptedGeocoder::returning(Some(taipei())));
        let air_quality = Arc::new(ScriptedAirQuality::returning(Some(fair_reading())));
        let service = service_with(geocoder.clone(), air_quality.clone());

        let first = service.check("Taipei").await.unwrap();
        let second = service.check("Taipei").await.unwrap();

        assert_eq!(first.coordinates, second.coordinates);
        assert_eq!(geocoder.calls(), 1);
        assert_eq!(air_quality.calls(), 1);
    }

    #[tokio::test]
    async fn test_negative_geocode_result_is_cached() {
        let geocoder = Arc::new(ScriptedGeocoder::returning(None));
        let air_quality = Arc::new(ScriptedAirQuality::returning(Some(fair_reading())));
        let service = service_with(geocoder.clone(), air_quality);

        for _ in 0..3 {
            let error = service.check("Qwxyzzy123").await.unwrap_err();
            assert_eq!(error, AirCheckError::GeocodeNotFound);
        }
        assert_eq!(geocoder.calls(), 1);
    }

    #[tokio::test]
    async fn test_transport_errors_are_not_cached() {
        let geocoder = Arc::new(ScriptedGeocoder::failing());
        let air_quality = Arc::new(ScriptedAirQuality::returning(Some(fair_reading())));
        let service = service_with(geocoder.clone(), air_quality);

        let _ = service.check("Taipei").await.unwrap_err();
        let _ = service.check("Taipei").await.unwrap_err();

        // Each submission retries the provider instead of replaying a failure.
        assert_eq!(geocoder.calls(), 2);
    }

    #[tokio::test]
    async fn test_geocode_cache_expires_after_ttl() {
        let clock = Arc::new(FakeClock::new());
        let geocoder = Arc::new(ScriptedGeocoder::returning(Some(taipei())));
        let air_quality = Arc::new(ScriptedAirQuality::returning(Some(fair_reading())));
        let service = AirQualityService::with_caches(
            true,
            geocoder.clone(),
            air_quality.clone(),
            TtlCache::with_clock(Duration::from_secs(600), clock.clone()),
            TtlCache::with_clock(Duration::from_secs(300), clock.clone()),
        );

        service.check("Taipei").await.unwrap();
        clock.advance(Duration::from_secs(599));
        service.check("Taipei").await.unwrap();
        assert_eq!(geocoder.calls(), 1);

        clock.advance(Duration::from_secs(2));
        service.check("Taipei").await.unwrap();
        assert_eq!(geocoder.calls(), 2);
        // The shorter air-quality window lapsed at the 5 minute mark.
        assert_eq!(air_quality.calls(), 2);
    }

    #[tokio::test]
    async fn test_query_is_trimmed_before_geocoding() {
        let geocoder = Arc::new(ScriptedGeocoder::returning(Some(taipei())));
        let air_quality = Arc::new(ScriptedAirQuality::returning(Some(fair_reading())));
        let service = service_with(geocoder.clone(), air_quality);

        let report = service.check("  Taipei  ").await.unwrap();
        assert_eq!(report.query, "Taipei");

        // Same trimmed key: second spelling hits the cache.
        service.check("Taipei").await.unwrap();
        assert_eq!(geocoder.calls(), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_aqi_degrades_to_fallbacks() {
        let reading = AirQualityReading {
            aqi: 9,
            components: vec![("pm10".to_string(), 12.0)],
            observed_at: None,
        };
        let geocoder = Arc::new(ScriptedGeocoder::returning(Some(taipei())));
        let air_quality = Arc::new(ScriptedAirQuality::returning(Some(reading)));
        let service = service_with(geocoder, air_quality);

        let report = service.check("Taipei").await.unwrap();
        assert_eq!(report.label, "Unknown");
        assert_eq!(report.advice, "No advice available.");
    }
}
