//! Forecast pipeline.
//!
//! Ties the cache, geocoder and weather provider together:
//! cache by address zip, then geocode, then cache by resolved zip, then a
//! fresh fetch that is written back to the cache. Every stage is awaited
//! before the next one starts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use skycast_client::{GeocodeResolver, WeatherProvider};
use skycast_core::zip::extract_zip;
use skycast_core::{CacheDb, CacheEntry, Error, ForecastPoint, GeocodeResult, WeatherSnapshot};
use std::sync::Arc;

/// Where an address resolved to.
#[derive(Debug, Clone, PartialEq)]
struct Resolution {
    lat: f64,
    lon: f64,
    location: String,
    zip: Option<String>,
}

impl Resolution {
    /// The address zip wins over whatever the geocoder reported.
    fn new(found: GeocodeResult, address_zip: Option<String>) -> Self {
        Self { lat: found.lat, lon: found.lon, location: found.location, zip: address_zip.or(found.zip) }
    }
}

/// A successful forecast lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    pub from_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_status: Option<String>,
    pub weather: WeatherSnapshot,
    pub forecast: Option<Vec<ForecastPoint>>,
    pub location: String,
    pub zip_code: Option<String>,
}

/// Wire shape of a forecast call: `{success: true, ...report}` or
/// `{success: false, error}`.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: Option<ForecastReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<ForecastReport, Error>> for ForecastResponse {
    fn from(result: Result<ForecastReport, Error>) -> Self {
        match result {
            Ok(report) => Self { success: true, report: Some(report), error: None },
            Err(e) => Self { success: false, report: None, error: Some(e.to_string()) },
        }
    }
}

/// Runs the forecast pipeline.
pub struct ForecastOrchestrator {
    geocoder: Arc<dyn GeocodeResolver>,
    weather: Arc<dyn WeatherProvider>,
    cache: CacheDb,
}

impl ForecastOrchestrator {
    pub fn new(geocoder: Arc<dyn GeocodeResolver>, weather: Arc<dyn WeatherProvider>, cache: CacheDb) -> Self {
        Self { geocoder, weather, cache }
    }

    pub fn cache(&self) -> &CacheDb {
        &self.cache
    }

    /// Current weather (and optionally the 3-hour forecast) for `address`.
    ///
    /// Validation and upstream errors come back unchanged. Anything else is
    /// reported as [`Error::Unexpected`].
    pub async fn get_forecast(&self, address: &str, include_forecast: bool) -> Result<ForecastReport, Error> {
        if address.trim().is_empty() {
            return Err(Error::InvalidInput("Address is required".into()));
        }

        self.run(address, include_forecast).await.map_err(surface)
    }

    async fn run(&self, address: &str, include_forecast: bool) -> Result<ForecastReport, Error> {
        let address_zip = extract_zip(address);

        if let Some(zip) = address_zip.as_deref()
            && let Some(hit) = self.cached(zip, include_forecast).await?
        {
            return Ok(self.from_cache(hit, None));
        }

        let found = self.geocoder.geocode(address).await?;
        let resolution = Resolution::new(found, address_zip);

        if let Some(zip) = resolution.zip.as_deref()
            && let Some(hit) = self.cached(zip, include_forecast).await?
        {
            return Ok(self.from_cache(hit, Some(resolution.location)));
        }

        self.fetch_fresh(resolution, include_forecast).await
    }

    /// Fresh cache entry for `zip` that can answer this request.
    async fn cached(&self, zip: &str, include_forecast: bool) -> Result<Option<CacheEntry>, Error> {
        let entry = self.cache.find_valid(zip).await?;
        Ok(entry.filter(|hit| {
            let usable = !include_forecast || hit.has_forecast();
            if !usable {
                tracing::debug!(zip, id = hit.id, "cached entry has no forecast, refetching");
            }
            usable
        }))
    }

    fn from_cache(&self, entry: CacheEntry, location: Option<String>) -> ForecastReport {
        let status = self.cache.status_label(&entry);
        let blob = entry.forecast_data.unwrap_or_default();

        tracing::debug!(zip_code = %entry.zip_code, %status, "serving forecast from cache");

        ForecastReport {
            from_cache: true,
            cached_at: Some(entry.cached_at),
            cache_status: Some(status),
            weather: WeatherSnapshot {
                temperature: entry.temperature,
                feels_like: blob.feels_like,
                high_temp: entry.high_temp,
                low_temp: entry.low_temp,
                conditions: entry.conditions,
                humidity: blob.humidity,
                wind_speed: blob.wind_speed,
                pressure: None,
                visibility: None,
                icon: blob.icon,
                sunrise: blob.sunrise,
                sunset: blob.sunset,
            },
            forecast: blob.forecast,
            location: location.or(entry.location).unwrap_or_default(),
            zip_code: Some(entry.zip_code),
        }
    }

    async fn fetch_fresh(&self, resolution: Resolution, include_forecast: bool) -> Result<ForecastReport, Error> {
        let Resolution { lat, lon, location, zip } = resolution;

        let weather = self.weather.fetch_current(lat, lon).await?;

        let forecast = if include_forecast {
            match self.weather.fetch_forecast(lat, lon).await {
                Ok(points) => Some(points),
                Err(e) => {
                    tracing::warn!(lat, lon, error = %e, "forecast unavailable, returning current conditions only");
                    None
                }
            }
        } else {
            None
        };

        tracing::info!(%location, zip_code = ?zip, include_forecast, "fetched fresh weather");

        if let Some(zip) = zip.as_deref()
            && let Err(e) = self.cache.store(zip, &location, &weather, forecast.as_deref()).await
        {
            tracing::warn!(zip, error = %e, "failed to cache forecast");
        }

        Ok(ForecastReport {
            from_cache: false,
            cached_at: None,
            cache_status: None,
            weather,
            forecast,
            location,
            zip_code: zip,
        })
    }
}

/// Pass user-facing errors through; wrap internal faults.
fn surface(err: Error) -> Error {
    if err.is_user_facing() {
        err
    } else {
        tracing::error!(error = %err, code = err.code(), "forecast pipeline failed");
        Error::Unexpected(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use skycast_core::FixedClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingGeocoder {
        found: Option<GeocodeResult>,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl GeocodeResolver for RecordingGeocoder {
        async fn geocode(&self, _address: &str) -> Result<GeocodeResult, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.found.clone().ok_or(Error::NoLocation)
        }
    }

    #[derive(Default)]
    struct RecordingWeather {
        current: Option<WeatherSnapshot>,
        forecast: Option<Vec<ForecastPoint>>,
        current_calls: AtomicUsize,
        forecast_calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl WeatherProvider for RecordingWeather {
        async fn fetch_current(&self, _lat: f64, _lon: f64) -> Result<WeatherSnapshot, Error> {
            self.current_calls.fetch_add(1, Ordering::SeqCst);
            self.current.clone().ok_or(Error::RateLimited)
        }

        async fn fetch_forecast(&self, _lat: f64, _lon: f64) -> Result<Vec<ForecastPoint>, Error> {
            self.forecast_calls.fetch_add(1, Ordering::SeqCst);
            self.forecast.clone().ok_or(Error::HttpStatus(500))
        }
    }

    impl RecordingGeocoder {
        fn returning(zip: Option<&str>, location: &str) -> Self {
            Self {
                found: Some(GeocodeResult {
                    lat: 40.7484,
                    lon: -73.9967,
                    zip: zip.map(str::to_string),
                    location: location.to_string(),
                }),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RecordingWeather {
        fn sunny() -> Self {
            Self { current: Some(snapshot(72.5)), forecast: Some(forecast()), ..Default::default() }
        }

        fn current_calls(&self) -> usize {
            self.current_calls.load(Ordering::SeqCst)
        }

        fn forecast_calls(&self) -> usize {
            self.forecast_calls.load(Ordering::SeqCst)
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn snapshot(temp: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature: Some(temp),
            feels_like: Some(temp - 1.0),
            high_temp: Some(80.0),
            low_temp: Some(65.0),
            conditions: Some("Clear Sky".into()),
            humidity: Some(40.0),
            wind_speed: Some(5.8),
            pressure: Some(1015.0),
            visibility: Some(10000.0),
            icon: Some("01d".into()),
            sunrise: Some(1_717_236_000),
            sunset: Some(1_717_288_000),
        }
    }

    fn forecast() -> Vec<ForecastPoint> {
        vec![ForecastPoint {
            datetime: 1_717_254_000,
            date: "2024-06-01".into(),
            time: "03:00 PM".into(),
            temperature: 78.2,
            feels_like: Some(77.9),
            temp_min: 76.0,
            temp_max: 79.1,
            conditions: "Few Clouds".into(),
            icon: Some("02d".into()),
            humidity: Some(35.0),
            wind_speed: Some(6.1),
            pop: 10,
        }]
    }

    struct Harness {
        geocoder: Arc<RecordingGeocoder>,
        weather: Arc<RecordingWeather>,
        cache: CacheDb,
        orchestrator: ForecastOrchestrator,
    }

    async fn harness(geocoder: RecordingGeocoder, weather: RecordingWeather) -> Harness {
        let cache = CacheDb::open_in_memory().await.unwrap().with_clock(FixedClock(t0()));
        harness_with_cache(geocoder, weather, cache)
    }

    fn harness_with_cache(geocoder: RecordingGeocoder, weather: RecordingWeather, cache: CacheDb) -> Harness {
        let geocoder = Arc::new(geocoder);
        let weather = Arc::new(weather);
        let orchestrator = ForecastOrchestrator::new(geocoder.clone(), weather.clone(), cache.clone());
        Harness { geocoder, weather, cache, orchestrator }
    }

    #[tokio::test]
    async fn test_blank_address() {
        let h = harness(RecordingGeocoder::default(), RecordingWeather::default()).await;

        for address in ["", "   "] {
            let err = h.orchestrator.get_forecast(address, false).await.unwrap_err();
            assert_eq!(err.to_string(), "Address is required");
        }
        assert_eq!(h.geocoder.calls(), 0);
        assert_eq!(h.weather.current_calls(), 0);
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_collaborators() {
        let h = harness(RecordingGeocoder::default(), RecordingWeather::default()).await;
        h.cache.store("10001", "New York, NY", &snapshot(70.0), None).await.unwrap();

        let report = h.orchestrator.get_forecast("10001", false).await.unwrap();

        assert!(report.from_cache);
        assert_eq!(report.zip_code.as_deref(), Some("10001"));
        assert_eq!(report.location, "New York, NY");
        assert_eq!(report.weather.temperature, Some(70.0));
        assert_eq!(report.cached_at, Some(t0()));
        assert_eq!(report.cache_status.as_deref(), Some("Cached 0 minutes ago"));
        assert_eq!(h.geocoder.calls(), 0);
        assert_eq!(h.weather.current_calls(), 0);
    }

    #[tokio::test]
    async fn test_cached_weather_restores_blob_fields() {
        let h = harness(RecordingGeocoder::default(), RecordingWeather::default()).await;
        h.cache.store("35094", "Leeds, AL", &snapshot(68.4), None).await.unwrap();

        let report = h.orchestrator.get_forecast("6214 Stewart Rd. Leeds, AL. 35094", false).await.unwrap();

        let weather = report.weather;
        assert_eq!(weather.humidity, Some(40.0));
        assert_eq!(weather.wind_speed, Some(5.8));
        assert_eq!(weather.feels_like, Some(67.4));
        assert_eq!(weather.icon.as_deref(), Some("01d"));
        assert_eq!(weather.sunset, Some(1_717_288_000));
        assert_eq!(weather.conditions.as_deref(), Some("Clear Sky"));
        assert!(weather.pressure.is_none());
        assert!(report.forecast.is_none());
    }

    #[tokio::test]
    async fn test_stale_cache_refetches_and_appends() {
        let cache = CacheDb::open_in_memory().await.unwrap().with_clock(FixedClock(t0()));
        cache.store("10001", "New York, NY", &snapshot(60.0), None).await.unwrap();

        let later = cache.with_clock(FixedClock(t0() + Duration::minutes(30)));
        let h = harness_with_cache(
            RecordingGeocoder::returning(Some("10001"), "New York, NY"),
            RecordingWeather::sunny(),
            later,
        );

        let report = h.orchestrator.get_forecast("10001", false).await.unwrap();

        assert!(!report.from_cache);
        assert_eq!(report.weather.temperature, Some(72.5));
        assert_eq!(h.weather.current_calls(), 1);
        assert_eq!(h.cache.count("10001").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_miss_geocodes_fetches_and_stores() {
        let h = harness(RecordingGeocoder::returning(Some("10001"), "New York, NY"), RecordingWeather::sunny()).await;

        let report = h.orchestrator.get_forecast("New York, NY", false).await.unwrap();

        assert!(!report.from_cache);
        assert!(report.cached_at.is_none());
        assert_eq!(report.location, "New York, NY");
        assert_eq!(report.zip_code.as_deref(), Some("10001"));
        assert_eq!(report.weather.pressure, Some(1015.0));
        assert!(report.forecast.is_none());
        assert_eq!(h.geocoder.calls(), 1);
        assert_eq!(h.weather.current_calls(), 1);
        assert_eq!(h.weather.forecast_calls(), 0);
        assert_eq!(h.cache.count("10001").await.unwrap(), 1);

        let stored = h.cache.find_valid("10001").await.unwrap().unwrap();
        assert_eq!(stored.location.as_deref(), Some("New York, NY"));
    }

    #[tokio::test]
    async fn test_address_zip_preferred_over_geocoded_zip() {
        let h = harness(RecordingGeocoder::returning(Some("35080"), "Leeds, AL"), RecordingWeather::sunny()).await;

        let report = h.orchestrator.get_forecast("6214 Stewart Rd. Leeds, AL. 35094", false).await.unwrap();

        assert_eq!(report.zip_code.as_deref(), Some("35094"));
        assert_eq!(h.cache.count("35094").await.unwrap(), 1);
        assert_eq!(h.cache.count("35080").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_geocoded_zip_cache_hit_uses_geocoded_location() {
        let h = harness(RecordingGeocoder::returning(Some("10001"), "Manhattan, NY"), RecordingWeather::sunny()).await;
        h.cache.store("10001", "New York, US", &snapshot(70.0), None).await.unwrap();

        let report = h.orchestrator.get_forecast("Manhattan, NY", false).await.unwrap();

        assert!(report.from_cache);
        assert_eq!(report.location, "Manhattan, NY");
        assert_eq!(h.geocoder.calls(), 1);
        assert_eq!(h.weather.current_calls(), 0);
    }

    #[tokio::test]
    async fn test_geocode_failure_is_returned_verbatim() {
        let h = harness(RecordingGeocoder::default(), RecordingWeather::sunny()).await;

        let err = h.orchestrator.get_forecast("Nowhere Special", false).await.unwrap_err();

        assert_eq!(err.to_string(), "Unable to find location for the provided address");
        assert_eq!(h.weather.current_calls(), 0);
    }

    #[tokio::test]
    async fn test_weather_failure_propagates_and_caches_nothing() {
        let h = harness(RecordingGeocoder::returning(Some("10001"), "New York, NY"), RecordingWeather::default()).await;

        let err = h.orchestrator.get_forecast("New York, NY", false).await.unwrap_err();

        assert_eq!(err.to_string(), "API rate limit exceeded");
        assert_eq!(h.cache.count("10001").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_forecast_request_bypasses_entry_without_forecast() {
        let h = harness(RecordingGeocoder::returning(Some("10001"), "New York, NY"), RecordingWeather::sunny()).await;
        h.cache.store("10001", "New York, NY", &snapshot(70.0), None).await.unwrap();

        let report = h.orchestrator.get_forecast("10001", true).await.unwrap();

        assert!(!report.from_cache);
        assert_eq!(report.forecast, Some(forecast()));
        assert_eq!(h.weather.current_calls(), 1);
        assert_eq!(h.weather.forecast_calls(), 1);
        assert_eq!(h.cache.count("10001").await.unwrap(), 2);

        let newest = h.cache.find_valid("10001").await.unwrap().unwrap();
        assert!(newest.has_forecast());

        let again = h.orchestrator.get_forecast("10001", true).await.unwrap();
        assert!(again.from_cache);
        assert_eq!(again.forecast, Some(forecast()));
        assert_eq!(h.weather.current_calls(), 1);
    }

    #[tokio::test]
    async fn test_forecast_failure_is_swallowed() {
        let weather = RecordingWeather { current: Some(snapshot(72.5)), ..Default::default() };
        let h = harness(RecordingGeocoder::returning(Some("10001"), "New York, NY"), weather).await;

        let report = h.orchestrator.get_forecast("New York, NY", true).await.unwrap();

        assert!(report.forecast.is_none());
        assert_eq!(report.weather.temperature, Some(72.5));
        assert_eq!(h.weather.forecast_calls(), 1);
        assert_eq!(h.cache.count("10001").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_no_zip_anywhere_skips_cache() {
        let h = harness(RecordingGeocoder::returning(None, "Paris, FR"), RecordingWeather::sunny()).await;

        let report = h.orchestrator.get_forecast("Paris", false).await.unwrap();

        assert!(!report.from_cache);
        assert!(report.zip_code.is_none());
        assert_eq!(h.weather.current_calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_write_failure_is_ignored() {
        let h = harness(RecordingGeocoder::returning(Some("1234"), "Odd Place, XX"), RecordingWeather::sunny()).await;

        let report = h.orchestrator.get_forecast("Odd Place, XX", false).await.unwrap();

        assert!(!report.from_cache);
        assert_eq!(report.zip_code.as_deref(), Some("1234"));
        assert_eq!(h.cache.count("1234").await.unwrap(), 0);
    }

    struct GarbledGeocoder;

    #[async_trait::async_trait]
    impl GeocodeResolver for GarbledGeocoder {
        async fn geocode(&self, _address: &str) -> Result<GeocodeResult, Error> {
            Err(Error::Serialization("expected value at line 1 column 1".into()))
        }
    }

    #[tokio::test]
    async fn test_internal_failure_surfaces_as_unexpected() {
        let cache = CacheDb::open_in_memory().await.unwrap().with_clock(FixedClock(t0()));
        let weather = Arc::new(RecordingWeather::sunny());
        let orchestrator = ForecastOrchestrator::new(Arc::new(GarbledGeocoder), weather.clone(), cache.clone());

        let err = orchestrator.get_forecast("Leeds, AL 35094", false).await.unwrap_err();

        assert!(matches!(err, Error::Unexpected(_)));
        assert_eq!(
            err.to_string(),
            "An unexpected error occurred: serialization failed: expected value at line 1 column 1"
        );
        assert_eq!(weather.current_calls(), 0);
        assert_eq!(cache.count("35094").await.unwrap(), 0);

        let response = ForecastResponse::from(Err(err));
        assert!(!response.success);
        assert!(response.error.unwrap().starts_with("An unexpected error occurred: "));
    }

    #[test]
    fn test_internal_errors_are_wrapped() {
        let err = surface(Error::Serialization("eof while parsing".into()));
        assert_eq!(err.to_string(), "An unexpected error occurred: serialization failed: eof while parsing");

        let err = surface(Error::LocationNotFound);
        assert_eq!(err.to_string(), "Location not found");
    }

    #[test]
    fn test_response_shapes() {
        let report = ForecastReport {
            from_cache: false,
            cached_at: None,
            cache_status: None,
            weather: WeatherSnapshot { temperature: Some(70.0), ..Default::default() },
            forecast: None,
            location: "New York, NY".into(),
            zip_code: Some("10001".into()),
        };

        let json = serde_json::to_value(ForecastResponse::from(Ok(report))).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["from_cache"], false);
        assert!(json["forecast"].is_null());
        assert_eq!(json["zip_code"], "10001");
        assert!(json.get("error").is_none());
        assert!(json.get("cached_at").is_none());

        let json = serde_json::to_value(ForecastResponse::from(Err(Error::InvalidApiKey))).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "Invalid API key"}));
    }
}
