//! OpenWeatherMap API client.
//!
//! Thin typed wrapper over the five endpoints the pipeline uses:
//!
//! - `GET /geo/1.0/zip`: zip code to coordinates (US only)
//! - `GET /geo/1.0/direct`: free-text place lookup, first match
//! - `GET /geo/1.0/reverse`: coordinates to place, first match
//! - `GET /data/2.5/weather`: current conditions, imperial units
//! - `GET /data/2.5/forecast`: 5-day / 3-hour forecast, imperial units
//!
//! Authentication is the `appid` query parameter. It is never logged.

pub mod error;
pub mod response;

pub use error::OpenWeatherError;
pub use response::{CurrentWeatherResponse, ForecastResponse, GeoPlace, ZipLocation};

use reqwest::header;
use serde::de::DeserializeOwned;
use skycast_core::AppConfig;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default base URL for OpenWeatherMap.
const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "skycast/0.1";

/// Units requested from the weather endpoints.
const UNITS: &str = "imperial";

/// OpenWeatherMap client configuration.
#[derive(Debug, Clone)]
pub struct OpenWeatherConfig {
    /// API key (`SKYCAST_API_KEY`).
    pub api_key: String,
    /// Base URL (default: https://api.openweathermap.org).
    pub base_url: String,
    /// Request timeout (default: 10s).
    pub timeout: Duration,
    /// User-agent string (default: skycast/0.x).
    pub user_agent: String,
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&AppConfig> for OpenWeatherConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            api_key: config.api_key.clone().unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// OpenWeatherMap API client.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: reqwest::Client,
    config: OpenWeatherConfig,
}

impl OpenWeatherClient {
    /// Create a new client with the given configuration.
    ///
    /// A blank API key is rejected here so a misconfigured process fails at
    /// startup rather than on the first request.
    pub fn new(config: OpenWeatherConfig) -> Result<Self, OpenWeatherError> {
        if config.api_key.trim().is_empty() {
            return Err(OpenWeatherError::MissingApiKey);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OpenWeatherError::Network(Arc::new(e)))?;

        Ok(Self { http, config })
    }

    /// Look up a US zip code.
    pub async fn zip_lookup(&self, zip: &str) -> Result<ZipLocation, OpenWeatherError> {
        self.get_json("/geo/1.0/zip", &[("zip", format!("{zip},US"))]).await
    }

    /// First free-text match for `query`, if any.
    pub async fn direct(&self, query: &str) -> Result<Option<GeoPlace>, OpenWeatherError> {
        let places: Vec<GeoPlace> =
            self.get_json("/geo/1.0/direct", &[("q", query.to_string()), ("limit", "1".to_string())]).await?;
        Ok(places.into_iter().next())
    }

    /// First place at the given coordinates, if any.
    pub async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<GeoPlace>, OpenWeatherError> {
        let places: Vec<GeoPlace> = self
            .get_json(
                "/geo/1.0/reverse",
                &[("lat", lat.to_string()), ("lon", lon.to_string()), ("limit", "1".to_string())],
            )
            .await?;
        Ok(places.into_iter().next())
    }

    /// Current conditions at a point.
    pub async fn current(&self, lat: f64, lon: f64) -> Result<CurrentWeatherResponse, OpenWeatherError> {
        self.get_json(
            "/data/2.5/weather",
            &[("lat", lat.to_string()), ("lon", lon.to_string()), ("units", UNITS.to_string())],
        )
        .await
    }

    /// 3-hour forecast at a point.
    pub async fn forecast(&self, lat: f64, lon: f64) -> Result<ForecastResponse, OpenWeatherError> {
        self.get_json(
            "/data/2.5/forecast",
            &[("lat", lat.to_string()), ("lon", lon.to_string()), ("units", UNITS.to_string())],
        )
        .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self, path: &str, params: &[(&str, String)],
    ) -> Result<T, OpenWeatherError> {
        let start = Instant::now();
        let url = format!("{}{}", self.config.base_url, path);

        tracing::debug!(%url, ?params, "requesting OpenWeatherMap");

        let http_response = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, &self.config.user_agent)
            .query(params)
            .query(&[("appid", self.config.api_key.as_str())])
            .send()
            .await?;

        let status = http_response.status();
        tracing::debug!(%url, %status, elapsed = ?start.elapsed(), "OpenWeatherMap response");

        if !status.is_success() {
            return Err(OpenWeatherError::from_status(status));
        }

        let bytes = http_response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| OpenWeatherError::Parse(e.to_string()))
    }
}
