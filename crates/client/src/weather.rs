//! Current conditions and 3-hour forecasts for a point.

use crate::openweather::OpenWeatherClient;
use skycast_core::{Error, ForecastPoint, WeatherSnapshot};

/// Weather data source.
#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current conditions at (`lat`, `lon`).
    async fn fetch_current(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, Error>;

    /// 3-hour forecast points at (`lat`, `lon`), in upstream order.
    async fn fetch_forecast(&self, lat: f64, lon: f64) -> Result<Vec<ForecastPoint>, Error>;
}

/// NaN and infinities stand in for a missing coordinate.
fn check_coordinates(lat: f64, lon: f64) -> Result<(), Error> {
    if lat.is_finite() && lon.is_finite() { Ok(()) } else { Err(Error::missing_coordinates()) }
}

/// [`WeatherProvider`] backed by OpenWeatherMap.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    client: OpenWeatherClient,
}

impl OpenWeatherProvider {
    pub fn new(client: OpenWeatherClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_current(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, Error> {
        check_coordinates(lat, lon)?;

        let raw = self.client.current(lat, lon).await.map_err(|e| {
            tracing::warn!(lat, lon, error = %e, "current weather request failed");
            Error::from(e)
        })?;

        Ok(WeatherSnapshot::from(raw))
    }

    async fn fetch_forecast(&self, lat: f64, lon: f64) -> Result<Vec<ForecastPoint>, Error> {
        check_coordinates(lat, lon)?;

        let raw = self.client.forecast(lat, lon).await.map_err(|e| {
            tracing::warn!(lat, lon, error = %e, "forecast request failed");
            Error::from(e)
        })?;

        Ok(raw.into_points())
    }
}
