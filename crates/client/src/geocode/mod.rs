//! Address to coordinates resolution.
//!
//! [`CascadingGeocoder`] tries progressively looser strategies against
//! OpenWeatherMap and returns the first success:
//!
//! 1. zip-direct, when the address contains a 5-digit token
//! 2. city/state parsed out of the address
//! 3. the full address as free text
//!
//! Free-text matches without a postal code are backfilled with a reverse
//! lookup, falling back to the zip found in the address.

pub mod address;

pub use address::parse_city_state;

use crate::openweather::OpenWeatherClient;
use skycast_core::zip::extract_zip;
use skycast_core::{Error, GeocodeResult};

/// Resolves a free-form address to a location.
#[async_trait::async_trait]
pub trait GeocodeResolver: Send + Sync {
    /// Resolve `address`.
    ///
    /// Failures come back as user-facing [`Error`] values; implementations
    /// never panic or leak transport errors past this boundary.
    async fn geocode(&self, address: &str) -> Result<GeocodeResult, Error>;
}

/// Geocoder that cascades through zip, city/state and full-text lookups.
#[derive(Debug, Clone)]
pub struct CascadingGeocoder {
    client: OpenWeatherClient,
}

impl CascadingGeocoder {
    pub fn new(client: OpenWeatherClient) -> Self {
        Self { client }
    }

    async fn by_zip(&self, zip: &str) -> Result<GeocodeResult, Error> {
        let found = self.client.zip_lookup(zip).await?;
        let country = found.country.as_deref().unwrap_or("US");
        Ok(GeocodeResult {
            lat: found.lat,
            lon: found.lon,
            zip: found.zip.as_deref().and_then(extract_zip).or_else(|| Some(zip.to_string())),
            location: format!("{}, {}", found.name, country),
        })
    }

    async fn by_text(&self, query: &str, fallback_zip: Option<&str>) -> Result<GeocodeResult, Error> {
        let place = self.client.direct(query).await?.ok_or(Error::NoLocation)?;

        let zip = match place.zip.as_deref().and_then(extract_zip) {
            Some(zip) => Some(zip),
            None => self.reverse_zip(place.lat, place.lon).await,
        };

        Ok(GeocodeResult {
            lat: place.lat,
            lon: place.lon,
            zip: zip.or_else(|| fallback_zip.map(str::to_string)),
            location: place.display_name(),
        })
    }

    /// Best-effort postal code at a point. Failures only cost the zip.
    async fn reverse_zip(&self, lat: f64, lon: f64) -> Option<String> {
        match self.client.reverse(lat, lon).await {
            Ok(place) => place.and_then(|p| p.zip).as_deref().and_then(extract_zip),
            Err(e) => {
                tracing::debug!(lat, lon, error = %e, "reverse geocode failed");
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl GeocodeResolver for CascadingGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodeResult, Error> {
        let address = address.trim();
        if address.is_empty() {
            return Err(Error::InvalidInput("Address cannot be blank".into()));
        }

        let zip = extract_zip(address);
        let mut last_error = None;

        if let Some(zip) = zip.as_deref() {
            match self.by_zip(zip).await {
                Ok(found) => return Ok(found),
                Err(e) => {
                    tracing::warn!(zip, error = %e, "zip geocode failed");
                    last_error = Some(e);
                }
            }
        }

        let city_state = parse_city_state(address);
        if let Some(query) = city_state.as_deref() {
            match self.by_text(query, zip.as_deref()).await {
                Ok(found) => return Ok(found),
                Err(e) => {
                    tracing::warn!(query, error = %e, "city/state geocode failed");
                    last_error = Some(e);
                }
            }
        }

        if city_state.as_deref() != Some(address) {
            match self.by_text(address, zip.as_deref()).await {
                Ok(found) => return Ok(found),
                Err(e) => {
                    tracing::warn!(error = %e, "full address geocode failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(Error::NoLocation))
    }
}
