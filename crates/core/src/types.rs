//! Weather, forecast and geocode data types shared by every crate.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Round to one decimal place, the precision every temperature is kept at.
pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// A resolved location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeocodeResult {
    pub lat: f64,
    pub lon: f64,
    /// Five-digit zip, when the provider (or a reverse lookup) produced one.
    pub zip: Option<String>,
    /// Display name, e.g. "Leeds, AL".
    pub location: String,
}

/// Current conditions at a point, temperatures in Fahrenheit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WeatherSnapshot {
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    pub high_temp: Option<f64>,
    pub low_temp: Option<f64>,
    pub conditions: Option<String>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub pressure: Option<f64>,
    pub visibility: Option<f64>,
    pub icon: Option<String>,
    /// Epoch seconds, passed through from upstream.
    pub sunrise: Option<i64>,
    /// Epoch seconds, passed through from upstream.
    pub sunset: Option<i64>,
}

/// One 3-hour forecast interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ForecastPoint {
    /// Epoch seconds of the interval start.
    pub datetime: i64,
    /// `YYYY-MM-DD`
    pub date: String,
    /// 12-hour clock, e.g. `03:00 PM`
    pub time: String,
    pub temperature: f64,
    #[serde(default, alias = "feelsLike")]
    pub feels_like: Option<f64>,
    #[serde(alias = "tempMin")]
    pub temp_min: f64,
    #[serde(alias = "tempMax")]
    pub temp_max: f64,
    #[serde(default)]
    pub conditions: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default, alias = "windSpeed")]
    pub wind_speed: Option<f64>,
    /// Probability of precipitation, 0-100.
    #[serde(default)]
    pub pop: u8,
}

/// Structured `forecast_data` blob persisted alongside a cache entry.
///
/// Every field is optional so rows written before a field existed still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ForecastData {
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default, alias = "windSpeed")]
    pub wind_speed: Option<f64>,
    #[serde(default, alias = "feelsLike")]
    pub feels_like: Option<f64>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub sunrise: Option<i64>,
    #[serde(default)]
    pub sunset: Option<i64>,
    #[serde(default)]
    pub forecast: Option<Vec<ForecastPoint>>,
}

impl ForecastData {
    /// Build the blob for a fresh fetch.
    pub fn from_parts(snapshot: &WeatherSnapshot, forecast: Option<&[ForecastPoint]>) -> Self {
        Self {
            humidity: snapshot.humidity,
            wind_speed: snapshot.wind_speed,
            feels_like: snapshot.feels_like,
            icon: snapshot.icon.clone(),
            sunrise: snapshot.sunrise,
            sunset: snapshot.sunset,
            forecast: forecast.map(<[ForecastPoint]>::to_vec),
        }
    }

    /// Whether the blob carries a non-empty forecast.
    pub fn has_forecast(&self) -> bool {
        self.forecast.as_ref().is_some_and(|points| !points.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_tenths() {
        assert_eq!(round_tenths(72.49), 72.5);
        assert_eq!(round_tenths(72.51), 72.5);
        assert_eq!(round_tenths(-3.04), -3.0);
        assert_eq!(round_tenths(68.0), 68.0);
    }

    #[test]
    fn test_legacy_blob_keys() {
        let json = r#"{
            "windSpeed": 4.5,
            "feelsLike": 70.1,
            "forecast": [
                {"datetime": 1700000000, "date": "2023-11-14", "time": "10:13 PM",
                 "temperature": 55.0, "tempMin": 50.0, "tempMax": 58.0,
                 "feelsLike": 53.2, "windSpeed": 3.0, "conditions": "Clear Sky", "pop": 20}
            ]
        }"#;

        let blob: ForecastData = serde_json::from_str(json).unwrap();
        assert_eq!(blob.wind_speed, Some(4.5));
        assert_eq!(blob.feels_like, Some(70.1));
        assert!(blob.has_forecast());

        let point = &blob.forecast.as_ref().unwrap()[0];
        assert_eq!(point.temp_min, 50.0);
        assert_eq!(point.temp_max, 58.0);
        assert_eq!(point.feels_like, Some(53.2));

        let reencoded = serde_json::to_string(&blob).unwrap();
        assert!(reencoded.contains("\"wind_speed\""));
        assert!(reencoded.contains("\"temp_min\""));
        assert!(!reencoded.contains("tempMin"));
    }

    #[test]
    fn test_empty_blob() {
        let blob: ForecastData = serde_json::from_str("{}").unwrap();
        assert_eq!(blob, ForecastData::default());
        assert!(!blob.has_forecast());

        let blob = ForecastData { forecast: Some(vec![]), ..Default::default() };
        assert!(!blob.has_forecast());
    }

    #[test]
    fn test_from_parts() {
        let snapshot = WeatherSnapshot {
            temperature: Some(72.5),
            humidity: Some(40.0),
            wind_speed: Some(5.8),
            feels_like: Some(71.0),
            icon: Some("01d".into()),
            sunrise: Some(1_700_000_000),
            sunset: Some(1_700_040_000),
            ..Default::default()
        };

        let blob = ForecastData::from_parts(&snapshot, None);
        assert_eq!(blob.humidity, Some(40.0));
        assert_eq!(blob.icon.as_deref(), Some("01d"));
        assert_eq!(blob.sunset, Some(1_700_040_000));
        assert!(blob.forecast.is_none());
    }
}
