//! OpenWeatherMap response types and normalization.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Deserialize;
use skycast_core::types::round_tenths;
use skycast_core::{ForecastPoint, WeatherSnapshot};

/// Result of `/geo/1.0/zip`.
#[derive(Debug, Clone, Deserialize)]
pub struct ZipLocation {
    #[serde(default)]
    pub zip: Option<String>,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country: Option<String>,
}

/// One entry of `/geo/1.0/direct` or `/geo/1.0/reverse`.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoPlace {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// Only some geocoding backends report a postal code.
    #[serde(default, alias = "postcode", alias = "postal_code")]
    pub zip: Option<String>,
}

impl GeoPlace {
    /// "{name}, {state}" when a state is known, else "{name}, {country}".
    pub fn display_name(&self) -> String {
        match (self.state.as_deref(), self.country.as_deref()) {
            (Some(state), _) => format!("{}, {}", self.name, state),
            (None, Some(country)) => format!("{}, {}", self.name, country),
            (None, None) => self.name.clone(),
        }
    }
}

/// Condition block shared by current and forecast payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Temperature block shared by current and forecast payloads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MainReadings {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Wind {
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sun {
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

/// Raw response from `/data/2.5/weather`.
#[derive(Debug, Deserialize)]
pub struct CurrentWeatherResponse {
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub main: MainReadings,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub sys: Sun,
    #[serde(default)]
    pub visibility: Option<f64>,
}

/// One 3-hour entry of `/data/2.5/forecast`.
#[derive(Debug, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    #[serde(default)]
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub pop: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ForecastCity {
    /// Seconds east of UTC.
    #[serde(default)]
    pub timezone: Option<i32>,
}

/// Raw response from `/data/2.5/forecast`.
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub list: Vec<ForecastEntry>,
    #[serde(default)]
    pub city: ForecastCity,
}

/// Capitalize each word: "scattered clouds" becomes "Scattered Clouds".
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Scale a 0.0-1.0 probability to a whole percentage.
pub fn pop_percent(probability: f64) -> u8 {
    (probability * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Render an epoch timestamp as (`YYYY-MM-DD`, `03:00 PM`) at `offset`.
pub fn local_date_time(epoch: i64, offset: FixedOffset) -> (String, String) {
    let at = DateTime::from_timestamp(epoch, 0).unwrap_or_default().with_timezone(&offset);
    (at.format("%Y-%m-%d").to_string(), at.format("%I:%M %p").to_string())
}

impl From<CurrentWeatherResponse> for WeatherSnapshot {
    fn from(raw: CurrentWeatherResponse) -> Self {
        let condition = raw.weather.into_iter().next();
        WeatherSnapshot {
            temperature: raw.main.temp.map(round_tenths),
            feels_like: raw.main.feels_like.map(round_tenths),
            high_temp: raw.main.temp_max.map(round_tenths),
            low_temp: raw.main.temp_min.map(round_tenths),
            conditions: condition.as_ref().map(|c| title_case(&c.description)),
            humidity: raw.main.humidity,
            wind_speed: raw.wind.speed,
            pressure: raw.main.pressure,
            visibility: raw.visibility,
            icon: condition.and_then(|c| c.icon),
            sunrise: raw.sys.sunrise,
            sunset: raw.sys.sunset,
        }
    }
}

impl ForecastResponse {
    /// Normalize every 3-hour entry, in upstream order.
    ///
    /// Dates and times use the city's offset when reported, else UTC.
    /// Entries without a temperature reading are dropped.
    pub fn into_points(self) -> Vec<ForecastPoint> {
        let offset = self.city.timezone.and_then(FixedOffset::east_opt).unwrap_or_else(|| Utc.fix());

        self.list
            .into_iter()
            .filter_map(|entry| {
                let Some(temperature) = entry.main.temp.map(round_tenths) else {
                    tracing::debug!(dt = entry.dt, "skipping forecast entry without temperature");
                    return None;
                };
                let (date, time) = local_date_time(entry.dt, offset);
                let condition = entry.weather.into_iter().next();
                Some(ForecastPoint {
                    datetime: entry.dt,
                    date,
                    time,
                    temperature,
                    feels_like: entry.main.feels_like.map(round_tenths),
                    temp_min: entry.main.temp_min.map_or(temperature, round_tenths),
                    temp_max: entry.main.temp_max.map_or(temperature, round_tenths),
                    conditions: condition.as_ref().map(|c| title_case(&c.description)).unwrap_or_default(),
                    icon: condition.and_then(|c| c.icon),
                    humidity: entry.main.humidity,
                    wind_speed: entry.wind.speed,
                    pop: pop_percent(entry.pop.unwrap_or_default()),
                })
            })
            .collect()
    }
}
