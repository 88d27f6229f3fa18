//! Upstream clients for skycast.
//!
//! This crate provides the OpenWeatherMap HTTP client, the cascading
//! geocoder and the weather provider used by the server.

pub mod geocode;
pub mod openweather;
pub mod weather;

pub use geocode::{CascadingGeocoder, GeocodeResolver, parse_city_state};
pub use openweather::{OpenWeatherClient, OpenWeatherConfig, OpenWeatherError};
pub use weather::{OpenWeatherProvider, WeatherProvider};
