//! Core types and shared functionality for skycast.
//!
//! This crate provides:
//! - Forecast cache with SQLite backend and content fingerprints
//! - Weather, forecast and geocode data types
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod types;
pub mod zip;

pub use cache::{CacheDb, CacheEntry, Clock, FixedClock, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use types::{ForecastData, ForecastPoint, GeocodeResult, WeatherSnapshot};
