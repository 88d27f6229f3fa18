//! MCP tool implementations.
//!
//! This module contains all tools exposed by the skycast server.

pub mod cache_status;
pub mod get_forecast;

pub use cache_status::{CacheStatusParams, cache_status_impl};
pub use get_forecast::{GetForecastParams, get_forecast_impl};
