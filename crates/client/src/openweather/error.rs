//! OpenWeatherMap client error types.

use skycast_core::Error;
use std::sync::Arc;

/// Errors from the OpenWeatherMap client.
#[derive(Debug, thiserror::Error)]
pub enum OpenWeatherError {
    /// No API key configured.
    #[error("missing API key: SKYCAST_API_KEY not set")]
    MissingApiKey,

    /// Authentication failed (HTTP 401).
    #[error("authentication failed: invalid API key")]
    AuthError,

    /// No data for the requested location (HTTP 404).
    #[error("location not found")]
    NotFound,

    /// Rate limited by OpenWeatherMap (HTTP 429).
    #[error("rate limited: too many requests")]
    RateLimited,

    /// Other non-success HTTP response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for OpenWeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { OpenWeatherError::Timeout } else { OpenWeatherError::Network(Arc::new(err)) }
    }
}

impl OpenWeatherError {
    /// Map a non-success status code.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            401 => OpenWeatherError::AuthError,
            404 => OpenWeatherError::NotFound,
            429 => OpenWeatherError::RateLimited,
            status => OpenWeatherError::HttpError { status },
        }
    }
}

impl From<OpenWeatherError> for Error {
    fn from(err: OpenWeatherError) -> Self {
        match err {
            OpenWeatherError::AuthError | OpenWeatherError::MissingApiKey => Error::InvalidApiKey,
            OpenWeatherError::NotFound => Error::LocationNotFound,
            OpenWeatherError::RateLimited => Error::RateLimited,
            OpenWeatherError::HttpError { status } => Error::HttpStatus(status),
            other @ (OpenWeatherError::Timeout | OpenWeatherError::Network(_) | OpenWeatherError::Parse(_)) => {
                Error::Upstream(other.to_string())
            }
        }
    }
}
