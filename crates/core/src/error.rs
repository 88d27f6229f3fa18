//! Unified error types for skycast.
//!
//! The `Display` text of every variant is the message shown to the caller,
//! so upstream failures can travel through the pipeline without re-wrapping.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the skycast pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (blank address, missing coordinates).
    #[error("{0}")]
    InvalidInput(String),

    /// Upstream rejected the API credential (HTTP 401).
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Upstream has no data for the requested location (HTTP 404).
    #[error("Location not found")]
    LocationNotFound,

    /// Upstream rate limit hit (HTTP 429).
    #[error("API rate limit exceeded")]
    RateLimited,

    /// Any other non-success HTTP status from upstream.
    #[error("API request failed with status {0}")]
    HttpStatus(u16),

    /// Transport or parse failure talking to upstream.
    #[error("{0}")]
    Upstream(String),

    /// Every geocoding strategy came back empty.
    #[error("Unable to find location for the provided address")]
    NoLocation,

    /// Zip code failed `^\d{5}$` validation.
    #[error("invalid zip code: {0:?}")]
    InvalidZip(String),

    /// Database operation failed.
    #[error("cache error: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("cache error: migration failed: {0}")]
    MigrationFailed(String),

    /// Blob or payload (de)serialization failed.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Catch-all raised by the orchestrator for faults outside the taxonomy.
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl Error {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::InvalidApiKey => "UPSTREAM_AUTH",
            Error::LocationNotFound => "LOCATION_NOT_FOUND",
            Error::RateLimited => "UPSTREAM_RATE_LIMITED",
            Error::HttpStatus(_) => "UPSTREAM_HTTP",
            Error::Upstream(_) => "UPSTREAM_ERROR",
            Error::NoLocation => "NO_LOCATION",
            Error::InvalidZip(_) => "INVALID_ZIP",
            Error::Database(_) | Error::MigrationFailed(_) => "CACHE_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Unexpected(_) => "UNEXPECTED",
        }
    }

    /// Whether the message is already fit for the caller.
    ///
    /// Validation and upstream failures are passed through verbatim; anything
    /// else is an internal fault that the orchestrator wraps as `Unexpected`.
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            Error::InvalidZip(_) | Error::Database(_) | Error::MigrationFailed(_) | Error::Serialization(_)
        )
    }

    /// Shorthand for the "missing coordinates" validation error.
    pub fn missing_coordinates() -> Self {
        Error::InvalidInput("Latitude and longitude are required".into())
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) | Error::InvalidZip(_) => -32602,
            Error::InvalidApiKey => -32009,
            Error::RateLimited => -32010,
            Error::LocationNotFound | Error::NoLocation => -32001,
            Error::HttpStatus(_) | Error::Upstream(_) => -32008,
            Error::Database(_) | Error::MigrationFailed(_) => -32002,
            Error::Serialization(_) | Error::Unexpected(_) => -32000,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
