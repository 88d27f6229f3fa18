//! SQLite-backed forecast cache.
//!
//! This module provides a persistent, insert-only cache of weather results
//! keyed by zip code, using SQLite with async access via tokio-rusqlite.
//!
//! - 30 minute freshness window, stale rows are ignored rather than deleted
//! - Content fingerprints over rounded values using SHA-256
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod clock;
pub mod connection;
pub mod fingerprint;
pub mod forecasts;
pub mod migrations;

pub use crate::Error;

pub use clock::{Clock, FixedClock, SystemClock};
pub use connection::CacheDb;
pub use fingerprint::fingerprint;
pub use forecasts::CacheEntry;

/// How long a cache entry stays fresh.
pub const CACHE_TTL_MINUTES: i64 = 30;
