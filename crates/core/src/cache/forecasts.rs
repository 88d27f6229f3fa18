//! Forecast cache reads, writes and freshness labels.
//!
//! The table is insert-only: every fresh fetch appends a row and lookups
//! pick the newest row inside the freshness window.

use super::CACHE_TTL_MINUTES;
use super::clock::format_timestamp;
use super::connection::CacheDb;
use super::fingerprint::fingerprint;
use crate::Error;
use crate::types::{ForecastData, ForecastPoint, WeatherSnapshot};
use crate::zip::is_valid_zip;
use chrono::{DateTime, Duration, NaiveDateTime, SubsecRound, Utc};
use serde::Serialize;
use tokio_rusqlite::{params, rusqlite};

const SELECT_COLUMNS: &str = "SELECT id, zip_code, location, temperature, high_temp, low_temp,
        conditions, cached_at, forecast_data, data_hash
    FROM forecast_cache";

/// A cached weather result for one zip code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    pub id: i64,
    pub zip_code: String,
    pub location: Option<String>,
    pub temperature: Option<f64>,
    pub high_temp: Option<f64>,
    pub low_temp: Option<f64>,
    pub conditions: Option<String>,
    pub cached_at: DateTime<Utc>,
    /// Absent on rows written before the blob column existed.
    pub forecast_data: Option<ForecastData>,
    pub data_hash: String,
}

impl CacheEntry {
    /// Whether the stored blob carries a non-empty forecast.
    pub fn has_forecast(&self) -> bool {
        self.forecast_data.as_ref().is_some_and(ForecastData::has_forecast)
    }
}

/// Row as stored, before timestamp and blob decoding.
struct StoredRow {
    id: i64,
    zip_code: String,
    location: Option<String>,
    temperature: Option<f64>,
    high_temp: Option<f64>,
    low_temp: Option<f64>,
    conditions: Option<String>,
    cached_at: String,
    forecast_data: Option<String>,
    data_hash: String,
}

impl StoredRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            zip_code: row.get(1)?,
            location: row.get(2)?,
            temperature: row.get(3)?,
            high_temp: row.get(4)?,
            low_temp: row.get(5)?,
            conditions: row.get(6)?,
            cached_at: row.get(7)?,
            forecast_data: row.get(8)?,
            data_hash: row.get(9)?,
        })
    }
}

impl TryFrom<StoredRow> for CacheEntry {
    type Error = Error;

    fn try_from(row: StoredRow) -> Result<Self, Error> {
        let cached_at = parse_timestamp(&row.cached_at)?;

        // A blob we cannot read degrades to a legacy-style entry instead of
        // failing the lookup.
        let forecast_data = row.forecast_data.and_then(|raw| {
            serde_json::from_str::<ForecastData>(&raw)
                .inspect_err(|e| tracing::warn!(id = row.id, error = %e, "unreadable forecast_data blob"))
                .ok()
        });

        Ok(Self {
            id: row.id,
            zip_code: row.zip_code,
            location: row.location,
            temperature: row.temperature,
            high_temp: row.high_temp,
            low_temp: row.low_temp,
            conditions: row.conditions,
            cached_at,
            forecast_data,
            data_hash: row.data_hash,
        })
    }
}

/// Parse a stored `cached_at`. Accepts the RFC 3339 form written today and
/// SQLite's `CURRENT_TIMESTAMP` form found in old rows.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|at| at.and_utc()))
        .map_err(|e| Error::Serialization(format!("invalid cached_at {raw:?}: {e}")))
}

impl CacheDb {
    fn ttl_cutoff(&self) -> DateTime<Utc> {
        self.clock.now() - Duration::minutes(CACHE_TTL_MINUTES)
    }

    /// Most recent fresh entry for `zip_code`.
    ///
    /// Stale rows are skipped, never deleted. Returns None on a miss.
    pub async fn find_valid(&self, zip_code: &str) -> Result<Option<CacheEntry>, Error> {
        self.query_valid(zip_code, None).await
    }

    /// Most recent fresh entry for `zip_code` whose fingerprint is `data_hash`.
    pub async fn find_valid_with_hash(&self, zip_code: &str, data_hash: &str) -> Result<Option<CacheEntry>, Error> {
        self.query_valid(zip_code, Some(data_hash.to_string())).await
    }

    async fn query_valid(&self, zip_code: &str, data_hash: Option<String>) -> Result<Option<CacheEntry>, Error> {
        let zip_code = zip_code.to_string();
        let cutoff = format_timestamp(self.ttl_cutoff());

        let row = self
            .conn
            .call(move |conn| -> Result<Option<StoredRow>, Error> {
                let sql = format!(
                    "{SELECT_COLUMNS}
                    WHERE zip_code = ?1 AND cached_at > ?2 AND (?3 IS NULL OR data_hash = ?3)
                    ORDER BY cached_at DESC, id DESC
                    LIMIT 1"
                );
                match conn.query_row(&sql, params![zip_code, cutoff, data_hash], StoredRow::from_row) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await?;

        let entry = row.map(CacheEntry::try_from).transpose()?;
        match &entry {
            Some(hit) => tracing::debug!(zip_code = %hit.zip_code, id = hit.id, "forecast cache hit"),
            None => tracing::debug!("forecast cache miss"),
        }
        Ok(entry)
    }

    /// Append a new entry stamped with the current time.
    ///
    /// The fingerprint covers the forecast whenever one is supplied.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidZip` without touching the database when
    /// `zip_code` is not exactly five digits.
    pub async fn store(
        &self, zip_code: &str, location: &str, snapshot: &WeatherSnapshot, forecast: Option<&[ForecastPoint]>,
    ) -> Result<CacheEntry, Error> {
        if !is_valid_zip(zip_code) {
            return Err(Error::InvalidZip(zip_code.to_string()));
        }

        let blob = ForecastData::from_parts(snapshot, forecast);
        let blob_json = serde_json::to_string(&blob)?;

        let entry = CacheEntry {
            id: 0,
            zip_code: zip_code.to_string(),
            location: Some(location.to_string()),
            temperature: snapshot.temperature,
            high_temp: snapshot.high_temp,
            low_temp: snapshot.low_temp,
            conditions: snapshot.conditions.clone(),
            cached_at: self.clock.now().trunc_subsecs(6),
            forecast_data: Some(blob),
            data_hash: fingerprint(snapshot, forecast, forecast.is_some()),
        };

        let row = entry.clone();
        let id = self
            .conn
            .call(move |conn| -> Result<i64, Error> {
                conn.execute(
                    "INSERT INTO forecast_cache (
                        zip_code, location, temperature, high_temp, low_temp,
                        conditions, cached_at, forecast_data, data_hash
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        row.zip_code,
                        row.location,
                        row.temperature,
                        row.high_temp,
                        row.low_temp,
                        row.conditions,
                        format_timestamp(row.cached_at),
                        blob_json,
                        row.data_hash,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        tracing::info!(zip_code, id, data_hash = %entry.data_hash, "stored forecast cache entry");
        Ok(CacheEntry { id, ..entry })
    }

    /// Number of rows for `zip_code`, fresh or stale.
    pub async fn count(&self, zip_code: &str) -> Result<u64, Error> {
        let zip_code = zip_code.to_string();
        let count: i64 = self
            .conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM forecast_cache WHERE zip_code = ?1",
                    params![zip_code],
                    |row| row.get(0),
                )
            })
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Whether `entry` is still inside the freshness window.
    pub fn is_fresh(&self, entry: &CacheEntry) -> bool {
        entry.cached_at > self.ttl_cutoff()
    }

    /// Human-readable cache age, e.g. "Cached 5 minutes ago".
    pub fn status_label(&self, entry: &CacheEntry) -> String {
        if !self.is_fresh(entry) {
            return "Cache expired".to_string();
        }

        let elapsed_ms = (self.clock.now() - entry.cached_at).num_milliseconds().max(0);
        let minutes = (elapsed_ms as f64 / 60_000.0).round() as i64;
        let unit = if minutes == 1 { "minute" } else { "minutes" };
        format!("Cached {minutes} {unit} ago")
    }
}
