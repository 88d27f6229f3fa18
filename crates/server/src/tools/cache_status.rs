//! forecast_cache_status tool implementation.
//!
//! Reports whether a zip code has a fresh cache entry and how old it is.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use skycast_core::zip::is_valid_zip;
use skycast_core::{CacheDb, Error};

/// Parameters for the forecast_cache_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatusParams {
    /// 5-digit US zip code.
    pub zip_code: String,
}

/// Output from the forecast_cache_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatusOutput {
    pub zip_code: String,
    /// Whether a fresh entry exists.
    pub cached: bool,
    /// RFC 3339 write time of the newest fresh entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_at: Option<String>,
    /// "Cached N minutes ago" or "Not cached".
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_hash: Option<String>,
    /// Rows stored for this zip, fresh or stale.
    pub entries: u64,
}

/// Implementation of the forecast_cache_status tool.
pub async fn cache_status_impl(cache: &CacheDb, params: CacheStatusParams) -> Result<CallToolResult, McpError> {
    let zip_code = params.zip_code.trim();
    if !is_valid_zip(zip_code) {
        return Err(Error::InvalidZip(zip_code.to_string()).into());
    }

    let newest = cache.find_valid(zip_code).await?;
    let entries = cache.count(zip_code).await?;

    let output = match newest {
        Some(entry) => CacheStatusOutput {
            zip_code: zip_code.to_string(),
            cached: true,
            cached_at: Some(entry.cached_at.to_rfc3339()),
            status: cache.status_label(&entry),
            data_hash: Some(entry.data_hash),
            entries,
        },
        None => CacheStatusOutput {
            zip_code: zip_code.to_string(),
            cached: false,
            cached_at: None,
            status: "Not cached".to_string(),
            data_hash: None,
            entries,
        },
    };

    let json = serde_json::to_string_pretty(&output).map_err(Error::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
