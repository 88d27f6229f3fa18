//! get_forecast tool implementation.
//!
//! Runs the forecast pipeline for a free-form address. Pipeline failures are
//! returned as a tool result flagged `is_error`, not as a protocol error.

use crate::orchestrator::{ForecastOrchestrator, ForecastResponse};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use skycast_core::Error;

/// Input parameters for the get_forecast tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetForecastParams {
    /// Street address, "City, ST", or a 5-digit US zip code.
    pub address: String,

    /// Also return the 5-day / 3-hour forecast (default false).
    #[serde(default)]
    pub include_forecast: bool,
}

/// Implementation of the get_forecast tool.
pub async fn get_forecast_impl(
    orchestrator: &ForecastOrchestrator, params: GetForecastParams,
) -> Result<CallToolResult, McpError> {
    let result = orchestrator.get_forecast(&params.address, params.include_forecast).await;
    let response = ForecastResponse::from(result);

    let json = serde_json::to_string_pretty(&response).map_err(Error::from)?;
    let content = vec![Content::text(json)];

    if response.success { Ok(CallToolResult::success(content)) } else { Ok(CallToolResult::error(content)) }
}
