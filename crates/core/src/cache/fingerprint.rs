//! Content fingerprints for change detection.
//!
//! A fingerprint covers only the rounded, user-visible weather fields, so
//! sub-decimal jitter between two fetches does not register as a change.

use crate::types::{ForecastPoint, WeatherSnapshot, round_tenths};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Canonical fingerprint input. Field order is fixed by declaration.
#[derive(Serialize)]
struct FingerprintInput<'a> {
    conditions: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    forecast: Option<Vec<DaySummary<'a>>>,
    high: Option<f64>,
    low: Option<f64>,
    temp: Option<f64>,
}

/// One day of a forecast reduced to what the fingerprint cares about.
#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct DaySummary<'a> {
    conditions: &'a str,
    date: &'a str,
    high: f64,
    low: f64,
}

/// Collapse 3-hour points into one summary per date, ascending.
///
/// High is the max `temp_max`, low the min `temp_min`, and conditions come
/// from the first point of the day.
pub(crate) fn summarize_days(points: &[ForecastPoint]) -> Vec<DaySummary<'_>> {
    let mut days: BTreeMap<&str, DaySummary<'_>> = BTreeMap::new();
    for point in points {
        days.entry(point.date.as_str())
            .and_modify(|day| {
                day.high = day.high.max(point.temp_max);
                day.low = day.low.min(point.temp_min);
            })
            .or_insert(DaySummary {
                conditions: point.conditions.as_str(),
                date: point.date.as_str(),
                high: point.temp_max,
                low: point.temp_min,
            });
    }

    days.into_values()
        .map(|day| DaySummary { high: round_tenths(day.high), low: round_tenths(day.low), ..day })
        .collect()
}

/// Compute the content fingerprint for a weather result.
///
/// The forecast contributes only when `include_forecast` is set and a
/// forecast is present. Returns 64 lowercase hex characters.
pub fn fingerprint(snapshot: &WeatherSnapshot, forecast: Option<&[ForecastPoint]>, include_forecast: bool) -> String {
    let input = FingerprintInput {
        conditions: snapshot.conditions.as_deref(),
        forecast: forecast.filter(|_| include_forecast).map(summarize_days),
        high: snapshot.high_temp.map(round_tenths),
        low: snapshot.low_temp.map(round_tenths),
        temp: snapshot.temperature.map(round_tenths),
    };

    // Serializing plain structs, strings and floats cannot fail.
    let canonical = serde_json::to_vec(&input).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    hex::encode(hasher.finalize())
}
