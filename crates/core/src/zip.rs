//! US zip code detection and validation.

use regex::Regex;
use std::sync::LazyLock;

static ZIP_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[0-9]{5}\b").expect("valid zip token regex"));

static ZIP_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{5}$").expect("valid zip code regex"));

/// Return the first standalone 5-digit token in `text`, if any.
pub fn extract_zip(text: &str) -> Option<String> {
    ZIP_TOKEN.find(text).map(|m| m.as_str().to_string())
}

/// Whether `zip` is exactly five ASCII digits.
pub fn is_valid_zip(zip: &str) -> bool {
    ZIP_CODE.is_match(zip)
}
