//! Pull a "City, ST" query out of a noisy street address.

use regex::Regex;
use std::sync::LazyLock;

static ZIP_CODES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9]{5}(?:-[0-9]{4})?\b").expect("valid zip code regex"));

static STATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z .]*$").expect("valid state regex"));

/// Street-type tokens that end the street part of an address.
const STREET_SUFFIXES: &[&str] = &[
    "st", "street", "rd", "road", "ave", "av", "avenue", "blvd", "boulevard", "dr", "drive", "ln", "lane", "ct",
    "court", "way", "pl", "place", "pkwy", "parkway", "hwy", "highway", "cir", "circle", "ter", "terrace", "trl",
    "trail", "sq", "square",
];

fn is_street_suffix(token: &str) -> bool {
    let bare = token.trim_end_matches(['.', ',']).to_ascii_lowercase();
    STREET_SUFFIXES.contains(&bare.as_str())
}

fn trim_punctuation(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || matches!(c, '.' | ',' | ';' | '#'))
}

/// Extract `"{city}, {state}"` from an address.
///
/// Zip codes are dropped, the state is whatever follows the last comma and
/// the city is the tail of what precedes it, after the last street-type token.
/// A street-type token in first position is part of the city ("St. Louis").
///
/// Returns None when no plausible city and state can be found.
pub fn parse_city_state(address: &str) -> Option<String> {
    let without_zip = ZIP_CODES.replace_all(address, " ");
    let cleaned = trim_punctuation(&without_zip);

    let (before, after) = cleaned.rsplit_once(',')?;

    let state = trim_punctuation(after);
    if !STATE.is_match(state) {
        return None;
    }

    // Earlier commas separate street lines; only the last segment can be the city.
    let segment = before.rsplit(',').next().unwrap_or(before);
    let tokens: Vec<&str> = segment.split_whitespace().collect();

    let city_start = tokens
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, token)| is_street_suffix(token))
        .map(|(idx, _)| idx + 1)
        .last()
        .unwrap_or_else(|| tokens.iter().take_while(|token| token.starts_with(|c: char| c.is_ascii_digit())).count());

    let city = trim_punctuation(&tokens[city_start.min(tokens.len())..].join(" ")).to_string();
    if !city.chars().any(char::is_alphabetic) {
        return None;
    }

    Some(format!("{city}, {state}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noisy_street_address() {
        assert_eq!(parse_city_state("6214 Stewart Rd. Leeds, AL. 35094"), Some("Leeds, AL".to_string()));
    }

    #[test]
    fn test_plain_city_state() {
        assert_eq!(parse_city_state("New York, NY"), Some("New York, NY".to_string()));
        assert_eq!(parse_city_state("Birmingham, Alabama"), Some("Birmingham, Alabama".to_string()));
    }

    #[test]
    fn test_leading_street_word_kept() {
        assert_eq!(parse_city_state("St. Louis, MO"), Some("St. Louis, MO".to_string()));
    }

    #[test]
    fn test_multi_segment_address() {
        assert_eq!(
            parse_city_state("1600 Pennsylvania Ave NW, Washington, DC 20500"),
            Some("Washington, DC".to_string())
        );
    }

    #[test]
    fn test_house_number_without_street_type() {
        assert_eq!(parse_city_state("42 Springfield, IL"), Some("Springfield, IL".to_string()));
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(parse_city_state("Paris"), None);
        assert_eq!(parse_city_state("10001"), None);
        assert_eq!(parse_city_state("123 Main St, 90210"), None);
        assert_eq!(parse_city_state("123 Main St, NY"), None);
    }

    #[test]
    fn test_full_width_digits_not_treated_as_zip() {
        assert_eq!(parse_city_state("Leeds, AL \u{ff13}\u{ff15}\u{ff10}\u{ff19}\u{ff14}"), None);
        assert_eq!(parse_city_state("Leeds, AL 35094-1234"), Some("Leeds, AL".to_string()));
    }
}
