//! Serde helpers for coercing CSV cells.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a timestamp cell, accepting a full timestamp or a bare date.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Empty cell becomes `None`; anything else must be a valid timestamp.
pub fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_timestamp(value)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", value))),
    }
}

/// Review scores may be exported as floats ("5.0"); they must be whole numbers.
pub fn optional_score<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let value = match raw.as_deref().map(str::trim) {
        None | Some("") => return Ok(None),
        Some(value) => value,
    };

    let parsed: f64 = value
        .parse()
        .map_err(|_| de::Error::custom(format!("invalid review score '{}'", value)))?;

    if parsed.fract() != 0.0 || !(0.0..=u8::MAX as f64).contains(&parsed) {
        return Err(de::Error::custom(format!(
            "review score out of range '{}'",
            value
        )));
    }

    Ok(Some(parsed as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        let full = parse_timestamp("2017-10-02 11:07:15").unwrap();
        assert_eq!(full.to_string(), "2017-10-02 11:07:15");

        let date_only = parse_timestamp("2018-01-03").unwrap();
        assert_eq!(date_only.to_string(), "2018-01-03 00:00:00");

        assert!(parse_timestamp("02/10/2017").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
