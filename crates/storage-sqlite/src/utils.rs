//! Text encodings used for decimals, days and timestamps in SQLite columns.

use chrono::{NaiveDate, NaiveDateTime};
use log::warn;
use rust_decimal::Decimal;
use std::str::FromStr;

pub const DAY_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

pub fn decimal_to_text(value: Decimal) -> String {
    value.normalize().to_string()
}

pub fn opt_decimal_to_text(value: Option<Decimal>) -> Option<String> {
    value.map(decimal_to_text)
}

/// Parses a stored decimal. Unreadable values are logged and read as zero.
pub fn text_to_decimal(column: &str, raw: &str) -> Decimal {
    Decimal::from_str(raw).unwrap_or_else(|e| {
        warn!("Invalid decimal '{}' in column {}: {}", raw, column, e);
        Decimal::ZERO
    })
}

pub fn opt_text_to_decimal(column: &str, raw: Option<&str>) -> Option<Decimal> {
    raw.map(|value| text_to_decimal(column, value))
}

pub fn day_to_text(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

pub fn text_to_day(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, DAY_FORMAT).unwrap_or_else(|e| {
        warn!("Invalid day '{}': {}", raw, e);
        NaiveDate::default()
    })
}

pub fn timestamp_to_text(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn text_to_timestamp(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).unwrap_or_else(|e| {
        warn!("Invalid timestamp '{}': {}", raw, e);
        NaiveDateTime::default()
    })
}
