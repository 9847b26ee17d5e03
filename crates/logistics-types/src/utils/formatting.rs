//! Timestamp and decimal formatting.

use chrono::NaiveDateTime;

/// Layout of every timestamp written to output records.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats a timestamp as `YYYY-MM-DD HH:MM:SS`, dropping sub-second precision.
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
	timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a timestamp written by [`format_timestamp`].
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
	NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
}

/// Rounds a monetary or weight value to two decimals.
pub fn round_to_cents(value: f64) -> f64 {
	(value * 100.0).round() / 100.0
}
