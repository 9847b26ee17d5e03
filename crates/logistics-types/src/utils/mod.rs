//! Formatting and rounding helpers shared by records and generators.

pub mod formatting;

pub use formatting::{format_timestamp, parse_timestamp, round_to_cents, TIMESTAMP_FORMAT};
