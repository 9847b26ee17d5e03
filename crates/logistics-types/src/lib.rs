//! Common types module for the logistics data generator.
//!
//! This module defines the domain types shared by every generator component:
//! order records, the status state machine, per-order tracking state, emitted
//! status updates and the flat records handed to output sinks.

/// Status update events emitted by the progression engine.
pub mod events;
/// Order records and product catalog entries.
pub mod order;
/// Generation policies selectable from configuration.
pub mod policy;
/// Flat, ordered records for output sinks.
pub mod records;
/// Registry trait for pluggable backend implementations.
pub mod registry;
/// Order statuses and the fixed transition table.
pub mod status;
/// Per-order tracking state.
pub mod tracking;
/// Formatting and rounding helpers.
pub mod utils;
/// Configuration validation types for backend settings.
pub mod validation;

pub use events::*;
pub use order::*;
pub use policy::*;
pub use records::*;
pub use registry::*;
pub use status::*;
pub use tracking::*;
pub use utils::{format_timestamp, parse_timestamp, round_to_cents, TIMESTAMP_FORMAT};
pub use validation::*;
