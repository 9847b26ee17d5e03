//! Status update events.

use crate::Status;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A status change of a single order.
///
/// Events are emitted by the progression engine and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
	/// Order the event belongs to.
	pub order_id: u64,
	/// Status the order moved into.
	pub status: Status,
	/// When the change happened.
	pub timestamp: NaiveDateTime,
}
