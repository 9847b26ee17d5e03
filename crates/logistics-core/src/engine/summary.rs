//! Outcome of a generation cycle.

use logistics_types::GenerationMode;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// What a single cycle produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
	/// Identifier of the cycle, also attached to its log lines.
	pub run_id: Uuid,
	/// Selection mode used for progression.
	pub mode: GenerationMode,
	pub orders_created: usize,
	/// Id of the first order created, if any.
	pub first_order_id: Option<u64>,
	/// Id of the last order created, if any.
	pub last_order_id: Option<u64>,
	pub updates_emitted: usize,
	/// Progression stopped because no order was left to advance.
	pub halted_early: bool,
	/// Orders in the store after the cycle, terminal ones included.
	pub tracked_total: usize,
}

impl fmt::Display for RunSummary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match (self.first_order_id, self.last_order_id) {
			(Some(first), Some(last)) => write!(
				f,
				"created {} orders ({}..={})",
				self.orders_created, first, last
			)?,
			_ => write!(f, "created {} orders", self.orders_created)?,
		}
		write!(
			f,
			", emitted {} {} updates",
			self.updates_emitted, self.mode
		)?;
		if self.halted_early {
			f.write_str(" (stopped early: no eligible orders)")?;
		}
		write!(f, ", tracking {} orders", self.tracked_total)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_display() {
		let summary = RunSummary {
			run_id: Uuid::nil(),
			mode: GenerationMode::Exhaustive,
			orders_created: 50,
			first_order_id: Some(1200),
			last_order_id: Some(1249),
			updates_emitted: 3,
			halted_early: true,
			tracked_total: 50,
		};
		assert_eq!(
			summary.to_string(),
			"created 50 orders (1200..=1249), emitted 3 exhaustive updates \
			 (stopped early: no eligible orders), tracking 50 orders"
		);
	}
}
