//! Per-order tracking state.
//!
//! The tracking state is the minimal mutable record needed to generate the
//! next legal status event for an order: its current status and the time of
//! its last recorded event.

use crate::{Status, StatusUpdate, TransitionTable};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when tracking state is read or mutated inconsistently.
#[derive(Debug, Error)]
pub enum TrackingError {
	#[error("Invalid status transition for order {order_id}: {from} -> {to}")]
	InvalidTransition {
		order_id: u64,
		from: Status,
		to: Status,
	},
	#[error("Timestamp regression for order {order_id}: {event} is not after {last}")]
	TimestampRegression {
		order_id: u64,
		last: NaiveDateTime,
		event: NaiveDateTime,
	},
	#[error("Order not tracked: {0}")]
	UnknownOrder(u64),
	#[error("Order already tracked: {0}")]
	DuplicateOrder(u64),
	#[error("Unknown status: {0}")]
	UnknownStatus(String),
}

/// Current status and last event time of a tracked order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingState {
	/// Current status of the order.
	pub status: Status,
	/// Timestamp of the last recorded event (sale or status change).
	pub last_date: NaiveDateTime,
}

impl TrackingState {
	/// Tracking state of a freshly placed order.
	pub fn pending(sale_timestamp: NaiveDateTime) -> Self {
		Self {
			status: Status::Pending,
			last_date: sale_timestamp,
		}
	}

	/// Whether the order can be advanced during a run whose clock reads `now`.
	///
	/// Orders whose last event already reached `now` are caught up for the
	/// rest of the run: advancing them would produce a non-increasing timestamp.
	pub fn is_eligible(&self, table: &TransitionTable, now: NaiveDateTime) -> bool {
		!table.is_terminal(self.status) && self.last_date < now
	}

	/// Applies an update after checking it against the transition table.
	pub fn apply(
		&mut self,
		update: &StatusUpdate,
		table: &TransitionTable,
	) -> Result<(), TrackingError> {
		if !table.is_valid(self.status, update.status) {
			return Err(TrackingError::InvalidTransition {
				order_id: update.order_id,
				from: self.status,
				to: update.status,
			});
		}
		if update.timestamp <= self.last_date {
			return Err(TrackingError::TimestampRegression {
				order_id: update.order_id,
				last: self.last_date,
				event: update.timestamp,
			});
		}

		self.status = update.status;
		self.last_date = update.timestamp;
		Ok(())
	}
}
