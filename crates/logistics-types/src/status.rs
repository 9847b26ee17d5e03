//! Order status lifecycle.
//!
//! Orders move along a small acyclic graph: Pending -> Processing -> Shipped ->
//! Delivered, with Pending -> Cancelled as the only alternative branch.
//! Delivered and Cancelled are terminal.

use crate::TrackingError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Status of a generated order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
	/// Order was placed and awaits processing.
	Pending,
	/// Order is being picked and packed.
	Processing,
	/// Order left the warehouse.
	Shipped,
	/// Order reached its destination.
	Delivered,
	/// Order was cancelled before processing.
	Cancelled,
}

impl Status {
	/// Every status, in lifecycle order.
	pub const ALL: [Status; 5] = [
		Status::Pending,
		Status::Processing,
		Status::Shipped,
		Status::Delivered,
		Status::Cancelled,
	];

	/// Statuses that admit no further transitions.
	pub const TERMINAL: [Status; 2] = [Status::Delivered, Status::Cancelled];

	/// Returns the name used in records and persisted state.
	pub fn as_str(&self) -> &'static str {
		match self {
			Status::Pending => "Pending",
			Status::Processing => "Processing",
			Status::Shipped => "Shipped",
			Status::Delivered => "Delivered",
			Status::Cancelled => "Cancelled",
		}
	}

	/// Returns true for Delivered and Cancelled.
	pub fn is_terminal(&self) -> bool {
		Self::TERMINAL.contains(self)
	}

	/// Depth of the status in the lifecycle graph.
	///
	/// A valid status sequence for a single order never decreases in rank.
	/// Both terminal statuses share the deepest rank.
	pub fn rank(&self) -> u8 {
		match self {
			Status::Pending => 0,
			Status::Processing => 1,
			Status::Shipped => 2,
			Status::Delivered | Status::Cancelled => 3,
		}
	}
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Status {
	type Err = TrackingError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Status::ALL
			.into_iter()
			.find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
			.ok_or_else(|| TrackingError::UnknownStatus(s.to_string()))
	}
}

/// Fixed adjacency map of legal status transitions.
///
/// The table is built once at startup and shared by reference. Successor lists
/// keep a stable order so that seeded random choices are reproducible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
	edges: BTreeMap<Status, Vec<Status>>,
}

impl TransitionTable {
	/// Builds the standard logistics lifecycle.
	pub fn standard() -> Self {
		let mut edges = BTreeMap::new();
		edges.insert(Status::Pending, vec![Status::Processing, Status::Cancelled]);
		edges.insert(Status::Processing, vec![Status::Shipped]);
		edges.insert(Status::Shipped, vec![Status::Delivered]);
		edges.insert(Status::Delivered, Vec::new()); // terminal
		edges.insert(Status::Cancelled, Vec::new()); // terminal
		Self { edges }
	}

	/// Legal successors of `from`. Empty for terminal statuses.
	pub fn next_statuses(&self, from: Status) -> &[Status] {
		self.edges.get(&from).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Checks whether `from -> to` is an edge of the table.
	pub fn is_valid(&self, from: Status, to: Status) -> bool {
		self.next_statuses(from).contains(&to)
	}

	/// A status is terminal in this table when it has no successors.
	pub fn is_terminal(&self, status: Status) -> bool {
		self.next_statuses(status).is_empty()
	}

	/// Iterates every `(from, to)` edge.
	pub fn edges(&self) -> impl Iterator<Item = (Status, Status)> + '_ {
		self.edges
			.iter()
			.flat_map(|(from, targets)| targets.iter().map(move |to| (*from, *to)))
	}
}

impl Default for TransitionTable {
	fn default() -> Self {
		Self::standard()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_standard_table_edges() {
		let table = TransitionTable::standard();
		let edges: Vec<_> = table.edges().collect();

		assert_eq!(
			edges,
			vec![
				(Status::Pending, Status::Processing),
				(Status::Pending, Status::Cancelled),
				(Status::Processing, Status::Shipped),
				(Status::Shipped, Status::Delivered),
			]
		);
	}

	#[test]
	fn test_terminal_statuses_have_no_successors() {
		let table = TransitionTable::standard();
		for status in Status::ALL {
			assert_eq!(table.is_terminal(status), status.is_terminal(), "{}", status);
		}
	}

	#[test]
	fn test_invalid_transitions_rejected() {
		let table = TransitionTable::standard();
		assert!(table.is_valid(Status::Pending, Status::Cancelled));
		assert!(!table.is_valid(Status::Shipped, Status::Processing));
		assert!(!table.is_valid(Status::Processing, Status::Cancelled));
		assert!(!table.is_valid(Status::Delivered, Status::Pending));
		assert!(!table.is_valid(Status::Pending, Status::Pending));
	}

	#[test]
	fn test_edges_never_regress_in_rank() {
		let table = TransitionTable::standard();
		for (from, to) in table.edges() {
			assert!(to.rank() > from.rank(), "{} -> {}", from, to);
		}
	}

	#[test]
	fn test_status_parsing() {
		assert_eq!("Shipped".parse::<Status>().unwrap(), Status::Shipped);
		assert_eq!(" delivered ".parse::<Status>().unwrap(), Status::Delivered);
		assert!(matches!(
			"Lost".parse::<Status>(),
			Err(TrackingError::UnknownStatus(s)) if s == "Lost"
		));
	}

	#[test]
	fn test_status_serializes_by_name() {
		let json = serde_json::to_string(&Status::Processing).unwrap();
		assert_eq!(json, "\"Processing\"");
		let parsed: Status = serde_json::from_str("\"Cancelled\"").unwrap();
		assert_eq!(parsed, Status::Cancelled);
	}
}
