//! In-memory tracking book for a single generation cycle.
//!
//! The book is loaded with the non-terminal orders of the store, receives the
//! orders created during the cycle and records every applied status update.
//! At the end of the cycle it tells which entries have to be inserted and
//! which have to be updated in the store.

use chrono::NaiveDateTime;
use logistics_types::{StatusUpdate, TrackingError, TrackingState, TransitionTable};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub struct TrackingBook {
	table: Arc<TransitionTable>,
	entries: BTreeMap<u64, TrackingState>,
	/// Orders that were eligible before the cycle created anything.
	cohort: Vec<u64>,
	created: BTreeSet<u64>,
	changed: BTreeSet<u64>,
}

impl TrackingBook {
	/// Creates a book from previously tracked orders.
	///
	/// Terminal entries are dropped; they can never be advanced again.
	pub fn new(
		table: Arc<TransitionTable>,
		prior: BTreeMap<u64, TrackingState>,
		now: NaiveDateTime,
	) -> Self {
		let entries: BTreeMap<u64, TrackingState> = prior
			.into_iter()
			.filter(|(_, state)| !table.is_terminal(state.status))
			.collect();
		let cohort = entries
			.iter()
			.filter(|(_, state)| state.is_eligible(&table, now))
			.map(|(id, _)| *id)
			.collect();

		Self {
			table,
			entries,
			cohort,
			created: BTreeSet::new(),
			changed: BTreeSet::new(),
		}
	}

	/// Starts tracking an order created during this cycle.
	pub fn track_new(&mut self, order_id: u64, state: TrackingState) -> Result<(), TrackingError> {
		if self.entries.contains_key(&order_id) {
			return Err(TrackingError::DuplicateOrder(order_id));
		}
		self.entries.insert(order_id, state);
		self.created.insert(order_id);
		Ok(())
	}

	pub fn get(&self, order_id: u64) -> Option<&TrackingState> {
		self.entries.get(&order_id)
	}

	pub fn table(&self) -> &TransitionTable {
		&self.table
	}

	/// Prior cohort, in ascending id order.
	pub fn cohort(&self) -> &[u64] {
		&self.cohort
	}

	pub fn is_eligible(&self, order_id: u64, now: NaiveDateTime) -> bool {
		self.entries
			.get(&order_id)
			.is_some_and(|state| state.is_eligible(&self.table, now))
	}

	/// Ids of all orders that can currently be advanced, ascending.
	pub fn eligible_ids(&self, now: NaiveDateTime) -> Vec<u64> {
		self.entries
			.iter()
			.filter(|(_, state)| state.is_eligible(&self.table, now))
			.map(|(id, _)| *id)
			.collect()
	}

	/// Applies a status update to its order.
	pub fn apply(&mut self, update: &StatusUpdate) -> Result<(), TrackingError> {
		let state = self
			.entries
			.get_mut(&update.order_id)
			.ok_or(TrackingError::UnknownOrder(update.order_id))?;
		state.apply(update, &self.table)?;
		self.changed.insert(update.order_id);
		Ok(())
	}

	/// Entries of orders created during the cycle, with their latest state.
	pub fn created_entries(&self) -> impl Iterator<Item = (u64, TrackingState)> + '_ {
		self.created.iter().map(|id| (*id, self.entries[id]))
	}

	/// Previously tracked entries changed during the cycle.
	pub fn changed_entries(&self) -> impl Iterator<Item = (u64, TrackingState)> + '_ {
		self.changed
			.iter()
			.filter(|id| !self.created.contains(*id))
			.map(|id| (*id, self.entries[id]))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
