//! Status progression of tracked orders.
//!
//! Each step picks an eligible order, moves it along a random legal edge of
//! the transition table and stamps the event `last_date + delay`, clamped to
//! the cycle's `now`. Two selection modes exist:
//!
//! - exhaustive: a fixed number of attempts, each over all eligible orders;
//! - probabilistic: one coin flip per order of the prior cohort.

use crate::state::TrackingBook;
use chrono::{Duration, NaiveDateTime};
use logistics_types::{DelayPolicy, StatusUpdate, TrackingError};
use rand::seq::SliceRandom;
use rand::Rng;

/// Inclusive bounds of the `hours` delay policy.
pub const DELAY_HOURS: (i64, i64) = (4, 72);

/// Result of a progression pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressionOutcome {
	/// Emitted events, in emission order.
	pub updates: Vec<StatusUpdate>,
	/// Whether the pass ran out of eligible orders before its budget.
	pub halted_early: bool,
}

/// Advances orders along the transition table.
pub struct ProgressionEngine {
	delay: DelayPolicy,
}

impl ProgressionEngine {
	pub fn new(delay: DelayPolicy) -> Self {
		Self { delay }
	}

	/// Samples a strictly positive delay between two events.
	pub fn sample_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
		match self.delay {
			DelayPolicy::Hours => Duration::hours(rng.gen_range(DELAY_HOURS.0..=DELAY_HOURS.1)),
			DelayPolicy::Composite => {
				Duration::hours(rng.gen_range(1..=24))
					+ Duration::minutes(rng.gen_range(1..=59))
					+ Duration::seconds(rng.gen_range(1..=59))
			},
		}
	}

	/// Advances a single order by one legal step.
	///
	/// Returns `Ok(None)` when the order is unknown, terminal or already caught
	/// up with `now`.
	pub fn advance_one<R: Rng + ?Sized>(
		&self,
		rng: &mut R,
		book: &mut TrackingBook,
		order_id: u64,
		now: NaiveDateTime,
	) -> Result<Option<StatusUpdate>, TrackingError> {
		if !book.is_eligible(order_id, now) {
			return Ok(None);
		}
		let Some(current) = book.get(order_id).copied() else {
			return Ok(None);
		};
		let Some(&next) = book.table().next_statuses(current.status).choose(rng) else {
			return Ok(None);
		};

		let timestamp = (current.last_date + self.sample_delay(rng)).min(now);
		let update = StatusUpdate {
			order_id,
			status: next,
			timestamp,
		};
		book.apply(&update)?;

		tracing::trace!(
			order_id,
			from = %current.status,
			to = %next,
			timestamp = %timestamp,
			"Advanced order"
		);
		Ok(Some(update))
	}

	/// Attempts `update_count` updates, each on a uniformly chosen eligible order.
	///
	/// Stops early when no order is left to advance.
	pub fn run_exhaustive<R: Rng + ?Sized>(
		&self,
		rng: &mut R,
		book: &mut TrackingBook,
		update_count: usize,
		now: NaiveDateTime,
	) -> Result<ProgressionOutcome, TrackingError> {
		let mut outcome = ProgressionOutcome::default();

		for attempt in 0..update_count {
			let eligible = book.eligible_ids(now);
			let Some(&order_id) = eligible.choose(rng) else {
				tracing::warn!(
					requested = update_count,
					emitted = attempt,
					"No eligible orders left, stopping progression early"
				);
				outcome.halted_early = true;
				break;
			};

			if let Some(update) = self.advance_one(rng, book, order_id, now)? {
				outcome.updates.push(update);
			}
		}

		Ok(outcome)
	}

	/// Advances each order of the prior cohort at most once, with probability
	/// `probability`.
	pub fn run_probabilistic<R: Rng + ?Sized>(
		&self,
		rng: &mut R,
		book: &mut TrackingBook,
		probability: f64,
		now: NaiveDateTime,
	) -> Result<ProgressionOutcome, TrackingError> {
		let mut outcome = ProgressionOutcome::default();
		let probability = probability.clamp(0.0, 1.0);

		let cohort = book.cohort().to_vec();
		for order_id in cohort {
			if !rng.gen_bool(probability) {
				continue;
			}
			if let Some(update) = self.advance_one(rng, book, order_id, now)? {
				outcome.updates.push(update);
			}
		}

		Ok(outcome)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::NaiveDate;
	use logistics_types::{Status, TrackingState, TransitionTable};
	use rand::rngs::StdRng;
	use rand::SeedableRng;
	use std::collections::{BTreeMap, HashMap};
	use std::sync::Arc;

	fn now() -> NaiveDateTime {
		NaiveDate::from_ymd_opt(2026, 9, 1)
			.unwrap()
			.and_hms_opt(18, 0, 0)
			.unwrap()
	}

	fn book(prior: Vec<(u64, Status, i64)>) -> TrackingBook {
		let prior: BTreeMap<u64, TrackingState> = prior
			.into_iter()
			.map(|(id, status, hours_ago)| {
				(
					id,
					TrackingState {
						status,
						last_date: now() - Duration::hours(hours_ago),
					},
				)
			})
			.collect();
		TrackingBook::new(Arc::new(TransitionTable::standard()), prior, now())
	}

	#[test]
	fn test_delay_bounds() {
		let mut rng = StdRng::seed_from_u64(4);

		let hours = ProgressionEngine::new(DelayPolicy::Hours);
		let composite = ProgressionEngine::new(DelayPolicy::Composite);
		for _ in 0..500 {
			let delay = hours.sample_delay(&mut rng);
			assert!(delay >= Duration::hours(4) && delay <= Duration::hours(72));
			assert_eq!(delay.num_seconds() % 3600, 0);

			let delay = composite.sample_delay(&mut rng);
			assert!(delay >= Duration::seconds(3600 + 60 + 1));
			assert!(delay <= Duration::seconds(24 * 3600 + 59 * 60 + 59));
		}
	}

	#[test]
	fn test_single_shipped_order_halts_early() {
		let engine = ProgressionEngine::new(DelayPolicy::Hours);
		let mut book = book(vec![(500, Status::Shipped, 200)]);
		let mut rng = StdRng::seed_from_u64(8);

		let outcome = engine.run_exhaustive(&mut rng, &mut book, 150, now()).unwrap();

		assert_eq!(outcome.updates.len(), 1);
		assert_eq!(outcome.updates[0].order_id, 500);
		assert_eq!(outcome.updates[0].status, Status::Delivered);
		assert!(outcome.halted_early);
	}

	#[test]
	fn test_timestamp_clamped_to_now() {
		let engine = ProgressionEngine::new(DelayPolicy::Hours);
		// One hour ago: every delay in [4, 72] hours overshoots
		let mut book = book(vec![(42, Status::Processing, 1)]);
		let mut rng = StdRng::seed_from_u64(1);

		let update = engine
			.advance_one(&mut rng, &mut book, 42, now())
			.unwrap()
			.unwrap();
		assert_eq!(update.status, Status::Shipped);
		assert_eq!(update.timestamp, now());

		// Caught up for the rest of the cycle
		assert!(engine
			.advance_one(&mut rng, &mut book, 42, now())
			.unwrap()
			.is_none());
	}

	#[test]
	fn test_exhaustive_events_follow_table() {
		let engine = ProgressionEngine::new(DelayPolicy::Composite);
		let table = TransitionTable::standard();
		let prior: Vec<_> = (1..=30).map(|id| (id, Status::Pending, 24 * 20)).collect();
		let mut book = book(prior.clone());
		let mut rng = StdRng::seed_from_u64(21);

		let outcome = engine.run_exhaustive(&mut rng, &mut book, 90, now()).unwrap();
		assert!(!outcome.updates.is_empty());

		let mut last: HashMap<u64, (Status, NaiveDateTime)> = prior
			.iter()
			.map(|(id, status, hours_ago)| (*id, (*status, now() - Duration::hours(*hours_ago))))
			.collect();
		for update in &outcome.updates {
			let (status, timestamp) = last[&update.order_id];
			assert!(table.is_valid(status, update.status));
			assert!(update.status.rank() > status.rank());
			assert!(update.timestamp > timestamp);
			assert!(update.timestamp <= now());
			last.insert(update.order_id, (update.status, update.timestamp));
		}
	}

	#[test]
	fn test_exhaustive_never_selects_terminal_orders() {
		let engine = ProgressionEngine::new(DelayPolicy::Hours);
		let mut book = book(vec![(1, Status::Pending, 500), (2, Status::Pending, 500)]);
		let mut rng = StdRng::seed_from_u64(13);

		let outcome = engine.run_exhaustive(&mut rng, &mut book, 50, now()).unwrap();

		// Two orders can take at most three steps each
		assert!(outcome.updates.len() <= 6);
		assert!(outcome.halted_early);
		for id in [1, 2] {
			assert!(book.get(id).unwrap().status.is_terminal());
		}
	}

	#[test]
	fn test_probabilistic_only_touches_cohort_once() {
		let engine = ProgressionEngine::new(DelayPolicy::Hours);
		let mut book = book((1..=40).map(|id| (id, Status::Pending, 300)).collect());
		book.track_new(100, TrackingState::pending(now() - Duration::hours(300)))
			.unwrap();
		let mut rng = StdRng::seed_from_u64(17);

		let outcome = engine
			.run_probabilistic(&mut rng, &mut book, 1.0, now())
			.unwrap();

		assert_eq!(outcome.updates.len(), 40);
		assert!(!outcome.halted_early);
		let mut ids: Vec<u64> = outcome.updates.iter().map(|u| u.order_id).collect();
		ids.dedup();
		assert_eq!(ids, (1..=40).collect::<Vec<_>>());
		assert_eq!(book.get(100).unwrap().status, Status::Pending);
	}

	#[test]
	fn test_probabilistic_zero_probability() {
		let engine = ProgressionEngine::new(DelayPolicy::Hours);
		let mut book = book(vec![(1, Status::Pending, 300)]);
		let mut rng = StdRng::seed_from_u64(17);

		let outcome = engine
			.run_probabilistic(&mut rng, &mut book, 0.0, now())
			.unwrap();
		assert!(outcome.updates.is_empty());
	}
}
