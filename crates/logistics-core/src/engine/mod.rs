//! Generation cycle orchestration.
//!
//! A cycle takes ownership of the tracking store, continues the id sequence,
//! creates new orders, advances tracked ones, persists the resulting tracking
//! state and finally hands orders and updates to the sink.

pub mod summary;

use crate::catalog::Catalog;
use crate::generator::{random_base_id, OrderGenerator};
use crate::progression::{ProgressionEngine, ProgressionOutcome};
use crate::state::TrackingBook;
use chrono::NaiveDateTime;
use logistics_config::Config;
use logistics_sink::SinkService;
use logistics_storage::StorageService;
use logistics_types::{Dataset, GenerationMode, Order, TransitionTable};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub use summary::RunSummary;

/// Errors that can occur while running a generation cycle.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Storage error: {0}")]
	Storage(String),
	#[error("Sink error: {0}")]
	Sink(String),
	#[error("Tracking error: {0}")]
	Tracking(String),
}

/// Runs generation cycles against a tracking store and an output sink.
pub struct GeneratorEngine {
	config: Config,
	storage: Arc<StorageService>,
	sink: Arc<SinkService>,
	table: Arc<TransitionTable>,
	generator: OrderGenerator,
	progression: ProgressionEngine,
}

impl GeneratorEngine {
	pub fn new(
		config: Config,
		storage: Arc<StorageService>,
		sink: Arc<SinkService>,
	) -> Result<Self, EngineError> {
		let catalog = Catalog::new(config.catalog.products.clone()).ok_or_else(|| {
			EngineError::Config("Catalog must contain at least one product".into())
		})?;
		let generator = OrderGenerator::new(Arc::new(catalog), config.generator.sale_window);
		let progression = ProgressionEngine::new(config.generator.delay);

		Ok(Self {
			config,
			storage,
			sink,
			table: Arc::new(TransitionTable::standard()),
			generator,
			progression,
		})
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Runs one cycle with the configured seed and the local wall clock.
	pub async fn run(&self) -> Result<RunSummary, EngineError> {
		let mut rng = match self.config.generator.seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_entropy(),
		};
		let now = chrono::Local::now().naive_local();
		self.run_cycle(&mut rng, now).await
	}

	/// Runs one cycle with an explicit random source and clock reading.
	pub async fn run_cycle<R: Rng + Send + ?Sized>(
		&self,
		rng: &mut R,
		now: NaiveDateTime,
	) -> Result<RunSummary, EngineError> {
		let settings = &self.config.generator;
		let run_id = Uuid::new_v4();
		tracing::info!(
			run_id = %run_id,
			mode = %settings.mode,
			orders = settings.order_count,
			"Starting generation cycle"
		);

		self.storage
			.begin()
			.await
			.map_err(|e| EngineError::Storage(e.to_string()))?;

		let (orders, outcome, tracked_total) =
			match self.update_store(rng, run_id, now).await {
				Ok(result) => result,
				Err(e) => {
					if let Err(rollback_error) = self.storage.rollback().await {
						tracing::warn!(
							run_id = %run_id,
							error = %rollback_error,
							"Failed to release tracking store"
						);
					}
					return Err(e);
				},
			};

		self.sink
			.publish_all(Dataset::Orders, &orders)
			.await
			.map_err(|e| EngineError::Sink(e.to_string()))?;
		self.sink
			.publish_all(Dataset::Updates, &outcome.updates)
			.await
			.map_err(|e| EngineError::Sink(e.to_string()))?;

		let summary = RunSummary {
			run_id,
			mode: settings.mode,
			orders_created: orders.len(),
			first_order_id: orders.first().map(|o| o.order_id),
			last_order_id: orders.last().map(|o| o.order_id),
			updates_emitted: outcome.updates.len(),
			halted_early: outcome.halted_early,
			tracked_total,
		};
		tracing::info!(
			run_id = %run_id,
			orders_created = summary.orders_created,
			updates_emitted = summary.updates_emitted,
			halted_early = summary.halted_early,
			tracked_total = summary.tracked_total,
			"Generation cycle complete"
		);
		Ok(summary)
	}

	/// Generates and advances orders against an owned store, then commits it.
	async fn update_store<R: Rng + Send + ?Sized>(
		&self,
		rng: &mut R,
		run_id: Uuid,
		now: NaiveDateTime,
	) -> Result<(Vec<Order>, ProgressionOutcome, usize), EngineError> {
		let settings = &self.config.generator;
		let first_id = match self
			.storage
			.next_order_id()
			.await
			.map_err(|e| EngineError::Storage(e.to_string()))?
		{
			Some(id) => id,
			None => random_base_id(rng, settings.start_id_min, settings.start_id_max),
		};
		if first_id.checked_add(settings.order_count as u64).is_none() {
			return Err(EngineError::Config(format!(
				"Cannot create {} orders starting at id {}",
				settings.order_count, first_id
			)));
		}

		let prior = self
			.storage
			.active_orders()
			.await
			.map_err(|e| EngineError::Storage(e.to_string()))?;
		let mut book = TrackingBook::new(self.table.clone(), prior, now);
		tracing::debug!(
			run_id = %run_id,
			active = book.len(),
			cohort = book.cohort().len(),
			"Loaded tracking state"
		);

		let orders = self
			.generator
			.generate(rng, settings.order_count, first_id, now);
		for order in &orders {
			book.track_new(order.order_id, order.tracking_state())
				.map_err(|e| EngineError::Tracking(e.to_string()))?;
		}

		let outcome = self.progress(rng, &mut book, now)?;

		for (order_id, state) in book.created_entries() {
			self.storage
				.track(order_id, state)
				.await
				.map_err(|e| EngineError::Storage(e.to_string()))?;
		}
		for (order_id, state) in book.changed_entries() {
			self.storage
				.save(order_id, state)
				.await
				.map_err(|e| EngineError::Storage(e.to_string()))?;
		}
		let tracked_total = self
			.storage
			.tracked_count()
			.await
			.map_err(|e| EngineError::Storage(e.to_string()))?;
		self.storage
			.commit()
			.await
			.map_err(|e| EngineError::Storage(e.to_string()))?;

		Ok((orders, outcome, tracked_total))
	}

	fn progress<R: Rng + ?Sized>(
		&self,
		rng: &mut R,
		book: &mut TrackingBook,
		now: NaiveDateTime,
	) -> Result<ProgressionOutcome, EngineError> {
		let settings = &self.config.generator;
		let outcome = match settings.mode {
			GenerationMode::Exhaustive => {
				self.progression
					.run_exhaustive(rng, book, settings.update_count, now)
			},
			GenerationMode::Probabilistic => {
				self.progression
					.run_probabilistic(rng, book, settings.update_probability, now)
			},
		};
		outcome.map_err(|e| EngineError::Tracking(e.to_string()))
	}
}
