//! Storage module for the logistics data generator.
//!
//! This module persists per-order tracking state between generator runs so
//! that a run can continue the id sequence and advance orders created by
//! earlier runs. Backends implement [`StorageInterface`]; the generator only
//! talks to the typed [`StorageService`] wrapper.

use async_trait::async_trait;
use logistics_types::{ConfigSchema, ImplementationRegistry, Status, TrackingState};
use std::collections::BTreeMap;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// The requested order is not tracked.
	#[error("Order not tracked: {0}")]
	NotFound(u64),
	/// An insert targeted an order that is already tracked.
	#[error("Order already tracked: {0}")]
	AlreadyExists(u64),
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Another invocation held the store for longer than the allowed wait.
	#[error("Timed out waiting for storage lock: {0}")]
	LockTimeout(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Keyed store of tracking state, one entry per order id.
///
/// Backends that are shared between processes serialize runs through
/// [`begin`](StorageInterface::begin) and [`commit`](StorageInterface::commit):
/// `begin` takes exclusive ownership of the store and refreshes the view of
/// it. `commit` makes all changes durable and releases ownership, while
/// `rollback` releases ownership without writing anything.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Takes exclusive ownership of the store for the current run.
	async fn begin(&self) -> Result<(), StorageError> {
		Ok(())
	}

	/// Looks up the tracking state of one order.
	async fn get(&self, order_id: u64) -> Result<TrackingState, StorageError>;

	/// Returns every tracked order whose status is not in `exclude`, keyed by id.
	async fn scan(&self, exclude: &[Status])
		-> Result<BTreeMap<u64, TrackingState>, StorageError>;

	/// Starts tracking a new order. Fails if the id is already tracked.
	async fn insert(&self, order_id: u64, state: TrackingState) -> Result<(), StorageError>;

	/// Overwrites the state of a tracked order. Fails if the id is unknown.
	async fn update(&self, order_id: u64, state: TrackingState) -> Result<(), StorageError>;

	/// Highest order id ever tracked, if any.
	async fn max_order_id(&self) -> Result<Option<u64>, StorageError>;

	/// Number of tracked orders, terminal ones included.
	async fn count(&self) -> Result<usize, StorageError>;

	/// Makes pending changes durable and releases ownership.
	async fn commit(&self) -> Result<(), StorageError> {
		Ok(())
	}

	/// Discards pending changes and releases ownership after a failed run.
	async fn rollback(&self) -> Result<(), StorageError> {
		Ok(())
	}

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples for all available storage implementations.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Typed access to the tracking store used by the generation cycle.
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	/// Takes exclusive ownership of the store for a run.
	pub async fn begin(&self) -> Result<(), StorageError> {
		self.backend.begin().await
	}

	/// Persists the run's changes and releases the store.
	pub async fn commit(&self) -> Result<(), StorageError> {
		self.backend.commit().await
	}

	/// Drops the run's changes and releases the store.
	pub async fn rollback(&self) -> Result<(), StorageError> {
		self.backend.rollback().await
	}

	pub async fn get(&self, order_id: u64) -> Result<TrackingState, StorageError> {
		self.backend.get(order_id).await
	}

	/// Tracked orders that have not reached a terminal status.
	pub async fn active_orders(&self) -> Result<BTreeMap<u64, TrackingState>, StorageError> {
		self.backend.scan(&Status::TERMINAL).await
	}

	/// Id following the highest tracked one, or `None` for an empty store.
	pub async fn next_order_id(&self) -> Result<Option<u64>, StorageError> {
		let max = self.backend.max_order_id().await?;
		match max {
			Some(id) => id
				.checked_add(1)
				.map(Some)
				.ok_or_else(|| StorageError::Backend("Order id space exhausted".into())),
			None => Ok(None),
		}
	}

	/// Starts tracking a newly created order.
	pub async fn track(&self, order_id: u64, state: TrackingState) -> Result<(), StorageError> {
		self.backend.insert(order_id, state).await
	}

	/// Records the new state of an already tracked order.
	pub async fn save(&self, order_id: u64, state: TrackingState) -> Result<(), StorageError> {
		self.backend.update(order_id, state).await
	}

	/// Number of tracked orders.
	pub async fn tracked_count(&self) -> Result<usize, StorageError> {
		self.backend.count().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::NaiveDate;
	use implementations::memory::MemoryStorage;

	fn state(status: Status) -> TrackingState {
		TrackingState {
			status,
			last_date: NaiveDate::from_ymd_opt(2026, 2, 1)
				.unwrap()
				.and_hms_opt(10, 0, 0)
				.unwrap(),
		}
	}

	#[tokio::test]
	async fn test_active_orders_skip_terminal() {
		let service = StorageService::new(Box::new(MemoryStorage::new()));
		service.track(1, state(Status::Pending)).await.unwrap();
		service.track(2, state(Status::Delivered)).await.unwrap();
		service.track(3, state(Status::Shipped)).await.unwrap();
		service.track(4, state(Status::Cancelled)).await.unwrap();

		let active = service.active_orders().await.unwrap();
		assert_eq!(active.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
		assert_eq!(service.tracked_count().await.unwrap(), 4);
	}

	#[tokio::test]
	async fn test_next_order_id() {
		let service = StorageService::new(Box::new(MemoryStorage::new()));
		assert_eq!(service.next_order_id().await.unwrap(), None);

		service.track(4100, state(Status::Pending)).await.unwrap();
		service.track(4107, state(Status::Delivered)).await.unwrap();
		assert_eq!(service.next_order_id().await.unwrap(), Some(4108));
	}

	#[tokio::test]
	async fn test_save_requires_tracked_order() {
		let service = StorageService::new(Box::new(MemoryStorage::new()));
		let result = service.save(5, state(Status::Processing)).await;
		assert!(matches!(result, Err(StorageError::NotFound(5))));
	}

	#[test]
	fn test_all_implementations_registered() {
		let names: Vec<_> = get_all_implementations()
			.into_iter()
			.map(|(name, _)| name)
			.collect();
		assert_eq!(names, vec!["file", "memory"]);
	}
}
