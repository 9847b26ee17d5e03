//! In-memory storage backend.
//!
//! Tracking state lives only as long as the process. Useful for tests and for
//! one-shot runs that should not extend an earlier order history.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use logistics_types::{
	ConfigSchema, ImplementationRegistry, Schema, Status, TrackingState, ValidationError,
};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// In-memory storage implementation.
pub struct MemoryStorage {
	entries: RwLock<BTreeMap<u64, TrackingState>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self {
			entries: RwLock::new(BTreeMap::new()),
		}
	}
}

impl Default for MemoryStorage {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get(&self, order_id: u64) -> Result<TrackingState, StorageError> {
		let entries = self.entries.read().await;
		entries
			.get(&order_id)
			.copied()
			.ok_or(StorageError::NotFound(order_id))
	}

	async fn scan(
		&self,
		exclude: &[Status],
	) -> Result<BTreeMap<u64, TrackingState>, StorageError> {
		let entries = self.entries.read().await;
		Ok(entries
			.iter()
			.filter(|(_, state)| !exclude.contains(&state.status))
			.map(|(id, state)| (*id, *state))
			.collect())
	}

	async fn insert(&self, order_id: u64, state: TrackingState) -> Result<(), StorageError> {
		let mut entries = self.entries.write().await;
		if entries.contains_key(&order_id) {
			return Err(StorageError::AlreadyExists(order_id));
		}
		entries.insert(order_id, state);
		Ok(())
	}

	async fn update(&self, order_id: u64, state: TrackingState) -> Result<(), StorageError> {
		let mut entries = self.entries.write().await;
		let entry = entries
			.get_mut(&order_id)
			.ok_or(StorageError::NotFound(order_id))?;
		*entry = state;
		Ok(())
	}

	async fn max_order_id(&self) -> Result<Option<u64>, StorageError> {
		let entries = self.entries.read().await;
		Ok(entries.keys().next_back().copied())
	}

	async fn count(&self) -> Result<usize, StorageError> {
		Ok(self.entries.read().await.len())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStorageSchema)
	}
}

/// Configuration schema for MemoryStorage.
pub struct MemoryStorageSchema;

impl ConfigSchema for MemoryStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// No settings
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Factory function to create a memory storage backend from configuration.
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	MemoryStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;
	Ok(Box::new(MemoryStorage::new()))
}

/// Registry for the memory storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::NaiveDate;

	fn state(status: Status, day: u32) -> TrackingState {
		TrackingState {
			status,
			last_date: NaiveDate::from_ymd_opt(2026, 4, day)
				.unwrap()
				.and_hms_opt(9, 30, 0)
				.unwrap(),
		}
	}

	#[tokio::test]
	async fn test_basic_operations() {
		let storage = MemoryStorage::new();

		storage.insert(10, state(Status::Pending, 1)).await.unwrap();
		assert_eq!(storage.get(10).await.unwrap(), state(Status::Pending, 1));

		storage.update(10, state(Status::Processing, 2)).await.unwrap();
		assert_eq!(storage.get(10).await.unwrap().status, Status::Processing);

		assert!(matches!(
			storage.get(11).await,
			Err(StorageError::NotFound(11))
		));
	}

	#[tokio::test]
	async fn test_insert_rejects_duplicates() {
		let storage = MemoryStorage::new();
		storage.insert(3, state(Status::Pending, 1)).await.unwrap();

		let result = storage.insert(3, state(Status::Pending, 2)).await;
		assert!(matches!(result, Err(StorageError::AlreadyExists(3))));
		assert_eq!(storage.get(3).await.unwrap(), state(Status::Pending, 1));
	}

	#[tokio::test]
	async fn test_scan_and_max_id() {
		let storage = MemoryStorage::new();
		assert_eq!(storage.max_order_id().await.unwrap(), None);

		storage.insert(20, state(Status::Delivered, 1)).await.unwrap();
		storage.insert(5, state(Status::Shipped, 1)).await.unwrap();
		storage.insert(12, state(Status::Pending, 1)).await.unwrap();

		let active = storage.scan(&Status::TERMINAL).await.unwrap();
		assert_eq!(active.keys().copied().collect::<Vec<_>>(), vec![5, 12]);
		assert_eq!(storage.scan(&[]).await.unwrap().len(), 3);
		assert_eq!(storage.max_order_id().await.unwrap(), Some(20));
		assert_eq!(storage.count().await.unwrap(), 3);
	}

	#[test]
	fn test_factory_rejects_unknown_settings() {
		let config: toml::Value = toml::from_str("storage_path = \"x\"").unwrap();
		assert!(matches!(
			create_storage(&config),
			Err(StorageError::Configuration(_))
		));
	}
}
