//! File-based storage backend.
//!
//! All tracking state is kept in a single JSON document. A run takes an
//! advisory exclusive lock on a sibling `.lock` file in `begin`, works on an
//! in-memory copy of the document, and writes it back atomically in `commit`.
//! A second invocation started meanwhile waits for the lock up to the
//! configured timeout and then fails instead of racing on the id sequence.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use fs2::FileExt;
use logistics_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, Status, TrackingState,
	ValidationError,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::sync::Mutex;

const DEFAULT_STORAGE_PATH: &str = "./data/state/tracking.json";
const DEFAULT_LOCK_TIMEOUT_SECONDS: u64 = 10;
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// On-disk layout of the tracking document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct TrackingDocument {
	version: u16,
	orders: BTreeMap<u64, TrackingState>,
}

impl TrackingDocument {
	const VERSION: u16 = 1;
}

#[derive(Default)]
struct FileState {
	orders: BTreeMap<u64, TrackingState>,
	loaded: bool,
	dirty: bool,
	/// Held while a run owns the store; dropping it releases the lock.
	lock: Option<File>,
}

/// File-based storage implementation.
pub struct FileStorage {
	/// Path of the JSON document.
	path: PathBuf,
	/// Longest time `begin` waits for another run to release the store.
	lock_timeout: Duration,
	state: Mutex<FileState>,
}

impl FileStorage {
	pub fn new(path: PathBuf, lock_timeout: Duration) -> Self {
		Self {
			path,
			lock_timeout,
			state: Mutex::new(FileState::default()),
		}
	}

	fn lock_path(&self) -> PathBuf {
		let mut name = self
			.path
			.file_name()
			.map(|n| n.to_os_string())
			.unwrap_or_default();
		name.push(".lock");
		self.path.with_file_name(name)
	}

	async fn ensure_parent_dir(path: &Path) -> Result<(), StorageError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}
		Ok(())
	}

	/// Polls the lock file until it can be locked or the timeout elapses.
	async fn acquire_lock(&self) -> Result<File, StorageError> {
		let lock_path = self.lock_path();
		Self::ensure_parent_dir(&lock_path).await?;

		let file = OpenOptions::new()
			.read(true)
			.write(true)
			.create(true)
			.truncate(false)
			.open(&lock_path)
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		let started = Instant::now();
		let mut warned = false;
		loop {
			match file.try_lock_exclusive() {
				Ok(()) => return Ok(file),
				Err(e) if is_contended(&e) => {
					if started.elapsed() >= self.lock_timeout {
						return Err(StorageError::LockTimeout(lock_path.display().to_string()));
					}
					if !warned {
						tracing::warn!(
							path = %lock_path.display(),
							timeout_secs = self.lock_timeout.as_secs(),
							"Tracking store is locked by another run, waiting"
						);
						warned = true;
					}
					tokio::time::sleep(LOCK_RETRY_INTERVAL).await;
				},
				Err(e) => return Err(StorageError::Backend(e.to_string())),
			}
		}
	}

	async fn read_document(&self) -> Result<BTreeMap<u64, TrackingState>, StorageError> {
		let data = match fs::read(&self.path).await {
			Ok(data) => data,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};
		if data.iter().all(u8::is_ascii_whitespace) {
			return Ok(BTreeMap::new());
		}

		let document: TrackingDocument = serde_json::from_slice(&data)
			.map_err(|e| StorageError::Serialization(e.to_string()))?;
		if document.version > TrackingDocument::VERSION {
			return Err(StorageError::Backend(format!(
				"Unsupported tracking document version: {}",
				document.version
			)));
		}
		Ok(document.orders)
	}

	/// Writes the document atomically by writing to a temp file then renaming.
	async fn write_document(&self, orders: &BTreeMap<u64, TrackingState>) -> Result<(), StorageError> {
		Self::ensure_parent_dir(&self.path).await?;

		#[derive(Serialize)]
		struct DocumentRef<'a> {
			version: u16,
			orders: &'a BTreeMap<u64, TrackingState>,
		}
		let bytes = serde_json::to_vec_pretty(&DocumentRef {
			version: TrackingDocument::VERSION,
			orders,
		})
		.map_err(|e| StorageError::Serialization(e.to_string()))?;

		let temp_path = self.path.with_extension("tmp");
		fs::write(&temp_path, bytes)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &self.path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		Ok(())
	}

	async fn loaded_state(&self) -> Result<tokio::sync::MutexGuard<'_, FileState>, StorageError> {
		let mut state = self.state.lock().await;
		if !state.loaded {
			state.orders = self.read_document().await?;
			state.loaded = true;
		}
		Ok(state)
	}
}

fn release_lock(state: &mut FileState) {
	if let Some(lock) = state.lock.take() {
		if let Err(e) = FileExt::unlock(&lock) {
			tracing::warn!("Failed to release tracking store lock: {}", e);
		}
	}
}

fn is_contended(e: &std::io::Error) -> bool {
	e.kind() == ErrorKind::WouldBlock
		|| e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn begin(&self) -> Result<(), StorageError> {
		let mut state = self.state.lock().await;
		if state.lock.is_none() {
			state.lock = Some(self.acquire_lock().await?);
		}

		// Another run may have committed while we were waiting
		state.orders = self.read_document().await?;
		state.loaded = true;
		state.dirty = false;
		tracing::debug!(
			path = %self.path.display(),
			tracked = state.orders.len(),
			"Acquired tracking store"
		);
		Ok(())
	}

	async fn get(&self, order_id: u64) -> Result<TrackingState, StorageError> {
		let state = self.loaded_state().await?;
		state
			.orders
			.get(&order_id)
			.copied()
			.ok_or(StorageError::NotFound(order_id))
	}

	async fn scan(
		&self,
		exclude: &[Status],
	) -> Result<BTreeMap<u64, TrackingState>, StorageError> {
		let state = self.loaded_state().await?;
		Ok(state
			.orders
			.iter()
			.filter(|(_, s)| !exclude.contains(&s.status))
			.map(|(id, s)| (*id, *s))
			.collect())
	}

	async fn insert(&self, order_id: u64, entry: TrackingState) -> Result<(), StorageError> {
		let mut state = self.loaded_state().await?;
		if state.orders.contains_key(&order_id) {
			return Err(StorageError::AlreadyExists(order_id));
		}
		state.orders.insert(order_id, entry);
		state.dirty = true;
		Ok(())
	}

	async fn update(&self, order_id: u64, entry: TrackingState) -> Result<(), StorageError> {
		let mut state = self.loaded_state().await?;
		let slot = state
			.orders
			.get_mut(&order_id)
			.ok_or(StorageError::NotFound(order_id))?;
		*slot = entry;
		state.dirty = true;
		Ok(())
	}

	async fn max_order_id(&self) -> Result<Option<u64>, StorageError> {
		let state = self.loaded_state().await?;
		Ok(state.orders.keys().next_back().copied())
	}

	async fn count(&self) -> Result<usize, StorageError> {
		Ok(self.loaded_state().await?.orders.len())
	}

	async fn commit(&self) -> Result<(), StorageError> {
		let mut state = self.state.lock().await;
		if state.dirty {
			self.write_document(&state.orders).await?;
			state.dirty = false;
			tracing::debug!(
				path = %self.path.display(),
				tracked = state.orders.len(),
				"Tracking store written"
			);
		}

		release_lock(&mut state);
		Ok(())
	}

	async fn rollback(&self) -> Result<(), StorageError> {
		let mut state = self.state.lock().await;
		if state.dirty {
			tracing::warn!(
				path = %self.path.display(),
				"Discarding uncommitted tracking changes"
			);
		}
		state.orders.clear();
		state.loaded = false;
		state.dirty = false;
		release_lock(&mut state);
		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("storage_path", FieldType::String).with_validator(|v| {
					match v.as_str() {
						Some(path) if !path.trim().is_empty() => Ok(()),
						_ => Err("storage_path cannot be empty".to_string()),
					}
				}),
				Field::new(
					"lock_timeout_seconds",
					FieldType::Integer {
						min: Some(0),
						max: Some(3600),
					},
				),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create a storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Path of the tracking document (default: "./data/state/tracking.json")
/// - `lock_timeout_seconds`: Wait for a concurrent run to finish (default: 10)
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_STORAGE_PATH);
	let lock_timeout = config
		.get("lock_timeout_seconds")
		.and_then(|v| v.as_integer())
		.map(|v| v as u64)
		.unwrap_or(DEFAULT_LOCK_TIMEOUT_SECONDS);

	Ok(Box::new(FileStorage::new(
		PathBuf::from(storage_path),
		Duration::from_secs(lock_timeout),
	)))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
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
	use tempfile::TempDir;

	fn state(status: Status, hour: u32) -> TrackingState {
		TrackingState {
			status,
			last_date: NaiveDate::from_ymd_opt(2026, 6, 1)
				.unwrap()
				.and_hms_opt(hour, 15, 0)
				.unwrap(),
		}
	}

	fn storage_in(dir: &TempDir) -> FileStorage {
		FileStorage::new(dir.path().join("state").join("tracking.json"), Duration::ZERO)
	}

	#[tokio::test]
	async fn test_missing_document_is_empty() {
		let dir = TempDir::new().unwrap();
		let storage = storage_in(&dir);

		storage.begin().await.unwrap();
		assert_eq!(storage.count().await.unwrap(), 0);
		assert_eq!(storage.max_order_id().await.unwrap(), None);
		storage.commit().await.unwrap();

		// Nothing changed, nothing written
		assert!(!dir.path().join("state").join("tracking.json").exists());
	}

	#[tokio::test]
	async fn test_commit_persists_across_instances() {
		let dir = TempDir::new().unwrap();

		let first = storage_in(&dir);
		first.begin().await.unwrap();
		first.insert(1500, state(Status::Pending, 8)).await.unwrap();
		first.insert(1501, state(Status::Pending, 9)).await.unwrap();
		first.update(1500, state(Status::Cancelled, 12)).await.unwrap();
		first.commit().await.unwrap();

		let second = storage_in(&dir);
		second.begin().await.unwrap();
		assert_eq!(second.count().await.unwrap(), 2);
		assert_eq!(second.max_order_id().await.unwrap(), Some(1501));
		assert_eq!(
			second.get(1500).await.unwrap(),
			state(Status::Cancelled, 12)
		);
		let active = second.scan(&Status::TERMINAL).await.unwrap();
		assert_eq!(active.keys().copied().collect::<Vec<_>>(), vec![1501]);
		second.commit().await.unwrap();
	}

	#[tokio::test]
	async fn test_concurrent_run_times_out() {
		let dir = TempDir::new().unwrap();

		let owner = storage_in(&dir);
		owner.begin().await.unwrap();

		let contender = storage_in(&dir);
		let result = contender.begin().await;
		assert!(matches!(result, Err(StorageError::LockTimeout(_))));

		owner.commit().await.unwrap();
		contender.begin().await.unwrap();
		contender.commit().await.unwrap();
	}

	#[tokio::test]
	async fn test_rollback_discards_changes_and_unlocks() {
		let dir = TempDir::new().unwrap();

		let seed = storage_in(&dir);
		seed.begin().await.unwrap();
		seed.insert(10, state(Status::Pending, 7)).await.unwrap();
		seed.commit().await.unwrap();

		let failed = storage_in(&dir);
		failed.begin().await.unwrap();
		failed.insert(11, state(Status::Pending, 8)).await.unwrap();
		failed.update(10, state(Status::Processing, 9)).await.unwrap();
		failed.rollback().await.unwrap();

		let next = storage_in(&dir);
		next.begin().await.unwrap();
		assert_eq!(next.count().await.unwrap(), 1);
		assert_eq!(next.get(10).await.unwrap(), state(Status::Pending, 7));
		next.commit().await.unwrap();

		// The rolled back instance can own the store again
		failed.begin().await.unwrap();
		assert_eq!(failed.max_order_id().await.unwrap(), Some(10));
		failed.commit().await.unwrap();
	}

	#[tokio::test]
	async fn test_corrupt_document_reported() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("tracking.json");
		std::fs::write(&path, b"{not json").unwrap();

		let storage = FileStorage::new(path, Duration::ZERO);
		assert!(matches!(
			storage.begin().await,
			Err(StorageError::Serialization(_))
		));
	}

	#[tokio::test]
	async fn test_document_layout() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("tracking.json");

		let storage = FileStorage::new(path.clone(), Duration::ZERO);
		storage.begin().await.unwrap();
		storage.insert(7, state(Status::Shipped, 6)).await.unwrap();
		storage.commit().await.unwrap();

		let json: serde_json::Value =
			serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
		assert_eq!(json["version"], 1);
		assert_eq!(json["orders"]["7"]["status"], "Shipped");
		assert_eq!(json["orders"]["7"]["last_date"], "2026-06-01T06:15:00");
	}

	#[test]
	fn test_factory_validates_config() {
		let config: toml::Value = toml::from_str("lock_timeout_seconds = -1").unwrap();
		assert!(matches!(
			create_storage(&config),
			Err(StorageError::Configuration(_))
		));

		let config: toml::Value =
			toml::from_str("storage_path = \"/tmp/t.json\"\nlock_timeout_seconds = 2").unwrap();
		assert!(create_storage(&config).is_ok());
	}
}
