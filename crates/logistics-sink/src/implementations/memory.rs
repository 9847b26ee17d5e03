//! In-memory sink backend.
//!
//! Keeps every written batch so that tests can inspect what a run produced.
//! Clones share the same buffer.

use crate::{batch_header, SinkError, SinkFactory, SinkInterface, SinkRegistry};
use async_trait::async_trait;
use logistics_types::{
	ConfigSchema, Dataset, ImplementationRegistry, Record, Schema, ValidationError,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Buffer {
	datasets: BTreeMap<Dataset, Vec<Record>>,
	writes: usize,
}

/// In-memory sink implementation.
#[derive(Clone, Default)]
pub struct MemorySink {
	inner: Arc<RwLock<Buffer>>,
}

impl MemorySink {
	pub fn new() -> Self {
		Self::default()
	}

	/// All records written to a dataset, in write order.
	pub async fn records(&self, dataset: Dataset) -> Vec<Record> {
		self.inner
			.read()
			.await
			.datasets
			.get(&dataset)
			.cloned()
			.unwrap_or_default()
	}

	/// Whether any batch was written to the dataset.
	pub async fn contains(&self, dataset: Dataset) -> bool {
		self.inner.read().await.datasets.contains_key(&dataset)
	}

	/// Number of `write` calls received.
	pub async fn write_count(&self) -> usize {
		self.inner.read().await.writes
	}
}

#[async_trait]
impl SinkInterface for MemorySink {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemorySinkSchema)
	}

	async fn write(&self, dataset: Dataset, records: &[Record]) -> Result<usize, SinkError> {
		if records.is_empty() {
			return Ok(0);
		}
		let header = batch_header(dataset, records)?;

		let mut buffer = self.inner.write().await;
		let stored = buffer.datasets.entry(dataset).or_default();
		if let Some(existing) = stored.first() {
			if !existing.field_names().eq(header.iter().copied()) {
				return Err(SinkError::Schema(format!(
					"dataset '{}' already holds records with a different header",
					dataset
				)));
			}
		}
		stored.extend_from_slice(records);
		buffer.writes += 1;
		Ok(records.len())
	}
}

/// Configuration schema for MemorySink.
pub struct MemorySinkSchema;

impl ConfigSchema for MemorySinkSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Factory function to create a memory sink from configuration.
pub fn create_sink(config: &toml::Value) -> Result<Box<dyn SinkInterface>, SinkError> {
	MemorySinkSchema
		.validate(config)
		.map_err(|e| SinkError::Configuration(e.to_string()))?;
	Ok(Box::new(MemorySink::new()))
}

/// Registry for the memory sink implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = SinkFactory;

	fn factory() -> Self::Factory {
		create_sink
	}
}

impl SinkRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	fn order_row(id: u64) -> Record {
		Record::new().with("order_id", id).with("status", "Pending")
	}

	#[tokio::test]
	async fn test_batches_accumulate() {
		let sink = MemorySink::new();
		sink.write(Dataset::Orders, &[order_row(1), order_row(2)])
			.await
			.unwrap();
		sink.write(Dataset::Orders, &[order_row(3)]).await.unwrap();

		let records = sink.records(Dataset::Orders).await;
		assert_eq!(records.len(), 3);
		assert_eq!(records[2].get("order_id"), Some("3"));
		assert_eq!(sink.write_count().await, 2);
		assert!(sink.records(Dataset::Updates).await.is_empty());
	}

	#[tokio::test]
	async fn test_header_change_rejected() {
		let sink = MemorySink::new();
		sink.write(Dataset::Orders, &[order_row(1)]).await.unwrap();

		let other = Record::new().with("id", 2);
		let result = sink.write(Dataset::Orders, &[other]).await;
		assert!(matches!(result, Err(SinkError::Schema(_))));
	}
}
