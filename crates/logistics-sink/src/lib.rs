//! Output sink module for the logistics data generator.
//!
//! Generated orders and status updates leave the generator as flat records,
//! one batch per dataset and run. Sinks persist those batches; the header of a
//! dataset is derived from the field names of its first record.

use async_trait::async_trait;
use logistics_types::{ConfigSchema, Dataset, ImplementationRegistry, Record, ToRecord};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod csv;
	pub mod memory;
}

/// Errors that can occur while writing records.
#[derive(Debug, Error)]
pub enum SinkError {
	/// The destination could not be read or written.
	#[error("IO error: {0}")]
	Io(String),
	/// A record does not match the header of its dataset.
	#[error("Schema mismatch: {0}")]
	Schema(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for record sinks.
#[async_trait]
pub trait SinkInterface: Send + Sync {
	/// Returns the configuration schema for this sink implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Persists a batch of records to a dataset and returns the number written.
	///
	/// All records of a batch must share the field names of the first one.
	async fn write(&self, dataset: Dataset, records: &[Record]) -> Result<usize, SinkError>;
}

/// Type alias for sink factory functions.
pub type SinkFactory = fn(&toml::Value) -> Result<Box<dyn SinkInterface>, SinkError>;

/// Registry trait for sink implementations.
pub trait SinkRegistry: ImplementationRegistry<Factory = SinkFactory> {}

/// Get all registered sink implementations.
///
/// Returns a vector of (name, factory) tuples for all available sink implementations.
pub fn get_all_implementations() -> Vec<(&'static str, SinkFactory)> {
	use implementations::{csv, memory};

	vec![
		(csv::Registry::NAME, csv::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Returns the header of a batch, rejecting records whose fields deviate from it.
pub fn batch_header(dataset: Dataset, records: &[Record]) -> Result<Vec<&'static str>, SinkError> {
	let Some(first) = records.first() else {
		return Ok(Vec::new());
	};
	let header: Vec<&'static str> = first.field_names().collect();

	for (index, record) in records.iter().enumerate().skip(1) {
		if !record.field_names().eq(header.iter().copied()) {
			return Err(SinkError::Schema(format!(
				"record {} of dataset '{}' has fields [{}], expected [{}]",
				index,
				dataset,
				record.field_names().collect::<Vec<_>>().join(", "),
				header.join(", ")
			)));
		}
	}
	Ok(header)
}

/// Service writing generated data through the configured sink.
pub struct SinkService {
	/// The underlying sink implementation.
	backend: Box<dyn SinkInterface>,
}

impl SinkService {
	/// Creates a new SinkService with the specified backend.
	pub fn new(backend: Box<dyn SinkInterface>) -> Self {
		Self { backend }
	}

	/// Writes a batch of records. Empty batches leave the sink untouched.
	pub async fn publish(&self, dataset: Dataset, records: &[Record]) -> Result<usize, SinkError> {
		if records.is_empty() {
			tracing::debug!(dataset = %dataset, "Nothing to write, skipping");
			return Ok(0);
		}

		let written = self.backend.write(dataset, records).await?;
		tracing::debug!(dataset = %dataset, records = written, "Batch written");
		Ok(written)
	}

	/// Converts domain values to records and writes them.
	pub async fn publish_all<T: ToRecord>(
		&self,
		dataset: Dataset,
		items: &[T],
	) -> Result<usize, SinkError> {
		let records: Vec<Record> = items.iter().map(ToRecord::to_record).collect();
		self.publish(dataset, &records).await
	}
}
