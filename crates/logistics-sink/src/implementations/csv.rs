//! Delimited-file sink backend.
//!
//! Each dataset is written to `<output_path>/<dataset>.csv`. By default a run
//! replaces the previous file; in append mode rows are added to it and the
//! header is only written when the file is new or empty.

use crate::{batch_header, SinkError, SinkFactory, SinkInterface, SinkRegistry};
use async_trait::async_trait;
use logistics_types::{
	ConfigSchema, Dataset, Field, FieldType, ImplementationRegistry, Record, Schema,
	ValidationError,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const DEFAULT_OUTPUT_PATH: &str = "./data/raw";

/// CSV sink implementation.
pub struct CsvSink {
	/// Directory the dataset files live in.
	output_path: PathBuf,
	/// Field delimiter byte.
	delimiter: u8,
	/// Whether runs add to existing files instead of replacing them.
	append: bool,
}

impl CsvSink {
	pub fn new(output_path: PathBuf, delimiter: u8, append: bool) -> Self {
		Self {
			output_path,
			delimiter,
			append,
		}
	}

	fn dataset_path(&self, dataset: Dataset) -> PathBuf {
		self.output_path.join(format!("{}.csv", dataset.as_str()))
	}

	/// Header of an existing, non-empty file, if any.
	async fn existing_header(&self, path: &Path) -> Result<Option<Vec<String>>, SinkError> {
		let data = match fs::read(path).await {
			Ok(data) => data,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(SinkError::Io(e.to_string())),
		};
		if data.is_empty() {
			return Ok(None);
		}

		let mut reader = csv::ReaderBuilder::new()
			.delimiter(self.delimiter)
			.has_headers(true)
			.from_reader(data.as_slice());
		let header = reader
			.headers()
			.map_err(|e| SinkError::Io(format!("Cannot read header of {}: {}", path.display(), e)))?;
		Ok(Some(header.iter().map(str::to_string).collect()))
	}

	fn encode(
		&self,
		header: Option<&[&'static str]>,
		records: &[Record],
	) -> Result<Vec<u8>, SinkError> {
		let mut writer = csv::WriterBuilder::new()
			.delimiter(self.delimiter)
			.from_writer(Vec::new());

		if let Some(header) = header {
			writer
				.write_record(header)
				.map_err(|e| SinkError::Io(e.to_string()))?;
		}
		for record in records {
			writer
				.write_record(record.values())
				.map_err(|e| SinkError::Io(e.to_string()))?;
		}

		writer
			.into_inner()
			.map_err(|e| SinkError::Io(e.to_string()))
	}
}

#[async_trait]
impl SinkInterface for CsvSink {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(CsvSinkSchema)
	}

	async fn write(&self, dataset: Dataset, records: &[Record]) -> Result<usize, SinkError> {
		if records.is_empty() {
			return Ok(0);
		}
		let header = batch_header(dataset, records)?;

		fs::create_dir_all(&self.output_path)
			.await
			.map_err(|e| SinkError::Io(e.to_string()))?;
		let path = self.dataset_path(dataset);

		if !self.append {
			let bytes = self.encode(Some(header.as_slice()), records)?;
			fs::write(&path, bytes)
				.await
				.map_err(|e| SinkError::Io(e.to_string()))?;
			return Ok(records.len());
		}

		let write_header = match self.existing_header(&path).await? {
			None => true,
			Some(existing) if existing.iter().map(String::as_str).eq(header.iter().copied()) => {
				false
			},
			Some(existing) => {
				return Err(SinkError::Schema(format!(
					"{} has header [{}], records have [{}]",
					path.display(),
					existing.join(", "),
					header.join(", ")
				)));
			},
		};

		let bytes = self.encode(write_header.then_some(header.as_slice()), records)?;
		let mut file = fs::OpenOptions::new()
			.create(true)
			.append(true)
			.open(&path)
			.await
			.map_err(|e| SinkError::Io(e.to_string()))?;
		file.write_all(&bytes)
			.await
			.map_err(|e| SinkError::Io(e.to_string()))?;
		file.flush()
			.await
			.map_err(|e| SinkError::Io(e.to_string()))?;

		Ok(records.len())
	}
}

/// Configuration schema for CsvSink.
pub struct CsvSinkSchema;

impl ConfigSchema for CsvSinkSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("output_path", FieldType::String).with_validator(|v| {
					match v.as_str() {
						Some(path) if !path.trim().is_empty() => Ok(()),
						_ => Err("output_path cannot be empty".to_string()),
					}
				}),
				Field::new("delimiter", FieldType::String).with_validator(|v| {
					match v.as_str().map(str::as_bytes) {
						Some([byte]) if byte.is_ascii() && *byte != b'"' && *byte != b'\n' => Ok(()),
						_ => Err("delimiter must be a single ASCII character".to_string()),
					}
				}),
				Field::new("append", FieldType::Boolean),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create a CSV sink from configuration.
///
/// Configuration parameters:
/// - `output_path`: Directory for the dataset files (default: "./data/raw")
/// - `delimiter`: Field delimiter (default: ",")
/// - `append`: Append to existing files instead of replacing them (default: false)
pub fn create_sink(config: &toml::Value) -> Result<Box<dyn SinkInterface>, SinkError> {
	CsvSinkSchema
		.validate(config)
		.map_err(|e| SinkError::Configuration(e.to_string()))?;

	let output_path = config
		.get("output_path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_OUTPUT_PATH);
	let delimiter = config
		.get("delimiter")
		.and_then(|v| v.as_str())
		.and_then(|s| s.bytes().next())
		.unwrap_or(b',');
	let append = config
		.get("append")
		.and_then(|v| v.as_bool())
		.unwrap_or(false);

	Ok(Box::new(CsvSink::new(
		PathBuf::from(output_path),
		delimiter,
		append,
	)))
}

/// Registry for the CSV sink implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "csv";
	type Factory = SinkFactory;

	fn factory() -> Self::Factory {
		create_sink
	}
}

impl SinkRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn update(id: u64, status: &str, ts: &str) -> Record {
		Record::new()
			.with("order_id", id)
			.with("status", status)
			.with("status_timestamp", ts)
	}

	fn read(dir: &TempDir, name: &str) -> String {
		std::fs::read_to_string(dir.path().join(name)).unwrap()
	}

	#[tokio::test]
	async fn test_writes_header_and_rows() {
		let dir = TempDir::new().unwrap();
		let sink = CsvSink::new(dir.path().join("raw"), b',', false);

		let written = sink
			.write(
				Dataset::Updates,
				&[
					update(1001, "Processing", "2026-05-01 10:00:00"),
					update(1002, "Cancelled", "2026-05-01 11:30:00"),
				],
			)
			.await
			.unwrap();

		assert_eq!(written, 2);
		assert_eq!(
			read(&dir, "raw/logistics_updates.csv"),
			"order_id,status,status_timestamp\n\
			 1001,Processing,2026-05-01 10:00:00\n\
			 1002,Cancelled,2026-05-01 11:30:00\n"
		);
	}

	#[tokio::test]
	async fn test_overwrite_replaces_previous_run() {
		let dir = TempDir::new().unwrap();
		let sink = CsvSink::new(dir.path().to_path_buf(), b',', false);

		sink.write(Dataset::Updates, &[update(1, "Processing", "2026-05-01 10:00:00")])
			.await
			.unwrap();
		sink.write(Dataset::Updates, &[update(2, "Shipped", "2026-05-02 10:00:00")])
			.await
			.unwrap();

		let content = read(&dir, "logistics_updates.csv");
		assert_eq!(content.lines().count(), 2);
		assert!(content.contains("2,Shipped"));
		assert!(!content.contains("1,Processing"));
	}

	#[tokio::test]
	async fn test_append_writes_header_once() {
		let dir = TempDir::new().unwrap();
		let sink = CsvSink::new(dir.path().to_path_buf(), b';', true);

		sink.write(Dataset::Updates, &[update(1, "Processing", "2026-05-01 10:00:00")])
			.await
			.unwrap();
		sink.write(Dataset::Updates, &[update(1, "Shipped", "2026-05-02 10:00:00")])
			.await
			.unwrap();

		let content = read(&dir, "logistics_updates.csv");
		let lines: Vec<_> = content.lines().collect();
		assert_eq!(
			lines,
			vec![
				"order_id;status;status_timestamp",
				"1;Processing;2026-05-01 10:00:00",
				"1;Shipped;2026-05-02 10:00:00",
			]
		);
	}

	#[tokio::test]
	async fn test_append_rejects_foreign_header() {
		let dir = TempDir::new().unwrap();
		std::fs::write(dir.path().join("orders.csv"), "id,name\n1,x\n").unwrap();
		let sink = CsvSink::new(dir.path().to_path_buf(), b',', true);

		let record = Record::new().with("order_id", 5).with("product", "Mouse");
		let result = sink.write(Dataset::Orders, &[record]).await;
		assert!(matches!(result, Err(SinkError::Schema(_))));
	}

	#[tokio::test]
	async fn test_values_are_quoted_when_needed() {
		let dir = TempDir::new().unwrap();
		let sink = CsvSink::new(dir.path().to_path_buf(), b',', false);

		let record = Record::new()
			.with("order_id", 9)
			.with("customer_name", "Smith, Jr.");
		sink.write(Dataset::Orders, &[record]).await.unwrap();

		assert_eq!(
			read(&dir, "orders.csv"),
			"order_id,customer_name\n9,\"Smith, Jr.\"\n"
		);
	}

	#[test]
	fn test_schema_rejects_long_delimiter() {
		let config: toml::Value = toml::from_str("delimiter = \"::\"").unwrap();
		assert!(matches!(
			create_sink(&config),
			Err(SinkError::Configuration(_))
		));

		let config: toml::Value =
			toml::from_str("output_path = \"./out\"\ndelimiter = \"|\"\nappend = true").unwrap();
		assert!(create_sink(&config).is_ok());
	}
}
