//! Configuration module for the logistics data generator.
//!
//! Configuration is read from a TOML file. Every section has defaults, so an
//! empty file (or no file at all) yields a working setup that writes CSV files
//! under `./data/raw` and keeps tracking state in `./data/state/tracking.json`.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["storage.toml", "sink.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)
//!
//! String values may reference environment variables as `${VAR}` or
//! `${VAR:-default}`.

#[cfg(any(test, feature = "testing"))]
pub mod builders;
mod loader;

use logistics_types::{
	within_cargo_limit, DelayPolicy, GenerationMode, ProductEntry, SaleWindow, MAX_QUANTITY,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Largest batch of new orders a single run may create.
pub const MAX_ORDER_COUNT: usize = 1_000_000;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Configuration error: {0}")]
	Parse(String),
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message only; the default rendering echoes the whole input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the generator.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
	/// Order and update generation settings.
	#[serde(default)]
	pub generator: GeneratorConfig,
	/// Products orders are drawn from.
	#[serde(default)]
	pub catalog: CatalogConfig,
	/// Tracking state store.
	#[serde(default)]
	pub storage: StorageConfig,
	/// Output record sink.
	#[serde(default)]
	pub sink: SinkConfig,
}

/// Settings of a single generation cycle.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorConfig {
	/// Number of new orders created per run.
	#[serde(default = "default_order_count")]
	pub order_count: usize,
	/// Number of update attempts in exhaustive mode.
	#[serde(default = "default_update_count")]
	pub update_count: usize,
	/// Update selection policy.
	#[serde(default)]
	pub mode: GenerationMode,
	/// Per-order advance probability in probabilistic mode.
	#[serde(default = "default_update_probability")]
	pub update_probability: f64,
	/// Seed for the random source. Runs are not reproducible without it.
	#[serde(default)]
	pub seed: Option<u64>,
	/// Sale timestamp sampling policy.
	#[serde(default)]
	pub sale_window: SaleWindow,
	/// Delay sampling policy between consecutive events.
	#[serde(default)]
	pub delay: DelayPolicy,
	/// Lower bound of the random base id used when no orders are tracked yet.
	#[serde(default = "default_start_id_min")]
	pub start_id_min: u64,
	/// Upper bound of the random base id.
	#[serde(default = "default_start_id_max")]
	pub start_id_max: u64,
}

fn default_order_count() -> usize {
	50
}

fn default_update_count() -> usize {
	150
}

fn default_update_probability() -> f64 {
	0.5
}

fn default_start_id_min() -> u64 {
	1000
}

fn default_start_id_max() -> u64 {
	9000
}

impl Default for GeneratorConfig {
	fn default() -> Self {
		Self {
			order_count: default_order_count(),
			update_count: default_update_count(),
			mode: GenerationMode::default(),
			update_probability: default_update_probability(),
			seed: None,
			sale_window: SaleWindow::default(),
			delay: DelayPolicy::default(),
			start_id_min: default_start_id_min(),
			start_id_max: default_start_id_max(),
		}
	}
}

/// Product catalog override.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
	#[serde(default = "default_products")]
	pub products: Vec<ProductEntry>,
}

impl Default for CatalogConfig {
	fn default() -> Self {
		Self {
			products: default_products(),
		}
	}
}

/// Built-in product catalog.
pub fn default_products() -> Vec<ProductEntry> {
	vec![
		ProductEntry::new("Dell G15 Laptop", 2.5, 4000.0),
		ProductEntry::new("Logitech MX Mouse", 0.2, 350.0),
		ProductEntry::new("LG Ultrawide Monitor", 4.5, 1800.0),
		ProductEntry::new("Keychron Keyboard", 0.8, 700.0),
	]
}

/// Configuration for the tracking state store.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	#[serde(default)]
	pub implementations: HashMap<String, toml::Value>,
}

impl Default for StorageConfig {
	fn default() -> Self {
		let mut file = toml::map::Map::new();
		file.insert(
			"storage_path".to_string(),
			toml::Value::String("./data/state/tracking.json".to_string()),
		);
		Self {
			primary: "file".to_string(),
			implementations: HashMap::from([("file".to_string(), toml::Value::Table(file))]),
		}
	}
}

/// Configuration for the output record sink.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SinkConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of sink implementation names to their configurations.
	#[serde(default)]
	pub implementations: HashMap<String, toml::Value>,
}

impl Default for SinkConfig {
	fn default() -> Self {
		let mut csv = toml::map::Map::new();
		csv.insert(
			"output_path".to_string(),
			toml::Value::String("./data/raw".to_string()),
		);
		Self {
			primary: "csv".to_string(),
			implementations: HashMap::from([("csv".to_string(), toml::Value::Table(csv))]),
		}
	}
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}
	result.push_str(&input[last_end..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let base_dir = path
			.parent()
			.filter(|p| !p.as_os_str().is_empty())
			.unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path.file_name().ok_or_else(|| {
			ConfigError::Validation(format!("Invalid path: {}", path.display()))
		})?;
		loader.load_config(file_name).await
	}

	/// Validates cross-field constraints that serde cannot express.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let generator = &self.generator;
		if generator.order_count == 0 {
			return Err(ConfigError::Validation(
				"generator.order_count must be at least 1".into(),
			));
		}
		if generator.order_count > MAX_ORDER_COUNT {
			return Err(ConfigError::Validation(format!(
				"generator.order_count cannot exceed {}",
				MAX_ORDER_COUNT
			)));
		}
		if !(0.0..=1.0).contains(&generator.update_probability) {
			return Err(ConfigError::Validation(format!(
				"generator.update_probability must be within [0, 1], got {}",
				generator.update_probability
			)));
		}
		if generator.start_id_min == 0 {
			return Err(ConfigError::Validation(
				"generator.start_id_min must be at least 1".into(),
			));
		}
		if generator.start_id_min > generator.start_id_max {
			return Err(ConfigError::Validation(format!(
				"generator.start_id_min ({}) cannot exceed generator.start_id_max ({})",
				generator.start_id_min, generator.start_id_max
			)));
		}

		self.validate_catalog()?;

		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}

		if self.sink.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Sink primary implementation cannot be empty".into(),
			));
		}
		if !self.sink.implementations.contains_key(&self.sink.primary) {
			return Err(ConfigError::Validation(format!(
				"Primary sink '{}' not found in implementations",
				self.sink.primary
			)));
		}

		Ok(())
	}

	fn validate_catalog(&self) -> Result<(), ConfigError> {
		if self.catalog.products.is_empty() {
			return Err(ConfigError::Validation(
				"Catalog must contain at least one product".into(),
			));
		}

		for product in &self.catalog.products {
			if product.name.trim().is_empty() {
				return Err(ConfigError::Validation(
					"Catalog product name cannot be empty".into(),
				));
			}
			if product.weight_unit <= 0.0 || !product.weight_unit.is_finite() {
				return Err(ConfigError::Validation(format!(
					"Product '{}' must have a positive weight_unit",
					product.name
				)));
			}
			if product.price_avg <= 0.0 || !product.price_avg.is_finite() {
				return Err(ConfigError::Validation(format!(
					"Product '{}' must have a positive price_avg",
					product.name
				)));
			}
			let heaviest = product.weight_unit * MAX_QUANTITY as f64;
			if !within_cargo_limit(heaviest) {
				return Err(ConfigError::Validation(format!(
					"Product '{}' exceeds the cargo limit at quantity {} ({} kg)",
					product.name, MAX_QUANTITY, heaviest
				)));
			}
		}

		Ok(())
	}
}

/// Parses a TOML string, resolving environment variables and validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
