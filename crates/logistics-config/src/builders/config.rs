//! Configuration builder for tests.
//!
//! Produces configurations backed by the in-memory store and sink, with a
//! fixed seed so that generated data is reproducible.

use crate::{CatalogConfig, Config, GeneratorConfig, SinkConfig, StorageConfig};
use logistics_types::{DelayPolicy, GenerationMode, ProductEntry, SaleWindow};
use std::collections::HashMap;

/// Fluent builder for `Config` instances.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	generator: GeneratorConfig,
	products: Option<Vec<ProductEntry>>,
	storage_primary: String,
	storage_config: toml::Value,
	sink_primary: String,
	sink_config: toml::Value,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	/// Memory store, memory sink, seed 42.
	pub fn new() -> Self {
		Self {
			generator: GeneratorConfig {
				seed: Some(42),
				..GeneratorConfig::default()
			},
			products: None,
			storage_primary: "memory".to_string(),
			storage_config: toml::Value::Table(toml::map::Map::new()),
			sink_primary: "memory".to_string(),
			sink_config: toml::Value::Table(toml::map::Map::new()),
		}
	}

	pub fn order_count(mut self, count: usize) -> Self {
		self.generator.order_count = count;
		self
	}

	pub fn update_count(mut self, count: usize) -> Self {
		self.generator.update_count = count;
		self
	}

	pub fn mode(mut self, mode: GenerationMode) -> Self {
		self.generator.mode = mode;
		self
	}

	pub fn update_probability(mut self, probability: f64) -> Self {
		self.generator.update_probability = probability;
		self
	}

	pub fn seed(mut self, seed: Option<u64>) -> Self {
		self.generator.seed = seed;
		self
	}

	pub fn sale_window(mut self, window: SaleWindow) -> Self {
		self.generator.sale_window = window;
		self
	}

	pub fn delay(mut self, delay: DelayPolicy) -> Self {
		self.generator.delay = delay;
		self
	}

	pub fn products(mut self, products: Vec<ProductEntry>) -> Self {
		self.products = Some(products);
		self
	}

	/// Selects the primary storage backend and its table.
	pub fn storage(mut self, primary: impl Into<String>, config: toml::Value) -> Self {
		self.storage_primary = primary.into();
		self.storage_config = config;
		self
	}

	/// Selects the primary sink backend and its table.
	pub fn sink(mut self, primary: impl Into<String>, config: toml::Value) -> Self {
		self.sink_primary = primary.into();
		self.sink_config = config;
		self
	}

	pub fn build(self) -> Config {
		Config {
			generator: self.generator,
			catalog: match self.products {
				Some(products) => CatalogConfig { products },
				None => CatalogConfig::default(),
			},
			storage: StorageConfig {
				implementations: HashMap::from([(
					self.storage_primary.clone(),
					self.storage_config,
				)]),
				primary: self.storage_primary,
			},
			sink: SinkConfig {
				implementations: HashMap::from([(self.sink_primary.clone(), self.sink_config)]),
				primary: self.sink_primary,
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_builder_defaults_validate() {
		let config = ConfigBuilder::new().build();
		assert!(config.validate().is_ok());
		assert_eq!(config.generator.seed, Some(42));
		assert_eq!(config.storage.primary, "memory");
		assert_eq!(config.sink.primary, "memory");
	}

	#[test]
	fn test_builder_overrides() {
		let config = ConfigBuilder::new()
			.order_count(3)
			.update_count(0)
			.mode(GenerationMode::Probabilistic)
			.update_probability(1.0)
			.products(vec![ProductEntry::new("Crate", 1.0, 10.0)])
			.build();

		assert_eq!(config.generator.order_count, 3);
		assert_eq!(config.generator.update_count, 0);
		assert_eq!(config.generator.mode, GenerationMode::Probabilistic);
		assert_eq!(config.catalog.products.len(), 1);
		assert!(config.validate().is_ok());
	}
}
