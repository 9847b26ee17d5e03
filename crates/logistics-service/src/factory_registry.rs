//! Factory registry for generator backends.
//!
//! Collects the storage and sink implementations every backend crate
//! registers and resolves the ones a configuration refers to.

use logistics_config::Config;
use logistics_core::{EngineBuilder, EngineFactories, GeneratorEngine};
use logistics_sink::SinkFactory;
use logistics_storage::StorageFactory;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Registry of all known implementation factories.
pub struct FactoryRegistry {
	pub storage: HashMap<String, StorageFactory>,
	pub sink: HashMap<String, SinkFactory>,
}

impl FactoryRegistry {
	/// Create a new empty registry
	pub fn new() -> Self {
		Self {
			storage: HashMap::new(),
			sink: HashMap::new(),
		}
	}

	/// Register a storage implementation
	pub fn register_storage(&mut self, name: impl Into<String>, factory: StorageFactory) {
		self.storage.insert(name.into(), factory);
	}

	/// Register a sink implementation
	pub fn register_sink(&mut self, name: impl Into<String>, factory: SinkFactory) {
		self.sink.insert(name.into(), factory);
	}
}

impl Default for FactoryRegistry {
	fn default() -> Self {
		Self::new()
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Get the global factory registry, initializing it on first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in logistics_storage::get_all_implementations() {
			tracing::debug!("Registering storage implementation: {}", name);
			registry.register_storage(name, factory);
		}

		for (name, factory) in logistics_sink::get_all_implementations() {
			tracing::debug!("Registering sink implementation: {}", name);
			registry.register_sink(name, factory);
		}

		registry
	})
}

/// Macro to build factories from config implementations
macro_rules! build_factories {
	($registry:expr, $config_impls:expr, $registry_field:ident, $type_name:literal) => {{
		let mut factories = HashMap::new();
		for name in $config_impls.keys() {
			if let Some(factory) = $registry.$registry_field.get(name) {
				factories.insert(name.clone(), *factory);
			} else {
				let mut available: Vec<_> = $registry.$registry_field.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					$type_name,
					name,
					available.join(", ")
				)
				.into());
			}
		}
		factories
	}};
}

/// Builds the generator engine for a configuration.
pub fn build_engine_from_config(
	config: Config,
) -> Result<GeneratorEngine, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let storage_factories =
		build_factories!(registry, config.storage.implementations, storage, "storage");
	let sink_factories = build_factories!(registry, config.sink.implementations, sink, "sink");

	let factories = EngineFactories {
		storage_factories,
		sink_factories,
	};
	Ok(EngineBuilder::new(config).build(factories)?)
}
