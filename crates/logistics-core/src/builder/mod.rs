//! Builder pattern for constructing generator engines.
//!
//! Storage and sink backends are created from their configuration tables
//! through factory functions keyed by implementation name, so the binary
//! decides which implementations are available.

use crate::engine::GeneratorEngine;
use logistics_config::Config;
use logistics_sink::{SinkError, SinkInterface, SinkService};
use logistics_storage::{StorageError, StorageInterface, StorageService};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions needed to build a GeneratorEngine.
pub struct EngineFactories<SF, KF> {
	pub storage_factories: HashMap<String, SF>,
	pub sink_factories: HashMap<String, KF>,
}

/// Builder for constructing a GeneratorEngine with pluggable backends.
pub struct EngineBuilder {
	config: Config,
}

impl EngineBuilder {
	/// Creates a new EngineBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the engine from the primary storage and sink implementations.
	pub fn build<SF, KF>(
		self,
		factories: EngineFactories<SF, KF>,
	) -> Result<GeneratorEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		KF: Fn(&toml::Value) -> Result<Box<dyn SinkInterface>, SinkError>,
	{
		let storage_backend = create_primary(
			"storage",
			&self.config.storage.primary,
			&self.config.storage.implementations,
			&factories.storage_factories,
		)?;
		let storage = Arc::new(StorageService::new(storage_backend));

		let sink_backend = create_primary(
			"sink",
			&self.config.sink.primary,
			&self.config.sink.implementations,
			&factories.sink_factories,
		)?;
		let sink = Arc::new(SinkService::new(sink_backend));

		GeneratorEngine::new(self.config, storage, sink)
			.map_err(|e| BuilderError::Config(e.to_string()))
	}
}

/// Creates every configured implementation that has a factory and returns the
/// primary one.
///
/// Secondary implementations are still constructed so that their settings are
/// validated up front.
fn create_primary<T: ?Sized, E: std::fmt::Display, F>(
	component: &'static str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
	factories: &HashMap<String, F>,
) -> Result<Box<T>, BuilderError>
where
	F: Fn(&toml::Value) -> Result<Box<T>, E>,
{
	let mut loaded = HashMap::new();
	for (name, config) in implementations {
		let Some(factory) = factories.get(name) else {
			continue;
		};
		match factory(config) {
			Ok(implementation) => {
				let is_primary = primary == name;
				tracing::info!(component, implementation = %name, enabled = %is_primary, "Loaded");
				loaded.insert(name.clone(), implementation);
			},
			Err(e) => {
				tracing::error!(
					component,
					implementation = %name,
					error = %e,
					"Failed to create implementation"
				);
				return Err(BuilderError::Config(format!(
					"Failed to create {} implementation '{}': {}",
					component, name, e
				)));
			},
		}
	}

	if loaded.is_empty() {
		return Err(BuilderError::MissingComponent(format!(
			"No valid {} implementations available",
			component
		)));
	}

	loaded.remove(primary).ok_or_else(|| {
		BuilderError::Config(format!(
			"Primary {} '{}' failed to load or has invalid configuration",
			component, primary
		))
	})
}
