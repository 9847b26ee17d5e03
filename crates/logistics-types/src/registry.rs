//! Registry trait for self-registering backends.

/// Implemented by every storage and sink backend module.
///
/// A backend declares the name it is referenced by in configuration (the key
/// under `storage.implementations` or `sink.implementations`) together with
/// the factory that builds it from its TOML table.
pub trait ImplementationRegistry {
	/// Configuration key of the backend, e.g. "file" or "csv".
	const NAME: &'static str;

	/// Factory signature shared by all backends of one kind.
	type Factory;

	/// Returns the backend's factory.
	fn factory() -> Self::Factory;
}
