//! Core generator engine for the logistics data generator.
//!
//! This module ties the order generator and the status progression engine to
//! the tracking store and the output sink. A [`GeneratorEngine`] is assembled
//! by the [`EngineBuilder`] from configuration and runs one generation cycle
//! per invocation.

pub mod builder;
pub mod catalog;
pub mod engine;
pub mod generator;
pub mod progression;
pub mod state;

pub use builder::{BuilderError, EngineBuilder, EngineFactories};
pub use catalog::Catalog;
pub use engine::{EngineError, GeneratorEngine, RunSummary};
pub use generator::OrderGenerator;
pub use progression::{ProgressionEngine, ProgressionOutcome};
pub use state::TrackingBook;
