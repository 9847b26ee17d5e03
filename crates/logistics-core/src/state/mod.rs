//! Tracking state held while a generation cycle runs.
//!
//! The book mirrors the store for the duration of a cycle so that the
//! generator and progression engine can work synchronously on memory.

pub mod tracking;

pub use tracking::TrackingBook;
