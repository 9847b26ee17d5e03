//! Generation policies.
//!
//! Two generator variants exist side by side: a stateless one that samples
//! sale dates over the last month and walks orders exhaustively, and a
//! persisted one that samples recent sale dates and advances older orders
//! probabilistically. Each aspect is selectable on its own.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the progression engine picks orders to advance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
	/// Attempt a fixed number of updates over all eligible orders.
	#[default]
	Exhaustive,
	/// Advance each order of the prior cohort with a fixed probability.
	Probabilistic,
}

/// How sale timestamps of new orders are sampled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleWindow {
	/// Uniformly between 30 days ago and yesterday.
	#[default]
	#[serde(rename = "last_30_days")]
	LastThirtyDays,
	/// 1-5 days, 1-60 minutes and up to a minute of seconds ago, with jitter.
	#[serde(rename = "recent_days")]
	RecentDays,
}

/// How the delay between two events of an order is sampled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayPolicy {
	/// Whole hours in [4, 72].
	#[default]
	Hours,
	/// [1, 24] hours plus [1, 59] minutes plus [1, 59] seconds.
	Composite,
}

impl fmt::Display for GenerationMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			GenerationMode::Exhaustive => f.write_str("exhaustive"),
			GenerationMode::Probabilistic => f.write_str("probabilistic"),
		}
	}
}
