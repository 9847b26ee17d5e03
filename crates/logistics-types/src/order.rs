//! Order records and catalog entries.

use crate::{Status, TrackingState};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Largest quantity a single order line may carry.
pub const MAX_QUANTITY: u32 = 3;

/// Heaviest shipment, in kilograms, a single order may weigh.
pub const MAX_CARGO_WEIGHT_KG: f64 = 10_000.0;

/// Checks a shipment weight against the cargo limit.
///
/// Only the upper bound is enforced; weights at or below the limit, including
/// negative correction values, are accepted.
pub fn within_cargo_limit(weight_kg: f64) -> bool {
	weight_kg <= MAX_CARGO_WEIGHT_KG
}

/// Static reference data for a product that can be ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductEntry {
	/// Display name, copied into each order.
	pub name: String,
	/// Weight of a single unit in kilograms.
	pub weight_unit: f64,
	/// Average unit price; sampled prices stay within ±20% of it.
	pub price_avg: f64,
}

impl ProductEntry {
	pub fn new(name: impl Into<String>, weight_unit: f64, price_avg: f64) -> Self {
		Self {
			name: name.into(),
			weight_unit,
			price_avg,
		}
	}

	/// Inclusive bounds a sampled unit price must fall within.
	pub fn price_bounds(&self) -> (f64, f64) {
		(self.price_avg * 0.8, self.price_avg * 1.2)
	}
}

/// A generated customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	/// Unique, monotonically assigned identifier.
	pub order_id: u64,
	pub customer_name: String,
	/// Name of the catalog entry the order was drawn from.
	pub product: String,
	/// Number of units, between 1 and 3.
	pub quantity: u32,
	pub unit_price: f64,
	pub origin: String,
	pub destination: String,
	/// Unit weight times quantity, rounded to two decimals.
	pub weight_kg: f64,
	pub shipping_cost: f64,
	/// Status at creation time; always Pending for generated orders.
	pub status: Status,
	pub sale_timestamp: NaiveDateTime,
}

impl Order {
	/// Tracking entry seeded when the order is created.
	pub fn tracking_state(&self) -> TrackingState {
		TrackingState {
			status: self.status,
			last_date: self.sale_timestamp,
		}
	}
}
