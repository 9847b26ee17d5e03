//! Flat records handed to output sinks.
//!
//! A record is an ordered list of field-name/value pairs. Sinks derive the
//! header of a dataset from the field names of its first record, so the order
//! in which fields are added is the column order of the output.

use crate::{format_timestamp, Order, StatusUpdate};
use std::fmt;

/// Output datasets produced by a generation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dataset {
	/// One row per generated order.
	Orders,
	/// One row per status update event.
	Updates,
}

impl Dataset {
	/// Returns the dataset name, also used as the output file stem.
	pub fn as_str(&self) -> &'static str {
		match self {
			Dataset::Orders => "orders",
			Dataset::Updates => "logistics_updates",
		}
	}

	/// Returns an iterator over all datasets.
	pub fn all() -> impl Iterator<Item = Self> {
		[Self::Orders, Self::Updates].into_iter()
	}
}

impl fmt::Display for Dataset {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// An ordered field-name to value mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
	fields: Vec<(&'static str, String)>,
}

impl Record {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a field, keeping insertion order.
	pub fn with(mut self, name: &'static str, value: impl ToString) -> Self {
		self.fields.push((name, value.to_string()));
		self
	}

	/// Field names in declared order.
	pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.fields.iter().map(|(name, _)| *name)
	}

	/// Field values in declared order.
	pub fn values(&self) -> impl Iterator<Item = &str> {
		self.fields.iter().map(|(_, value)| value.as_str())
	}

	/// Looks up a value by field name.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.fields
			.iter()
			.find(|(field, _)| *field == name)
			.map(|(_, value)| value.as_str())
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}
}

/// Conversion of a domain value into a flat output record.
pub trait ToRecord {
	fn to_record(&self) -> Record;
}

impl ToRecord for Order {
	fn to_record(&self) -> Record {
		Record::new()
			.with("order_id", self.order_id)
			.with("customer_name", &self.customer_name)
			.with("product", &self.product)
			.with("quantity", self.quantity)
			.with("unit_price", format!("{:.2}", self.unit_price))
			.with("origin", &self.origin)
			.with("destination", &self.destination)
			.with("weight_kg", format!("{:.2}", self.weight_kg))
			.with("shipping_cost", format!("{:.2}", self.shipping_cost))
			.with("status", self.status)
			.with("sale_timestamp", format_timestamp(&self.sale_timestamp))
	}
}

impl ToRecord for StatusUpdate {
	fn to_record(&self) -> Record {
		Record::new()
			.with("order_id", self.order_id)
			.with("status", self.status)
			.with("status_timestamp", format_timestamp(&self.timestamp))
	}
}
