//! Synthetic order generation.
//!
//! Orders get consecutive ids starting at a base id, a product drawn from the
//! catalog, a quantity between 1 and [`MAX_QUANTITY`], a price around the
//! product average and a sale timestamp in the past according to the
//! configured [`SaleWindow`].

use crate::catalog::Catalog;
use chrono::{Duration, NaiveDateTime};
use fake::faker::address::en::CityName;
use fake::faker::name::en::Name;
use fake::Fake;
use logistics_types::{round_to_cents, Order, SaleWindow, Status, MAX_QUANTITY};
use rand::Rng;
use std::sync::Arc;

/// Inclusive range of the flat shipping fee.
pub const SHIPPING_FEE_RANGE: (f64, f64) = (15.0, 150.0);

/// Picks the id of the first order when nothing is tracked yet.
pub fn random_base_id<R: Rng + ?Sized>(rng: &mut R, min: u64, max: u64) -> u64 {
	rng.gen_range(min..=max)
}

/// Generates new orders from a catalog.
pub struct OrderGenerator {
	catalog: Arc<Catalog>,
	sale_window: SaleWindow,
}

impl OrderGenerator {
	pub fn new(catalog: Arc<Catalog>, sale_window: SaleWindow) -> Self {
		Self {
			catalog,
			sale_window,
		}
	}

	/// Produces `count` orders with ids `first_id..first_id + count`.
	///
	/// The caller guarantees that the id range does not overflow.
	pub fn generate<R: Rng + ?Sized>(
		&self,
		rng: &mut R,
		count: usize,
		first_id: u64,
		now: NaiveDateTime,
	) -> Vec<Order> {
		(0..count as u64)
			.map(|offset| self.generate_one(rng, first_id + offset, now))
			.collect()
	}

	fn generate_one<R: Rng + ?Sized>(
		&self,
		rng: &mut R,
		order_id: u64,
		now: NaiveDateTime,
	) -> Order {
		let product = self.catalog.choose(rng);
		let quantity = rng.gen_range(1..=MAX_QUANTITY);

		let (min_price, max_price) = product.price_bounds();
		let unit_price =
			round_to_cents(rng.gen_range(min_price..=max_price)).clamp(min_price, max_price);
		let weight_kg = round_to_cents(product.weight_unit * quantity as f64);
		let shipping_cost =
			round_to_cents(rng.gen_range(SHIPPING_FEE_RANGE.0..=SHIPPING_FEE_RANGE.1));

		Order {
			order_id,
			customer_name: Name().fake_with_rng(rng),
			product: product.name.clone(),
			quantity,
			unit_price,
			origin: CityName().fake_with_rng(rng),
			destination: CityName().fake_with_rng(rng),
			weight_kg,
			shipping_cost,
			status: Status::Pending,
			sale_timestamp: sample_sale_timestamp(rng, self.sale_window, now),
		}
	}
}

/// Samples a sale timestamp strictly before `now`.
pub fn sample_sale_timestamp<R: Rng + ?Sized>(
	rng: &mut R,
	window: SaleWindow,
	now: NaiveDateTime,
) -> NaiveDateTime {
	match window {
		SaleWindow::LastThirtyDays => {
			const DAY: i64 = 24 * 60 * 60;
			let seconds_ago = rng.gen_range(DAY..=30 * DAY);
			now - Duration::seconds(seconds_ago)
		},
		SaleWindow::RecentDays => {
			let ago = Duration::days(rng.gen_range(1..=5))
				+ Duration::minutes(rng.gen_range(1..=60))
				+ Duration::seconds(rng.gen_range(0..=59))
				+ Duration::microseconds(rng.gen_range(0..1_000_000));
			now - ago
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::NaiveDate;
	use logistics_config::default_products;
	use rand::rngs::StdRng;
	use rand::SeedableRng;
	use std::collections::BTreeSet;

	fn now() -> NaiveDateTime {
		NaiveDate::from_ymd_opt(2026, 7, 1)
			.unwrap()
			.and_hms_opt(12, 0, 0)
			.unwrap()
	}

	fn generator(window: SaleWindow) -> OrderGenerator {
		let catalog = Catalog::new(default_products()).unwrap();
		OrderGenerator::new(Arc::new(catalog), window)
	}

	#[test]
	fn test_fifty_orders_from_default_catalog() {
		let generator = generator(SaleWindow::LastThirtyDays);
		let mut rng = StdRng::seed_from_u64(11);

		let orders = generator.generate(&mut rng, 50, 4000, now());

		assert_eq!(orders.len(), 50);
		let ids: BTreeSet<u64> = orders.iter().map(|o| o.order_id).collect();
		assert_eq!(ids.len(), 50);
		assert_eq!(ids.first(), Some(&4000));
		assert_eq!(ids.last(), Some(&4049));
		assert!(orders.iter().all(|o| o.status == Status::Pending));
	}

	#[test]
	fn test_order_fields_follow_catalog() {
		let catalog = Arc::new(Catalog::new(default_products()).unwrap());
		let generator = OrderGenerator::new(catalog.clone(), SaleWindow::LastThirtyDays);
		let mut rng = StdRng::seed_from_u64(5);

		for order in generator.generate(&mut rng, 200, 1, now()) {
			let product = catalog.find(&order.product).unwrap();
			let (min_price, max_price) = product.price_bounds();

			assert!((1..=MAX_QUANTITY).contains(&order.quantity));
			assert_eq!(
				order.weight_kg,
				round_to_cents(product.weight_unit * order.quantity as f64)
			);
			assert!(order.unit_price >= min_price && order.unit_price <= max_price);
			assert!(order.shipping_cost >= 15.0 && order.shipping_cost <= 150.0);
			assert_eq!(order.shipping_cost, round_to_cents(order.shipping_cost));
			assert!(!order.customer_name.is_empty());
			assert!(!order.origin.is_empty());
			assert!(!order.destination.is_empty());
		}
	}

	#[test]
	fn test_last_thirty_days_window() {
		let mut rng = StdRng::seed_from_u64(1);
		for _ in 0..500 {
			let ts = sample_sale_timestamp(&mut rng, SaleWindow::LastThirtyDays, now());
			assert!(ts <= now() - Duration::days(1));
			assert!(ts >= now() - Duration::days(30));
		}
	}

	#[test]
	fn test_recent_days_window() {
		let mut rng = StdRng::seed_from_u64(2);
		for _ in 0..500 {
			let ts = sample_sale_timestamp(&mut rng, SaleWindow::RecentDays, now());
			let ago = now() - ts;
			assert!(ago > Duration::days(1));
			assert!(ago < Duration::days(5) + Duration::minutes(62));
		}
	}

	#[test]
	fn test_same_seed_same_orders() {
		let generator = generator(SaleWindow::RecentDays);

		let first = generator.generate(&mut StdRng::seed_from_u64(9), 10, 100, now());
		let second = generator.generate(&mut StdRng::seed_from_u64(9), 10, 100, now());
		assert_eq!(first, second);
	}

	#[test]
	fn test_random_base_id_in_range() {
		let mut rng = StdRng::seed_from_u64(0);
		for _ in 0..100 {
			let id = random_base_id(&mut rng, 1000, 9000);
			assert!((1000..=9000).contains(&id));
		}
	}
}
