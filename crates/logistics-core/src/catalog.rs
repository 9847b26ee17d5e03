//! Product catalog orders are drawn from.

use logistics_types::ProductEntry;
use rand::Rng;

/// Immutable, non-empty list of orderable products.
#[derive(Debug, Clone)]
pub struct Catalog {
	products: Vec<ProductEntry>,
}

impl Catalog {
	/// Returns `None` for an empty product list.
	pub fn new(products: Vec<ProductEntry>) -> Option<Self> {
		if products.is_empty() {
			return None;
		}
		Some(Self { products })
	}

	/// Picks a product uniformly at random.
	pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &ProductEntry {
		// Non-empty by construction
		&self.products[rng.gen_range(0..self.products.len())]
	}

	pub fn find(&self, name: &str) -> Option<&ProductEntry> {
		self.products.iter().find(|p| p.name == name)
	}

	pub fn products(&self) -> &[ProductEntry] {
		&self.products
	}

	pub fn len(&self) -> usize {
		self.products.len()
	}

	pub fn is_empty(&self) -> bool {
		self.products.is_empty()
	}
}
