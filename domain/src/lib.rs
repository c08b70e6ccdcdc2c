//! Domain library for the product catalog.
//!
//! Holds the `Product` entity, the `ProductRepository` port every storage
//! backend implements, and the error type shared across adapters. Keep
//! adapters and IO concerns out of this crate; the only backend living here
//! is the in-memory one under `adapters`.

use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum difference at which two prices or stock quantities are treated as
/// equal. Storage backends may keep fewer decimal places than an `f64`.
pub const NUMERIC_TOLERANCE: f64 = 0.3;

/// Largest price or stock quantity a product may carry. Keeps amounts well
/// inside what storage backends can represent at three decimal places.
pub const MAX_AMOUNT: f64 = 1.0e12;

/// Compare two numeric product fields within [`NUMERIC_TOLERANCE`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= NUMERIC_TOLERANCE
}

/// Unique identifier of a product.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A catalog entry.
///
/// Identity is the `id` alone: two products with the same id compare equal
/// (and hash the same) whatever their other fields hold. Use
/// [`Product::matches`] to compare contents.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    description: String,
    category: String,
    price: f64,
    quantity_in_stock: f64,
}

impl Product {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        price: f64,
        quantity_in_stock: f64,
    ) -> Self {
        Self {
            id: ProductId(id),
            name: name.into(),
            description: description.into(),
            category: category.into(),
            price,
            quantity_in_stock,
        }
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn quantity_in_stock(&self) -> f64 {
        self.quantity_in_stock
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
    }

    pub fn set_price(&mut self, price: f64) {
        self.price = price;
    }

    pub fn set_quantity_in_stock(&mut self, quantity: f64) {
        self.quantity_in_stock = quantity;
    }

    /// Field-by-field comparison: strings exactly, price and quantity within
    /// [`NUMERIC_TOLERANCE`].
    pub fn matches(&self, other: &Product) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.description == other.description
            && self.category == other.category
            && approx_eq(self.price, other.price)
            && approx_eq(self.quantity_in_stock, other.quantity_in_stock)
    }
}

impl PartialEq for Product {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Product {}

impl Hash for Product {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Input data for creating a new product through the service.
#[derive(Clone, Debug, PartialEq)]
pub struct NewProduct {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub quantity_in_stock: f64,
}

impl From<NewProduct> for Product {
    fn from(input: NewProduct) -> Self {
        Product::new(
            input.id.get(),
            input.name,
            input.description,
            input.category,
            input.price,
            input.quantity_in_stock,
        )
    }
}

/// Field changes for an existing product; `None` leaves a field as stored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub quantity_in_stock: Option<f64>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply every requested change to `product`.
    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.set_name(name);
        }
        if let Some(description) = self.description {
            product.set_description(description);
        }
        if let Some(price) = self.price {
            product.set_price(price);
        }
        if let Some(quantity) = self.quantity_in_stock {
            product.set_quantity_in_stock(quantity);
        }
    }
}

/// Repository port for storing and querying products.
///
/// Every backend must behave identically as observed through this trait; the
/// `contract` module holds the shared suite that checks it.
pub trait ProductRepository: Send + Sync {
    /// Insert a new product. Fails with `AlreadyExists` if the id is taken.
    fn add_product(&self, product: Product) -> Result<(), CoreError>;
    /// Look up a product by id. A missing id is `Ok(None)`, not an error.
    fn get_product(&self, id: ProductId) -> Result<Option<Product>, CoreError>;
    /// All stored products, in no particular order.
    fn list_products(&self) -> Result<Vec<Product>, CoreError>;
    /// Distinct categories across all stored products.
    fn list_categories(&self) -> Result<Vec<String>, CoreError>;
    /// Products whose category equals `category` exactly.
    fn list_by_category(&self, category: &str) -> Result<Vec<Product>, CoreError>;
    /// Overwrite the stored fields of the product with the same id.
    fn update_product(&self, product: &Product) -> Result<(), CoreError>;
    /// Remove the stored product with the same id as `product`.
    fn delete_product(&self, product: &Product) -> Result<(), CoreError>;
}

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid product: {0}")]
    InvalidProduct(String),
    #[error("product already exists")]
    AlreadyExists,
    #[error("product not found")]
    NotFound,
    #[error("repository error: {0}")]
    Repository(String),
}

/// Return a short about/version line for binaries to print.
pub fn about() -> String {
    let pkg = env!("CARGO_PKG_NAME");
    let ver = env!("CARGO_PKG_VERSION");
    format!("{} v{}", pkg, ver)
}

pub mod adapters;
#[cfg(any(test, feature = "contract"))]
pub mod contract;
pub mod service;
pub mod validate;
