//! Shared behaviour suite for `ProductRepository` implementations.
//!
//! Each case takes a fresh repository, seeds it with the two fixture
//! products, exercises one part of the contract and removes the fixtures
//! again. Backends run the whole suite through
//! [`product_repository_contract!`](crate::product_repository_contract):
//!
//! ```ignore
//! #[cfg(test)]
//! mod contract_tests {
//!     catalog_domain::product_repository_contract!((MyRepo::new(), ()));
//! }
//! ```
//!
//! The macro argument must evaluate to `(repo, guard)`; `guard` is kept alive
//! for the duration of the case (a temp dir, a container handle, or `()`).

use proptest::prelude::*;

use crate::{approx_eq, CoreError, Product, ProductId, ProductRepository, MAX_AMOUNT};

/// Id that no case ever inserts.
pub const MISSING_ID: i64 = 999;

/// The two products every case starts with. They are deleted when the
/// fixture drops, whether the case passed or panicked.
pub struct Fixture<'a, R: ProductRepository + ?Sized> {
    repo: &'a R,
    pub product1: Product,
    pub product2: Product,
}

impl<'a, R: ProductRepository + ?Sized> Fixture<'a, R> {
    pub fn set_up(repo: &'a R) -> Self {
        let product1 = Product::new(111, "product1", "description1", "category1", 111.111, 111.111);
        let product2 = Product::new(222, "product2", "description2", "category2", 222.222, 222.222);
        repo.add_product(product1.clone())
            .expect("fixture product1 should be added");
        repo.add_product(product2.clone())
            .expect("fixture product2 should be added");
        Self {
            repo,
            product1,
            product2,
        }
    }
}

impl<R: ProductRepository + ?Sized> Drop for Fixture<'_, R> {
    fn drop(&mut self) {
        for product in [&self.product1, &self.product2] {
            if let Err(e) = self.repo.delete_product(product) {
                tracing::warn!(id = %product.id(), error = %e, "fixture teardown failed");
            }
        }
    }
}

fn assert_same_fields(expected: &Product, actual: &Product) {
    assert_eq!(expected.id(), actual.id());
    assert_eq!(expected.name(), actual.name());
    assert_eq!(expected.description(), actual.description());
    assert_eq!(expected.category(), actual.category());
    assert!(
        approx_eq(expected.price(), actual.price()),
        "price {} should be within tolerance of {}",
        actual.price(),
        expected.price()
    );
    assert!(
        approx_eq(expected.quantity_in_stock(), actual.quantity_in_stock()),
        "quantity {} should be within tolerance of {}",
        actual.quantity_in_stock(),
        expected.quantity_in_stock()
    );
}

pub fn get_products_list_contains_fixtures<R: ProductRepository + ?Sized>(repo: &R) {
    let fx = Fixture::set_up(repo);

    let products = repo.list_products().expect("list products");
    assert!(products.contains(&fx.product1), "product1 should exist");
    assert!(products.contains(&fx.product2), "product2 should exist");
    assert_eq!(products.len(), 2, "only the two fixture products should be listed");

    let stored = products
        .iter()
        .find(|p| **p == fx.product1)
        .expect("product1 in list");
    assert_same_fields(&fx.product1, stored);
}

pub fn get_product_returns_stored_fields<R: ProductRepository + ?Sized>(repo: &R) {
    let fx = Fixture::set_up(repo);

    let fetched = repo
        .get_product(fx.product1.id())
        .expect("get product")
        .expect("product1 should be returned by get_product");
    assert_eq!(fx.product1, fetched);
    assert_same_fields(&fx.product1, &fetched);
}

pub fn get_missing_product_returns_none<R: ProductRepository + ?Sized>(repo: &R) {
    let _fx = Fixture::set_up(repo);

    let missing = repo
        .get_product(ProductId::new(MISSING_ID))
        .expect("missing id is not an error");
    assert!(missing.is_none());
}

pub fn category_list_is_distinct<R: ProductRepository + ?Sized>(repo: &R) {
    let fx = Fixture::set_up(repo);

    let categories = repo.list_categories().expect("list categories");
    assert_eq!(categories.len(), 2, "only two categories should be listed");
    assert!(categories.iter().any(|c| c == fx.product1.category()));
    assert!(categories.iter().any(|c| c == fx.product2.category()));
}

pub fn shared_category_is_listed_once<R: ProductRepository + ?Sized>(repo: &R) {
    let fx = Fixture::set_up(repo);
    let sibling = Product::new(333, "product3", "description3", "category1", 3.0, 3.0);
    repo.add_product(sibling.clone()).expect("add sibling");

    let categories = repo.list_categories().expect("list categories");
    assert_eq!(categories.len(), 2);

    let in_category1 = repo.list_by_category("category1").expect("by category");
    assert_eq!(in_category1.len(), 2);
    assert!(in_category1.contains(&fx.product1));
    assert!(in_category1.contains(&sibling));

    repo.delete_product(&sibling).expect("delete sibling");
}

pub fn add_and_delete_product<R: ProductRepository + ?Sized>(repo: &R) {
    let _fx = Fixture::set_up(repo);
    let saved = Product::new(123, "name", "description", "category", 123.123, 123.123);

    repo.add_product(saved.clone()).expect("add product");
    let retrieved = repo
        .get_product(ProductId::new(123))
        .expect("get product")
        .expect("added product should be retrievable");
    assert_eq!(saved, retrieved);
    assert_same_fields(&saved, &retrieved);

    repo.delete_product(&saved).expect("delete product");
    let retrieved = repo.get_product(ProductId::new(123)).expect("get product");
    assert!(retrieved.is_none(), "deleted product should be gone");
}

pub fn update_product_persists_changes<R: ProductRepository + ?Sized>(repo: &R) {
    let fx = Fixture::set_up(repo);

    let mut to_update = repo
        .get_product(fx.product1.id())
        .expect("get product")
        .expect("product1 exists");
    to_update.set_name("productOne");
    to_update.set_description("descriptionOne");
    to_update.set_price(99.5);
    to_update.set_quantity_in_stock(7.0);
    repo.update_product(&to_update).expect("update product");

    let updated = repo
        .get_product(fx.product1.id())
        .expect("get product")
        .expect("product1 still exists");
    assert_eq!(updated.name(), "productOne");
    assert_eq!(updated.description(), "descriptionOne");
    assert!(approx_eq(updated.price(), 99.5));
    assert!(approx_eq(updated.quantity_in_stock(), 7.0));

    let untouched = repo
        .get_product(fx.product2.id())
        .expect("get product")
        .expect("product2 exists");
    assert_same_fields(&fx.product2, &untouched);
}

pub fn get_by_category_is_exact<R: ProductRepository + ?Sized>(repo: &R) {
    let fx = Fixture::set_up(repo);

    let category1 = repo.list_by_category("category1").expect("by category");
    let category2 = repo.list_by_category("category2").expect("by category");
    assert_eq!(category1.len(), 1);
    assert_eq!(category2.len(), 1);

    assert!(category1.contains(&fx.product1));
    assert!(category2.contains(&fx.product2));
    assert!(!category1.contains(&fx.product2));
    assert!(!category2.contains(&fx.product1));

    let none = repo.list_by_category("Category1").expect("by category");
    assert!(none.is_empty(), "category match is case-sensitive");
}

pub fn duplicate_add_is_rejected<R: ProductRepository + ?Sized>(repo: &R) {
    let fx = Fixture::set_up(repo);
    let clash = Product::new(fx.product1.id().get(), "clash", "clash", "clash", 1.0, 1.0);

    let err = repo.add_product(clash).expect_err("duplicate id must fail");
    assert!(matches!(err, CoreError::AlreadyExists), "got {err:?}");

    let stored = repo
        .get_product(fx.product1.id())
        .expect("get product")
        .expect("product1 exists");
    assert_same_fields(&fx.product1, &stored);
}

pub fn update_missing_is_not_found<R: ProductRepository + ?Sized>(repo: &R) {
    let _fx = Fixture::set_up(repo);
    let ghost = Product::new(MISSING_ID, "ghost", "", "none", 0.0, 0.0);

    let err = repo.update_product(&ghost).expect_err("update of missing id");
    assert!(matches!(err, CoreError::NotFound), "got {err:?}");
    assert!(repo
        .get_product(ghost.id())
        .expect("get product")
        .is_none());
}

pub fn delete_missing_is_not_found<R: ProductRepository + ?Sized>(repo: &R) {
    let _fx = Fixture::set_up(repo);
    let ghost = Product::new(MISSING_ID, "ghost", "", "none", 0.0, 0.0);

    let err = repo.delete_product(&ghost).expect_err("delete of missing id");
    assert!(matches!(err, CoreError::NotFound), "got {err:?}");
    assert_eq!(repo.list_products().expect("list products").len(), 2);
}

/// Arbitrary products whose price and quantity lie in the range the service
/// accepts. Used by the backends' property tests.
pub fn product_strategy() -> impl Strategy<Value = Product> {
    (
        any::<i64>(),
        "[a-z]{1,12}",
        ".{0,24}",
        "[a-c]",
        0.0f64..=MAX_AMOUNT,
        0.0f64..=MAX_AMOUNT,
    )
        .prop_map(|(id, name, desc, cat, price, qty)| {
            Product::new(id, name, desc, cat, price, qty)
        })
}

/// Expand every contract case into a `#[test]` for one backend.
///
/// `$setup` is evaluated once per case and must yield `(repo, guard)`.
#[macro_export]
macro_rules! product_repository_contract {
    ($setup:expr) => {
        $crate::product_repository_contract!(@cases $setup;
            get_products_list_contains_fixtures,
            get_product_returns_stored_fields,
            get_missing_product_returns_none,
            category_list_is_distinct,
            shared_category_is_listed_once,
            add_and_delete_product,
            update_product_persists_changes,
            get_by_category_is_exact,
            duplicate_add_is_rejected,
            update_missing_is_not_found,
            delete_missing_is_not_found,
        );
    };
    (@cases $setup:expr; $($case:ident),* $(,)?) => {
        $(
            #[test]
            fn $case() {
                let (repo, _guard) = $setup;
                $crate::contract::$case(&repo);
            }
        )*
    };
}
