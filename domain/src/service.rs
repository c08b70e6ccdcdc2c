use tracing::{debug, info};

use crate::validate::validate_product;
use crate::{CoreError, NewProduct, Product, ProductId, ProductRepository, ProductUpdate};

/// Application service over a product repository.
///
/// Validates input before it reaches storage and turns "missing" lookups into
/// `NotFound` for the mutating operations. Generic over the repository so the
/// same service runs against memory or SQL storage.
pub struct CatalogService<R: ProductRepository> {
    repo: R,
}

impl<R: ProductRepository> CatalogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Create and store a new product.
    pub fn create(&self, input: NewProduct) -> Result<Product, CoreError> {
        let product = Product::from(input);
        validate_product(&product)?;
        if self.repo.get_product(product.id())?.is_some() {
            return Err(CoreError::AlreadyExists);
        }
        self.repo.add_product(product.clone())?;
        info!(id = %product.id(), category = product.category(), "product created");
        Ok(product)
    }

    pub fn get(&self, id: ProductId) -> Result<Option<Product>, CoreError> {
        self.repo.get_product(id)
    }

    pub fn list(&self) -> Result<Vec<Product>, CoreError> {
        self.repo.list_products()
    }

    pub fn categories(&self) -> Result<Vec<String>, CoreError> {
        self.repo.list_categories()
    }

    pub fn by_category(&self, category: &str) -> Result<Vec<Product>, CoreError> {
        self.repo.list_by_category(category)
    }

    /// Apply all requested field changes with a single validated write.
    /// Nothing is stored if any change is invalid.
    pub fn update(&self, id: ProductId, changes: ProductUpdate) -> Result<Product, CoreError> {
        self.modify(id, |p| changes.apply_to(p))
    }

    /// Change name and/or description of an existing product.
    pub fn rename(
        &self,
        id: ProductId,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Product, CoreError> {
        self.update(
            id,
            ProductUpdate {
                name,
                description,
                ..Default::default()
            },
        )
    }

    /// Set the stock quantity of an existing product.
    pub fn restock(&self, id: ProductId, quantity: f64) -> Result<Product, CoreError> {
        self.update(
            id,
            ProductUpdate {
                quantity_in_stock: Some(quantity),
                ..Default::default()
            },
        )
    }

    /// Set the price of an existing product.
    pub fn reprice(&self, id: ProductId, price: f64) -> Result<Product, CoreError> {
        self.update(
            id,
            ProductUpdate {
                price: Some(price),
                ..Default::default()
            },
        )
    }

    /// Delete a product by id.
    pub fn remove(&self, id: ProductId) -> Result<Product, CoreError> {
        let product = self.repo.get_product(id)?.ok_or(CoreError::NotFound)?;
        self.repo.delete_product(&product)?;
        info!(%id, "product removed");
        Ok(product)
    }

    fn modify<F>(&self, id: ProductId, change: F) -> Result<Product, CoreError>
    where
        F: FnOnce(&mut Product),
    {
        let mut product = self.repo.get_product(id)?.ok_or(CoreError::NotFound)?;
        change(&mut product);
        validate_product(&product)?;
        self.repo.update_product(&product)?;
        debug!(%id, "product updated");
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_repo::InMemoryProductRepo;

    fn input(id: i64, category: &str) -> NewProduct {
        NewProduct {
            id: ProductId::new(id),
            name: format!("product{id}"),
            description: format!("description{id}"),
            category: category.to_string(),
            price: 10.0,
            quantity_in_stock: 1.0,
        }
    }

    #[test]
    fn create_and_get() {
        let svc = CatalogService::new(InMemoryProductRepo::new());
        let created = svc.create(input(1, "tools")).expect("created");
        let fetched = svc.get(ProductId::new(1)).unwrap().unwrap();
        assert!(created.matches(&fetched));
    }

    #[test]
    fn create_rejects_duplicate_and_invalid() {
        let svc = CatalogService::new(InMemoryProductRepo::new());
        svc.create(input(1, "tools")).unwrap();
        let err = svc.create(input(1, "garden")).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists));

        let mut bad = input(2, "tools");
        bad.price = -1.0;
        let err = svc.create(bad).unwrap_err();
        assert!(matches!(err, CoreError::InvalidProduct(_)));
        assert!(svc.get(ProductId::new(2)).unwrap().is_none());
    }

    #[test]
    fn rename_only_touches_given_fields() {
        let svc = CatalogService::new(InMemoryProductRepo::new());
        svc.create(input(1, "tools")).unwrap();
        let renamed = svc
            .rename(ProductId::new(1), Some("productOne".into()), None)
            .unwrap();
        assert_eq!(renamed.name(), "productOne");
        assert_eq!(renamed.description(), "description1");

        let stored = svc.get(ProductId::new(1)).unwrap().unwrap();
        assert_eq!(stored.name(), "productOne");
    }

    #[test]
    fn restock_and_reprice() {
        let svc = CatalogService::new(InMemoryProductRepo::new());
        svc.create(input(1, "tools")).unwrap();
        svc.restock(ProductId::new(1), 42.0).unwrap();
        svc.reprice(ProductId::new(1), 3.5).unwrap();
        let stored = svc.get(ProductId::new(1)).unwrap().unwrap();
        assert_eq!(stored.quantity_in_stock(), 42.0);
        assert_eq!(stored.price(), 3.5);

        let err = svc.restock(ProductId::new(1), -1.0).unwrap_err();
        assert!(matches!(err, CoreError::InvalidProduct(_)));
    }

    #[test]
    fn invalid_update_writes_nothing() {
        let svc = CatalogService::new(InMemoryProductRepo::new());
        svc.create(input(1, "tools")).unwrap();
        let changes = ProductUpdate {
            name: Some("new".into()),
            price: Some(-5.0),
            ..Default::default()
        };
        let err = svc.update(ProductId::new(1), changes).unwrap_err();
        assert!(matches!(err, CoreError::InvalidProduct(_)));

        let stored = svc.get(ProductId::new(1)).unwrap().unwrap();
        assert_eq!(stored.name(), "product1");
        assert_eq!(stored.price(), 10.0);
    }

    #[test]
    fn update_applies_all_changes_at_once() {
        let svc = CatalogService::new(InMemoryProductRepo::new());
        svc.create(input(1, "tools")).unwrap();
        let changes = ProductUpdate {
            name: Some("productOne".into()),
            description: Some("descriptionOne".into()),
            price: Some(5.0),
            quantity_in_stock: Some(2.0),
        };
        let updated = svc.update(ProductId::new(1), changes).unwrap();
        let stored = svc.get(ProductId::new(1)).unwrap().unwrap();
        assert!(updated.matches(&stored));
        assert_eq!(stored.name(), "productOne");
        assert_eq!(stored.quantity_in_stock(), 2.0);
    }

    #[test]
    fn create_rejects_amount_above_limit() {
        let svc = CatalogService::new(InMemoryProductRepo::new());
        let mut huge = input(1, "tools");
        huge.price = 1.0e17;
        assert!(matches!(svc.create(huge), Err(CoreError::InvalidProduct(_))));
        assert!(svc.get(ProductId::new(1)).unwrap().is_none());
    }

    #[test]
    fn mutations_on_missing_product_are_not_found() {
        let svc = CatalogService::new(InMemoryProductRepo::new());
        let missing = ProductId::new(999);
        assert!(matches!(svc.rename(missing, None, None), Err(CoreError::NotFound)));
        assert!(matches!(svc.reprice(missing, 1.0), Err(CoreError::NotFound)));
        assert!(matches!(svc.remove(missing), Err(CoreError::NotFound)));
    }

    #[test]
    fn categories_and_filter() {
        let svc = CatalogService::new(InMemoryProductRepo::new());
        svc.create(input(1, "tools")).unwrap();
        svc.create(input(2, "tools")).unwrap();
        svc.create(input(3, "garden")).unwrap();
        assert_eq!(svc.categories().unwrap().len(), 2);
        assert_eq!(svc.by_category("tools").unwrap().len(), 2);

        svc.remove(ProductId::new(3)).unwrap();
        assert_eq!(svc.categories().unwrap(), vec!["tools"]);
        assert_eq!(svc.list().unwrap().len(), 2);
    }
}
