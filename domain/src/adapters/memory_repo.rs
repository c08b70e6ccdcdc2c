use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use crate::{CoreError, Product, ProductId, ProductRepository};

/// List-backed in-memory repository. Products keep their insertion order;
/// nothing is persisted.
pub struct InMemoryProductRepo {
    inner: Mutex<Vec<Product>>,
}

impl InMemoryProductRepo {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Product>>, CoreError> {
        self.inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))
    }
}

impl Default for InMemoryProductRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductRepository for InMemoryProductRepo {
    fn add_product(&self, product: Product) -> Result<(), CoreError> {
        let mut list = self.lock()?;
        if list.iter().any(|p| p.id() == product.id()) {
            return Err(CoreError::AlreadyExists);
        }
        list.push(product);
        Ok(())
    }

    fn get_product(&self, id: ProductId) -> Result<Option<Product>, CoreError> {
        let list = self.lock()?;
        Ok(list.iter().find(|p| p.id() == id).cloned())
    }

    fn list_products(&self) -> Result<Vec<Product>, CoreError> {
        let list = self.lock()?;
        Ok(list.clone())
    }

    fn list_categories(&self) -> Result<Vec<String>, CoreError> {
        let list = self.lock()?;
        let distinct: BTreeSet<&str> = list.iter().map(|p| p.category()).collect();
        Ok(distinct.into_iter().map(str::to_string).collect())
    }

    fn list_by_category(&self, category: &str) -> Result<Vec<Product>, CoreError> {
        let list = self.lock()?;
        Ok(list
            .iter()
            .filter(|p| p.category() == category)
            .cloned()
            .collect())
    }

    fn update_product(&self, product: &Product) -> Result<(), CoreError> {
        let mut list = self.lock()?;
        match list.iter_mut().find(|p| p.id() == product.id()) {
            Some(stored) => {
                *stored = product.clone();
                Ok(())
            }
            None => Err(CoreError::NotFound),
        }
    }

    fn delete_product(&self, product: &Product) -> Result<(), CoreError> {
        let mut list = self.lock()?;
        match list.iter().position(|p| p.id() == product.id()) {
            Some(idx) => {
                list.remove(idx);
                Ok(())
            }
            None => Err(CoreError::NotFound),
        }
    }
}
