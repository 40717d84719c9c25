use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use stockledger_core::{DomainError, DomainResult, ProductId};
use stockledger_products::{CreateProduct, Product, ProductCatalog, UpdateProduct};

/// In-memory product catalog for tests/dev and the default API wiring.
///
/// Deleting a product never touches the ledger: entries keep the name and price they
/// were written with.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    inner: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, cmd: CreateProduct) -> DomainResult<Product> {
        let product = Product::create(cmd)?;
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if map.contains_key(&product.id_typed()) {
            return Err(DomainError::conflict(format!(
                "product {} already exists",
                product.id_typed()
            )));
        }
        map.insert(product.id_typed(), product.clone());
        debug!(product_id = %product.id_typed(), "product created");
        Ok(product)
    }

    pub fn update(&self, product_id: ProductId, cmd: UpdateProduct) -> DomainResult<Product> {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let current = map.get(&product_id).ok_or(DomainError::NotFound)?;
        let updated = current.updated(cmd)?;
        map.insert(product_id, updated.clone());
        Ok(updated)
    }

    pub fn delete(&self, product_id: ProductId) -> DomainResult<Product> {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let removed = map.remove(&product_id).ok_or(DomainError::NotFound)?;
        debug!(%product_id, "product deleted");
        Ok(removed)
    }

    /// Products ordered by creation time, then name.
    pub fn list(&self) -> Vec<Product> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut products: Vec<Product> = map.values().cloned().collect();
        products.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.name().cmp(b.name()))
        });
        products
    }
}

impl ProductCatalog for InMemoryCatalog {
    fn product(&self, product_id: ProductId) -> Option<Product> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(&product_id).cloned()
    }

    fn products(&self) -> Vec<Product> {
        self.list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn cmd(name: &str, price: u64) -> CreateProduct {
        CreateProduct {
            product_id: ProductId::new(),
            name: name.to_string(),
            unit_price: price,
            description: None,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn create_get_delete() {
        let catalog = InMemoryCatalog::new();
        let p = catalog.create(cmd("Widget", 250)).unwrap();

        assert!(catalog.product_exists(p.id_typed()));
        assert_eq!(catalog.product_price(p.id_typed()), Some(250));

        let removed = catalog.delete(p.id_typed()).unwrap();
        assert_eq!(removed.name(), "Widget");
        assert!(!catalog.product_exists(p.id_typed()));
        assert_eq!(catalog.delete(p.id_typed()).unwrap_err(), DomainError::NotFound);
    }

    #[test]
    fn duplicate_id_is_a_conflict() {
        let catalog = InMemoryCatalog::new();
        let c = cmd("Widget", 1);
        catalog.create(c.clone()).unwrap();
        assert!(matches!(catalog.create(c), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn update_changes_price() {
        let catalog = InMemoryCatalog::new();
        let p = catalog.create(cmd("Widget", 1)).unwrap();

        let updated = catalog
            .update(
                p.id_typed(),
                UpdateProduct {
                    unit_price: Some(9),
                    ..UpdateProduct::default()
                },
            )
            .unwrap();

        assert_eq!(updated.unit_price(), 9);
        assert_eq!(catalog.product_price(p.id_typed()), Some(9));
        assert_eq!(
            catalog.update(ProductId::new(), UpdateProduct::default()).unwrap_err(),
            DomainError::NotFound
        );
    }

    #[test]
    fn list_is_ordered_by_creation() {
        let catalog = InMemoryCatalog::new();
        let now = Utc::now();
        let mut late = cmd("Late", 1);
        late.occurred_at = now;
        let mut early = cmd("Early", 1);
        early.occurred_at = now - Duration::seconds(10);

        catalog.create(late).unwrap();
        catalog.create(early).unwrap();

        let names: Vec<_> = catalog.products().iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["Early", "Late"]);
    }
}
