use std::sync::Arc;

use stockledger_core::ProductId;

use crate::Product;

/// Read-only view of the product catalog, as consumed by the ledger.
///
/// A product referenced by the ledger may be deleted from the catalog at any time;
/// callers treat `None` as "no longer present", never as an error of their own.
pub trait ProductCatalog: Send + Sync {
    /// Look up a product by id.
    fn product(&self, product_id: ProductId) -> Option<Product>;

    fn product_exists(&self, product_id: ProductId) -> bool {
        self.product(product_id).is_some()
    }

    /// Unit price in the smallest currency unit. Only used for receipt valuation.
    fn product_price(&self, product_id: ProductId) -> Option<u64> {
        self.product(product_id).map(|p| p.unit_price())
    }

    /// All products currently in the catalog.
    fn products(&self) -> Vec<Product>;
}

impl<C> ProductCatalog for Arc<C>
where
    C: ProductCatalog + ?Sized,
{
    fn product(&self, product_id: ProductId) -> Option<Product> {
        (**self).product(product_id)
    }

    fn product_exists(&self, product_id: ProductId) -> bool {
        (**self).product_exists(product_id)
    }

    fn product_price(&self, product_id: ProductId) -> Option<u64> {
        (**self).product_price(product_id)
    }

    fn products(&self) -> Vec<Product> {
        (**self).products()
    }
}
