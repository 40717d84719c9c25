//! Product catalog domain module.
//!
//! The ledger only *consumes* the catalog: it needs to know whether a product exists
//! and what it costs when a receipt is valued. Catalog CRUD itself is a thin concern;
//! this crate holds the `Product` entity, its commands, and the `ProductCatalog` port.

pub mod catalog;
pub mod product;

pub use catalog::ProductCatalog;
pub use product::{CreateProduct, Product, UpdateProduct};
