use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult, Entity, ProductId};

/// Catalog product.
///
/// Identity is immutable; name, price and description can change. Prices are kept in
/// the smallest currency unit (no currency handling).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    unit_price: u64,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

/// Command: CreateProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub unit_price: u64,
    #[serde(default)]
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateProduct. `None` leaves the attribute unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub unit_price: Option<u64>,
    pub description: Option<String>,
}

impl Product {
    pub fn create(cmd: CreateProduct) -> DomainResult<Self> {
        let name = normalize_name(&cmd.name)?;
        Ok(Self {
            id: cmd.product_id,
            name,
            unit_price: cmd.unit_price,
            description: cmd.description.filter(|d| !d.trim().is_empty()),
            created_at: cmd.occurred_at,
        })
    }

    /// Apply an update, returning the changed product (the original is left untouched).
    pub fn updated(&self, cmd: UpdateProduct) -> DomainResult<Self> {
        let mut next = self.clone();
        if let Some(name) = cmd.name {
            next.name = normalize_name(&name)?;
        }
        if let Some(price) = cmd.unit_price {
            next.unit_price = price;
        }
        if let Some(description) = cmd.description {
            next.description = Some(description).filter(|d| !d.trim().is_empty());
        }
        Ok(next)
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn normalize_name(name: &str) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(trimmed.to_string())
}
