use axum::http::StatusCode;
use serde::Deserialize;

use stockledger_core::{DomainError, EntryId, ProductId};
use stockledger_infra::StockDrift;
use stockledger_inventory::{LedgerEntry, MovementLine, StockLevel};
use stockledger_products::Product;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default, alias = "price")]
    pub unit_price: u64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    #[serde(alias = "price")]
    pub unit_price: Option<u64>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MovementItemRequest {
    #[serde(alias = "productId")]
    pub product_id: String,
    /// Signed so that a negative quantity is reported as a validation error rather
    /// than a body parse failure.
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct MovementRequest {
    #[serde(default)]
    pub items: Vec<MovementItemRequest>,
}

impl MovementRequest {
    pub fn into_lines(self) -> Result<Vec<MovementLine>, DomainError> {
        self.items
            .into_iter()
            .map(|item| {
                let product_id: ProductId = item.product_id.parse()?;
                let quantity =
                    u64::try_from(item.quantity).map_err(|_| DomainError::validation("quantity must be positive"))?;
                MovementLine::new(product_id, quantity)
            })
            .collect()
    }
}

// -------------------------
// Path parsing
// -------------------------

pub fn parse_product_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"))
}

pub fn parse_entry_id(raw: &str) -> Result<EntryId, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid entry id"))
}

// -------------------------
// Response mapping
// -------------------------

pub fn product_to_json(p: &Product) -> serde_json::Value {
    serde_json::json!({
        "id": p.id_typed().to_string(),
        "name": p.name(),
        "unit_price": p.unit_price(),
        "description": p.description(),
        "created_at": p.created_at().to_rfc3339(),
    })
}

pub fn entry_to_json(e: &LedgerEntry) -> serde_json::Value {
    serde_json::json!({
        "id": e.id_typed().to_string(),
        "code": e.code().map(|c| c.as_str()),
        "direction": e.direction().as_str(),
        "items": e.lines().iter().map(|l| serde_json::json!({
            "product_id": l.product_id.to_string(),
            "product_name": l.product_name,
            "quantity": l.quantity.get(),
            "unit_price": l.unit_price,
        })).collect::<Vec<_>>(),
        "created_at": e.created_at().to_rfc3339(),
    })
}

pub fn stock_level_to_json(level: &StockLevel) -> serde_json::Value {
    serde_json::json!({
        "product_id": level.product_id.to_string(),
        "name": level.name,
        "stock": level.stock,
    })
}

pub fn drifts_to_json(drifts: &[StockDrift]) -> serde_json::Value {
    serde_json::json!({
        "consistent": drifts.is_empty(),
        "drifts": drifts.iter().map(|d| serde_json::json!({
            "product_id": d.product_id.to_string(),
            "projected": d.projected,
            "derived": d.derived,
        })).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_request_accepts_camel_case_ids() {
        let p = ProductId::new();
        let body = serde_json::json!({ "items": [{ "productId": p.to_string(), "quantity": 3 }] });
        let req: MovementRequest = serde_json::from_value(body).unwrap();

        let lines = req.into_lines().unwrap();
        assert_eq!(lines, vec![MovementLine::new(p, 3).unwrap()]);
    }

    #[test]
    fn non_positive_quantities_are_validation_errors() {
        for quantity in [0, -4] {
            let req = MovementRequest {
                items: vec![MovementItemRequest {
                    product_id: ProductId::new().to_string(),
                    quantity,
                }],
            };
            assert_eq!(
                req.into_lines().unwrap_err(),
                DomainError::validation("quantity must be positive")
            );
        }
    }

    #[test]
    fn malformed_product_id_is_invalid_id() {
        let req = MovementRequest {
            items: vec![MovementItemRequest {
                product_id: "nope".to_string(),
                quantity: 1,
            }],
        };
        assert!(matches!(req.into_lines(), Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn missing_items_parse_as_empty() {
        let req: MovementRequest = serde_json::from_str("{}").unwrap();
        assert!(req.items.is_empty());
    }
}
