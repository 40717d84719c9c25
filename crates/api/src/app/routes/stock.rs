use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};

use stockledger_products::ProductCatalog;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Stock of every catalog product.
pub async fn warehouse(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.ledger().stock_levels() {
        Ok(levels) => {
            let body: Vec<_> = levels.iter().map(dto::stock_level_to_json).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn stock_of(
    Extension(services): Extension<Arc<AppServices>>,
    Path(product_id): Path<String>,
) -> axum::response::Response {
    let product_id = match dto::parse_product_id(&product_id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    let Some(product) = services.catalog().product(product_id) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found");
    };

    match services.ledger().stock_of(product_id) {
        Ok(stock) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "product_id": product_id.to_string(),
                "name": product.name(),
                "stock": stock,
            })),
        )
            .into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
