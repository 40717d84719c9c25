//! Inbound and outbound ledgers. Both share one set of handlers; the route decides the
//! direction.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};

use stockledger_inventory::Direction;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn inbound_router() -> Router {
    Router::new()
        .route("/", get(list_inbound).post(create_inbound))
        .route("/:id", delete(delete_inbound))
}

pub fn outbound_router() -> Router {
    Router::new()
        .route("/", get(list_outbound).post(create_outbound))
        .route("/:id", delete(delete_outbound))
}

pub async fn list_inbound(services: Extension<Arc<AppServices>>) -> axum::response::Response {
    list(Direction::Inbound, services).await
}

pub async fn list_outbound(services: Extension<Arc<AppServices>>) -> axum::response::Response {
    list(Direction::Outbound, services).await
}

pub async fn create_inbound(
    services: Extension<Arc<AppServices>>,
    body: Json<dto::MovementRequest>,
) -> axum::response::Response {
    create(Direction::Inbound, services, body).await
}

pub async fn create_outbound(
    services: Extension<Arc<AppServices>>,
    body: Json<dto::MovementRequest>,
) -> axum::response::Response {
    create(Direction::Outbound, services, body).await
}

pub async fn delete_inbound(services: Extension<Arc<AppServices>>, id: Path<String>) -> axum::response::Response {
    remove(Direction::Inbound, services, id).await
}

pub async fn delete_outbound(services: Extension<Arc<AppServices>>, id: Path<String>) -> axum::response::Response {
    remove(Direction::Outbound, services, id).await
}

/// Entries of one ledger, newest first.
async fn list(direction: Direction, Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.ledger().entries(direction) {
        Ok(entries) => {
            let body: Vec<_> = entries.iter().rev().map(dto::entry_to_json).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

async fn create(
    direction: Direction,
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::MovementRequest>,
) -> axum::response::Response {
    let lines = match body.into_lines() {
        Ok(lines) => lines,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let result = services
        .with_ledger(move |ledger| ledger.create_receipt(direction, &lines))
        .await;

    match result {
        Ok(Ok(receipt)) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Ok(Err(e)) => errors::ledger_error_to_response(e),
        Err(e) => errors::join_error_to_response(e),
    }
}

async fn remove(
    direction: Direction,
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let entry_id = match dto::parse_entry_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    let result = services
        .with_ledger(move |ledger| ledger.remove_entry(entry_id, direction))
        .await;

    match result {
        Ok(Ok(entry)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "deleted",
                "entry": dto::entry_to_json(&entry),
            })),
        )
            .into_response(),
        Ok(Err(e)) => errors::ledger_error_to_response(e),
        Err(e) => errors::join_error_to_response(e),
    }
}
