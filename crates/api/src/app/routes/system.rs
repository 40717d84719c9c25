use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Compare cached balances with the ledger.
pub async fn verify(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let result = services.with_ledger(|ledger| ledger.verify_consistency()).await;

    match result {
        Ok(Ok(drifts)) => (StatusCode::OK, Json(dto::drifts_to_json(&drifts))).into_response(),
        Ok(Err(e)) => errors::ledger_error_to_response(e),
        Err(e) => errors::join_error_to_response(e),
    }
}

/// Rebuild cached balances from the ledger; reports what was repaired.
pub async fn reconcile(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let result = services.with_ledger(|ledger| ledger.reconcile()).await;

    match result {
        Ok(Ok(drifts)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "repaired": drifts.len(),
                "report": dto::drifts_to_json(&drifts),
            })),
        )
            .into_response(),
        Ok(Err(e)) => errors::ledger_error_to_response(e),
        Err(e) => errors::join_error_to_response(e),
    }
}
