use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockledger_core::DomainError;
use stockledger_infra::LedgerCommandError;

pub fn ledger_error_to_response(err: LedgerCommandError) -> axum::response::Response {
    match err {
        LedgerCommandError::Domain(e) => domain_error_to_response(e),
        LedgerCommandError::Store(e) => {
            tracing::error!(error = %e, "ledger store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
        LedgerCommandError::Projection(e) => {
            tracing::error!(error = %e, "stock projection failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "projection_error", e.to_string())
        }
        LedgerCommandError::Lock(e) => {
            tracing::error!(error = %e, "product lock failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "lock_error", e.to_string())
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::UnknownProduct(_) => json_error(StatusCode::UNPROCESSABLE_ENTITY, "unknown_product", message),
        DomainError::InsufficientStock { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "insufficient_stock", message)
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

pub fn join_error_to_response(err: tokio::task::JoinError) -> axum::response::Response {
    tracing::error!(error = %err, "ledger task failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "ledger task failed")
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockledger_core::ProductId;

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (DomainError::validation("items required"), StatusCode::BAD_REQUEST),
            (DomainError::invalid_id("x"), StatusCode::BAD_REQUEST),
            (DomainError::unknown_product(ProductId::new()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                DomainError::insufficient_stock(ProductId::new(), 5, 1),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (DomainError::NotFound, StatusCode::NOT_FOUND),
            (DomainError::conflict("dup"), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(domain_error_to_response(err).status(), status);
        }
    }

    #[test]
    fn infrastructure_errors_are_server_errors() {
        let res = ledger_error_to_response(LedgerCommandError::Lock(stockledger_infra::LockPoisoned));
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
