use axum::{Router, routing::get};

pub mod movements;
pub mod products;
pub mod receipts;
pub mod stock;
pub mod system;

/// Router for every `/api` endpoint.
pub fn router() -> Router {
    Router::new()
        .nest("/products", products::router())
        .nest("/inbound", movements::inbound_router())
        .nest("/outbound", movements::outbound_router())
        .route("/warehouse", get(stock::warehouse))
        .route("/stock/:product_id", get(stock::stock_of))
        .route("/receipts/:code", get(receipts::get_receipt))
        .route("/reconcile", get(system::verify).post(system::reconcile))
}
