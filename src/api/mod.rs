mod codes;
pub mod error;
mod webhooks;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route(
            "/stringConcat",
            get(codes::string_concat).post(codes::string_concat),
        )
        .route(
            "/webhook",
            get(webhooks::transaction_webhook).post(webhooks::transaction_webhook),
        )
        .route("/reason-codes/reload", post(codes::reload_reason_codes));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
