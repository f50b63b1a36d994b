use axum::{Router, routing::get};

pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// GET /health
async fn health() -> &'static str {
    "ok"
}
