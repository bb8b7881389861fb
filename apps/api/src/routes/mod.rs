pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/template", get(handlers::handle_template_status))
        .route("/api/v1/stickers/preview", post(handlers::handle_preview))
        .route("/api/v1/stickers/generate", post(handlers::handle_generate))
        .with_state(state)
}
