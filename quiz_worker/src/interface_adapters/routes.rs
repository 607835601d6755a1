use crate::interface_adapters::handlers::{generate_quiz, health};
use crate::interface_adapters::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

pub fn app(state: Arc<AppState>) -> Router {
    // Wire the HTTP routes to their handlers.
    Router::new()
        .route("/generate_quiz", post(generate_quiz))
        .route("/health", get(health))
        .with_state(state)
}
