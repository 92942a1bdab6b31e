//! API routes module

pub mod chat;
pub mod models;

use axum::Router;

use crate::api::SharedState;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Chat routes
        .nest("/chat", chat::router())
        // Model catalog routes
        .nest("/models", models::router())
}
