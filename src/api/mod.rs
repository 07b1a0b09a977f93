use std::sync::Arc;

use axum::{routing::get, Router};

use crate::errors::ApiError;
use crate::AppState;

pub mod handlers;

/// Build the drinks API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/drinks",
            get(handlers::list_drinks).post(handlers::create_drink),
        )
        .route("/drinks-detail", get(handlers::list_drinks_detail))
        .route(
            "/drinks/:id",
            axum::routing::patch(handlers::update_drink).delete(handlers::delete_drink),
        )
        .fallback(fallback_404)
        .with_state(state)
}

/// Unknown routes get the standard envelope, not a bare status.
async fn fallback_404() -> ApiError {
    ApiError::NotFound
}
