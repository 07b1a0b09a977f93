//! Tapline — drink catalog service with JWT scope-based access control.
//!
//! Library crate so integration tests in `tests/` can build the router
//! against an injected store and key set.

use std::sync::Arc;

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod models;
pub mod store;

use auth::TokenVerifier;
use store::DrinkStore;

/// Shared application state passed to handlers.
pub struct AppState {
    pub store: Arc<dyn DrinkStore>,
    pub verifier: TokenVerifier,
}
