//! HTTP API application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: back-end wiring (identity provider, profile store,
//!   mutation coordinator)
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(jwt_secret: String) -> Router {
    let services = Arc::new(services::build_services().await);
    build_router(jwt_secret, services)
}

/// Assemble the router around pre-built services (tests wire their own).
pub fn build_router(jwt_secret: String, services: Arc<services::AppServices>) -> Router {
    let auth_state = middleware::AuthState::new(jwt_secret.as_bytes());

    // Protected routes: require a verified identity assertion.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
