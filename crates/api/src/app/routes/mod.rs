//! Routing tree and handler wiring.

use axum::Router;

pub mod system;
pub mod users;

/// All protected routes (auth middleware is layered on by the app builder).
pub fn router() -> Router {
    Router::new().merge(users::router()).merge(system::router())
}
