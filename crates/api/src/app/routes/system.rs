//! Liveness and caller-introspection endpoints.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use geopoint_auth::IdentityClaims;

use crate::app::{errors, services::AppServices};
use crate::gate;

pub fn router() -> Router {
    Router::new().route("/whoami", get(whoami))
}

/// GET /health - unauthenticated liveness probe
pub async fn health() -> &'static str {
    "ok"
}

/// GET /whoami - the caller context this request resolved to
pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<IdentityClaims>,
) -> axum::response::Response {
    let caller = match gate::resolve_caller(services.profiles.as_ref(), &claims).await {
        Ok(caller) => caller,
        Err(failure) => return errors::gate_failure_to_response(failure),
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "username": caller.username().as_str(),
            "email": caller.email().as_str(),
            "role": caller.role().map(|r| r.as_str()),
        })),
    )
        .into_response()
}
