//! User-administration endpoints.
//!
//! Every handler resolves the caller through the gate first, then hands the
//! operation to the mutation coordinator. Listing is the one endpoint where
//! an unprovisioned caller gets an empty result instead of a denial.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde_json::json;
use tracing::info;

use geopoint_auth::{CallerContext, IdentityClaims};

use crate::app::dto::{
    BatchDeleteRequest, ChangePasswordRequest, CreateUserRequest, UpdateUserRequest,
    profile_to_json,
};
use crate::app::{errors, services::AppServices};
use crate::gate::{self, GateFailure};

pub fn router() -> Router {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/batch-delete", post(delete_users_batch))
        .route("/users/password", post(change_password))
        .route("/users/:id", patch(update_user).delete(delete_user))
}

/// Resolve the caller for a mutating endpoint: no profile means no standing.
async fn require_caller(
    services: &AppServices,
    claims: &IdentityClaims,
) -> Result<CallerContext, axum::response::Response> {
    gate::resolve_caller(services.profiles.as_ref(), claims)
        .await
        .map_err(errors::gate_failure_to_response)
}

/// GET /users - list the profiles visible to the caller
pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<IdentityClaims>,
) -> axum::response::Response {
    let caller = match gate::resolve_caller(services.profiles.as_ref(), &claims).await {
        Ok(caller) => caller,
        Err(GateFailure::ProfileNotFound { username }) => {
            // Authenticated but unprovisioned: empty listing, not an error.
            info!(%username, "caller has no profile; returning empty listing");
            return (StatusCode::OK, Json(json!({ "users": [] }))).into_response();
        }
        Err(failure) => return errors::gate_failure_to_response(failure),
    };

    match services.coordinator.list_users(&caller).await {
        Ok(profiles) => {
            let users: Vec<serde_json::Value> = profiles.into_iter().map(profile_to_json).collect();
            (StatusCode::OK, Json(json!({ "users": users }))).into_response()
        }
        Err(err) => errors::mutation_error_to_response(err),
    }
}

/// POST /users - create an account in both back-ends
pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<IdentityClaims>,
    Json(body): Json<CreateUserRequest>,
) -> axum::response::Response {
    let caller = match require_caller(&services, &claims).await {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };

    match services.coordinator.create_user(&caller, body.into_input()).await {
        Ok(uid) => (
            StatusCode::CREATED,
            Json(json!({ "success": true, "uid": uid.as_str() })),
        )
            .into_response(),
        Err(err) => errors::mutation_error_to_response(err),
    }
}

/// PATCH /users/:id - patch a profile document
pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<IdentityClaims>,
    Path(target_uid): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> axum::response::Response {
    let caller = match require_caller(&services, &claims).await {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };

    match services
        .coordinator
        .update_user(&caller, body.into_input(target_uid))
        .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(err) => errors::mutation_error_to_response(err),
    }
}

/// DELETE /users/:id - delete an account from both back-ends
pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<IdentityClaims>,
    Path(target_uid): Path<String>,
) -> axum::response::Response {
    let caller = match require_caller(&services, &claims).await {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };

    match services.coordinator.delete_user(&caller, &target_uid).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(err) => errors::mutation_error_to_response(err),
    }
}

/// POST /users/batch-delete - delete several accounts atomically
pub async fn delete_users_batch(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<IdentityClaims>,
    Json(body): Json<BatchDeleteRequest>,
) -> axum::response::Response {
    let caller = match require_caller(&services, &claims).await {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };

    match services
        .coordinator
        .delete_users(&caller, &body.target_uids)
        .await
    {
        Ok(count) => (
            StatusCode::OK,
            Json(json!({ "success": true, "count": count })),
        )
            .into_response(),
        Err(err) => errors::mutation_error_to_response(err),
    }
}

/// POST /users/password - overwrite another account's credential
pub async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<IdentityClaims>,
    Json(body): Json<ChangePasswordRequest>,
) -> axum::response::Response {
    let caller = match require_caller(&services, &claims).await {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };

    match services
        .coordinator
        .change_password(&caller, &body.target_email, &body.new_password)
        .await
    {
        Ok(message) => (
            StatusCode::OK,
            Json(json!({ "success": true, "message": message })),
        )
            .into_response(),
        Err(err) => errors::mutation_error_to_response(err),
    }
}
