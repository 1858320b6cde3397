//! Consistent error responses.
//!
//! Every failure leaves the handler as `{"error": <stable code>, "message":
//! <short text>}`. Provider/store detail never reaches this layer; the
//! coordinator already collapsed it.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use geopoint_auth::DenyReason;
use geopoint_infra::MutationError;

use crate::gate::GateFailure;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn mutation_error_to_response(err: MutationError) -> axum::response::Response {
    match err {
        MutationError::InvalidArgument(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_argument", msg)
        }
        MutationError::PermissionDenied(reason) => {
            json_error(StatusCode::FORBIDDEN, reason.code(), reason.message())
        }
        MutationError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        MutationError::AlreadyExists => {
            json_error(StatusCode::CONFLICT, "already_exists", "already exists")
        }
        MutationError::PartialCreateFailure { uid } => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "partial_create_failure",
            format!("identity '{uid}' was created without a profile; contact an operator"),
        ),
        MutationError::Internal => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", "internal error")
        }
    }
}

/// Gate failures for *mutating* endpoints: a missing caller profile is a
/// permission denial. Listing handles that case itself (empty result).
pub fn gate_failure_to_response(failure: GateFailure) -> axum::response::Response {
    match failure {
        GateFailure::Unauthenticated => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "authentication required")
        }
        GateFailure::ProfileNotFound { .. } => {
            let reason = DenyReason::CallerProfileMissing;
            json_error(StatusCode::FORBIDDEN, reason.code(), reason.message())
        }
        GateFailure::Internal => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", "internal error")
        }
    }
}
