//! Request DTOs and JSON mapping helpers.
//!
//! Wire bodies are camelCase, matching the callable API the admin panel
//! already speaks.

use serde::Deserialize;

use geopoint_auth::Profile;
use geopoint_infra::{CreateUserInput, UpdateUserInput};

// -------------------------
// Request DTOs
// -------------------------

// No Debug derive: the body carries a credential.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub target_email: String,
    pub new_password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub tipo: String,
    #[serde(default)]
    pub notas: Option<String>,
    #[serde(default)]
    pub zona: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub nombres: String,
    pub tipo: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notas: Option<String>,
    #[serde(default)]
    pub zona: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteRequest {
    pub target_uids: Vec<String>,
}

// -------------------------
// Mapping helpers
// -------------------------

impl CreateUserRequest {
    pub fn into_input(self) -> CreateUserInput {
        CreateUserInput {
            username: self.username,
            nombres: self.full_name,
            email: self.email,
            password: self.password,
            tipo: self.tipo,
            notas: self.notas,
            zona: self.zona,
        }
    }
}

impl UpdateUserRequest {
    pub fn into_input(self, target_uid: String) -> UpdateUserInput {
        UpdateUserInput {
            target_uid,
            nombres: self.nombres,
            tipo: self.tipo,
            email: self.email,
            notas: self.notas,
            zona: self.zona,
        }
    }
}

pub fn profile_to_json(profile: Profile) -> serde_json::Value {
    serde_json::json!({
        "uid": profile.username.as_str(),
        "username": profile.username.as_str(),
        "nombres": profile.nombres,
        "tipo": profile.tipo,
        "email": profile.email.as_str(),
        "notas": profile.notas,
        "zona": profile.zona,
        "fechacreacion": profile.fechacreacion.to_rfc3339(),
        "creadoPor": profile.creado_por.as_str(),
    })
}
