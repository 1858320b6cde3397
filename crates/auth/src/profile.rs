//! Profile record: the authoritative role/identity document.
//!
//! Profiles live in the `usuarios` collection of the document store, keyed by
//! username. Field names keep the stored document spelling (`creadoPor`), so
//! a serialized `Profile` is exactly what the store holds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use geopoint_core::{DomainError, Email, Username};

use crate::role::Role;

/// A profile document.
///
/// # Invariants
/// - `username` equals the lowercased local part of `email`. Caller identity
///   is derived this way, so a mismatch breaks authorization for the account
///   (it fails closed). [`Profile::new`] preserves the invariant by
///   construction.
/// - `tipo` is the raw stored role tag. Legacy documents may carry tags the
///   role model does not recognize; they round-trip unmodified and grant no
///   privilege.
/// - `fechacreacion` is set once at creation and never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub username: Username,
    pub nombres: String,
    pub tipo: String,
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zona: Option<String>,
    pub fechacreacion: DateTime<Utc>,
    #[serde(rename = "creadoPor")]
    pub creado_por: Username,
}

impl Profile {
    /// Build a new profile, deriving the document key from the email.
    pub fn new(
        email: Email,
        nombres: String,
        role: Role,
        created_by: Username,
        created_at: DateTime<Utc>,
    ) -> Self {
        let username = Username::from_email(&email);
        Self {
            username,
            nombres,
            tipo: role.as_str().to_string(),
            email,
            notas: None,
            zona: None,
            fechacreacion: created_at,
            creado_por: created_by,
        }
    }

    /// The normalized role, if the stored tag is recognized.
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.tipo)
    }
}

/// Patch applied to an existing profile.
///
/// `nombres` and `tipo` are always written; the rest only when present.
/// The creation timestamp and `creadoPor` are never patchable, and email
/// changes here do not propagate to the identity provider's credential
/// record (intentional asymmetry, see DESIGN.md).
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub nombres: String,
    pub tipo: Role,
    pub email: Option<Email>,
    pub notas: Option<String>,
    pub zona: Option<String>,
}

impl ProfileUpdate {
    /// Validate the patch fields that have domain rules.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.nombres.trim().is_empty() {
            return Err(DomainError::validation("display name cannot be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(raw: &str) -> Email {
        Email::parse(raw).unwrap()
    }

    fn username(raw: &str) -> Username {
        Username::parse(raw).unwrap()
    }

    #[test]
    fn new_profile_derives_key_from_email() {
        let profile = Profile::new(
            email("JSolis@Geo.com"),
            "Juan Solis".to_string(),
            Role::Usuario,
            username("admin"),
            Utc::now(),
        );

        assert_eq!(profile.username.as_str(), "jsolis");
        assert_eq!(profile.tipo, "usuario");
        assert_eq!(profile.role(), Some(Role::Usuario));
    }

    #[test]
    fn unknown_stored_tag_round_trips_without_privilege() {
        let mut profile = Profile::new(
            email("old@geo.com"),
            "Legacy".to_string(),
            Role::Usuario,
            username("admin"),
            Utc::now(),
        );
        profile.tipo = "operador".to_string();

        assert_eq!(profile.role(), None);

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["tipo"], "operador");
        assert_eq!(json["creadoPor"], "admin");
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let profile = Profile::new(
            email("p@geo.com"),
            "P".to_string(),
            Role::Zonal,
            username("admin"),
            Utc::now(),
        );

        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("notas").is_none());
        assert!(json.get("zona").is_none());
    }

    #[test]
    fn update_requires_a_display_name() {
        let patch = ProfileUpdate {
            nombres: "  ".to_string(),
            tipo: Role::Usuario,
            email: None,
            notas: None,
            zona: None,
        };
        assert!(patch.validate().is_err());
    }
}
