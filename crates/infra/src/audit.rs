//! Append-only audit trail entries.
//!
//! Written after successful mutations, never read back by this system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use geopoint_core::Username;

use crate::ports::PROFILES_COLLECTION;

/// Mutation kind recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    CreateUser,
    UpdateUser,
    DeleteUser,
    DeleteUsersBatch,
    ChangePassword,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::CreateUser => "create_user",
            AuditAction::UpdateUser => "update_user",
            AuditAction::DeleteUser => "delete_user",
            AuditAction::DeleteUsersBatch => "delete_users_batch",
            AuditAction::ChangePassword => "change_password",
        }
    }
}

/// One audit record: who did what to which document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor: Username,
    pub action: AuditAction,
    pub collection: String,
    pub target_id: String,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Build an entry against the profiles collection, stamped now.
    pub fn new(
        actor: Username,
        action: AuditAction,
        target_id: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            actor,
            action,
            collection: PROFILES_COLLECTION.to_string(),
            target_id: target_id.into(),
            detail: detail.into(),
            timestamp: Utc::now(),
        }
    }
}
