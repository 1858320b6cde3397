//! Capability traits for the two external back-ends.
//!
//! The identity provider owns credentials; the document store owns profiles
//! (and the audit log). Nothing outside the coordinator talks to the provider,
//! and role data only ever comes from the profile store.

use async_trait::async_trait;
use thiserror::Error;

use geopoint_auth::{Profile, ProfileUpdate};
use geopoint_core::{Email, Username};

use crate::audit::AuditEntry;

/// Document collection holding profiles, by its historical name.
pub const PROFILES_COLLECTION: &str = "usuarios";

/// An account record as held by the identity provider.
///
/// The credential itself is write-only: it can be set and overwritten, never
/// read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    pub uid: String,
    pub email: Email,
    pub display_name: String,
}

/// Payload for creating a provider account.
///
/// `uid` is chosen by the caller (the derived username) and doubles as the
/// profile document key.
#[derive(Clone)]
pub struct NewIdentity {
    pub uid: Username,
    pub email: Email,
    pub password: String,
    pub display_name: String,
}

impl core::fmt::Debug for NewIdentity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewIdentity")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// Identity-provider failure, already classified.
///
/// Adapters map raw client errors into these kinds; raw provider messages
/// stay in the adapter's logs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("account already exists")]
    AlreadyExists,

    #[error("account not found")]
    NotFound,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of a multi-id provider deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchDeleteReport {
    pub deleted: usize,
    pub missing: usize,
}

/// Minimal identity-provider client surface.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_by_email(&self, email: &Email) -> Result<Option<IdentityRecord>, ProviderError>;

    async fn create(&self, new: NewIdentity) -> Result<IdentityRecord, ProviderError>;

    /// Overwrite the credential of an existing account.
    async fn update_password(&self, uid: &str, new_password: &str) -> Result<(), ProviderError>;

    /// Delete an account. `NotFound` if the uid is unknown.
    async fn delete(&self, uid: &str) -> Result<(), ProviderError>;

    /// Delete several accounts in one request. Unknown uids are counted, not
    /// errors.
    async fn delete_many(&self, uids: &[String]) -> Result<BatchDeleteReport, ProviderError>;
}

/// Document-store failure, already classified.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("document already exists")]
    AlreadyExists,

    #[error("document not found")]
    NotFound,

    #[error("malformed document: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Minimal document-store client surface over the `usuarios` collection,
/// plus the audit-log append.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a profile by document key.
    async fn get(&self, username: &Username) -> Result<Option<Profile>, StoreError>;

    /// Fetch a profile by its stored email (not by derived key).
    async fn find_by_email(&self, email: &Email) -> Result<Option<Profile>, StoreError>;

    /// Create a new document. `AlreadyExists` if the key is taken.
    async fn insert(&self, profile: &Profile) -> Result<(), StoreError>;

    /// Patch an existing document. `NotFound` if the key is unknown.
    async fn update(&self, username: &Username, patch: &ProfileUpdate) -> Result<(), StoreError>;

    /// Delete a document. Returns whether it existed.
    async fn delete(&self, username: &Username) -> Result<bool, StoreError>;

    /// Delete several documents as one atomic commit.
    async fn delete_many(&self, usernames: &[Username]) -> Result<(), StoreError>;

    /// All profiles, unfiltered. Visibility is the caller's concern.
    async fn list_all(&self) -> Result<Vec<Profile>, StoreError>;

    /// Append to the audit log.
    async fn append_audit(&self, entry: &AuditEntry) -> Result<(), StoreError>;
}
