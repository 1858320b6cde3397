//! In-memory implementations of both ports.
//!
//! Intended for tests/dev wiring. Not optimized for performance.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use geopoint_auth::{Profile, ProfileUpdate};
use geopoint_core::{Email, Username};

use crate::audit::AuditEntry;
use crate::ports::{
    BatchDeleteReport, IdentityProvider, IdentityRecord, NewIdentity, ProfileStore, ProviderError,
    StoreError,
};

#[derive(Debug, Clone)]
struct StoredIdentity {
    record: IdentityRecord,
    password: String,
}

/// In-memory identity provider.
#[derive(Debug, Default)]
pub struct InMemoryIdentityProvider {
    accounts: RwLock<HashMap<String, StoredIdentity>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an account directly, bypassing the coordinator (fixtures).
    pub fn seed(&self, uid: &str, email: Email, password: &str, display_name: &str) {
        let mut accounts = self.accounts.write().unwrap();
        accounts.insert(
            uid.to_string(),
            StoredIdentity {
                record: IdentityRecord {
                    uid: uid.to_string(),
                    email,
                    display_name: display_name.to_string(),
                },
                password: password.to_string(),
            },
        );
    }

    /// Current credential of an account, if any (assertions in tests).
    pub fn password_of(&self, uid: &str) -> Option<String> {
        let accounts = self.accounts.read().unwrap();
        accounts.get(uid).map(|a| a.password.clone())
    }

    pub fn contains(&self, uid: &str) -> bool {
        let accounts = self.accounts.read().unwrap();
        accounts.contains_key(uid)
    }

    fn poisoned() -> ProviderError {
        ProviderError::Unavailable("lock poisoned".to_string())
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn get_by_email(&self, email: &Email) -> Result<Option<IdentityRecord>, ProviderError> {
        let accounts = self.accounts.read().map_err(|_| Self::poisoned())?;
        Ok(accounts
            .values()
            .find(|a| &a.record.email == email)
            .map(|a| a.record.clone()))
    }

    async fn create(&self, new: NewIdentity) -> Result<IdentityRecord, ProviderError> {
        let mut accounts = self.accounts.write().map_err(|_| Self::poisoned())?;

        if accounts.contains_key(new.uid.as_str()) {
            return Err(ProviderError::AlreadyExists);
        }
        if accounts.values().any(|a| a.record.email == new.email) {
            return Err(ProviderError::AlreadyExists);
        }

        let record = IdentityRecord {
            uid: new.uid.as_str().to_string(),
            email: new.email,
            display_name: new.display_name,
        };
        accounts.insert(
            record.uid.clone(),
            StoredIdentity {
                record: record.clone(),
                password: new.password,
            },
        );
        Ok(record)
    }

    async fn update_password(&self, uid: &str, new_password: &str) -> Result<(), ProviderError> {
        let mut accounts = self.accounts.write().map_err(|_| Self::poisoned())?;
        let account = accounts.get_mut(uid).ok_or(ProviderError::NotFound)?;
        account.password = new_password.to_string();
        Ok(())
    }

    async fn delete(&self, uid: &str) -> Result<(), ProviderError> {
        let mut accounts = self.accounts.write().map_err(|_| Self::poisoned())?;
        accounts.remove(uid).map(|_| ()).ok_or(ProviderError::NotFound)
    }

    async fn delete_many(&self, uids: &[String]) -> Result<BatchDeleteReport, ProviderError> {
        let mut accounts = self.accounts.write().map_err(|_| Self::poisoned())?;
        let mut report = BatchDeleteReport::default();
        for uid in uids {
            if accounts.remove(uid).is_some() {
                report.deleted += 1;
            } else {
                report.missing += 1;
            }
        }
        Ok(report)
    }
}

/// In-memory profile/document store (profiles + audit log).
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    docs: RwLock<HashMap<String, Profile>>,
    audit: RwLock<Vec<AuditEntry>>,
    fail_next_insert: AtomicBool,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document directly, bypassing the coordinator (fixtures).
    pub fn seed(&self, profile: Profile) {
        let mut docs = self.docs.write().unwrap();
        docs.insert(profile.username.as_str().to_string(), profile);
    }

    /// Snapshot of the audit log (assertions in tests).
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.read().unwrap().clone()
    }

    /// Make the next `insert` fail (partial-failure test hook).
    pub fn fail_next_insert(&self) {
        self.fail_next_insert.store(true, Ordering::SeqCst);
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("lock poisoned".to_string())
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get(&self, username: &Username) -> Result<Option<Profile>, StoreError> {
        let docs = self.docs.read().map_err(|_| Self::poisoned())?;
        Ok(docs.get(username.as_str()).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Profile>, StoreError> {
        let docs = self.docs.read().map_err(|_| Self::poisoned())?;
        Ok(docs.values().find(|p| &p.email == email).cloned())
    }

    async fn insert(&self, profile: &Profile) -> Result<(), StoreError> {
        if self.fail_next_insert.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }

        let mut docs = self.docs.write().map_err(|_| Self::poisoned())?;
        if docs.contains_key(profile.username.as_str()) {
            return Err(StoreError::AlreadyExists);
        }
        docs.insert(profile.username.as_str().to_string(), profile.clone());
        Ok(())
    }

    async fn update(&self, username: &Username, patch: &ProfileUpdate) -> Result<(), StoreError> {
        let mut docs = self.docs.write().map_err(|_| Self::poisoned())?;
        let doc = docs.get_mut(username.as_str()).ok_or(StoreError::NotFound)?;

        doc.nombres = patch.nombres.clone();
        doc.tipo = patch.tipo.as_str().to_string();
        if let Some(email) = &patch.email {
            // The document is not re-keyed: a diverged key/email pair fails
            // closed at the auth gate (system invariant).
            doc.email = email.clone();
        }
        if let Some(notas) = &patch.notas {
            doc.notas = Some(notas.clone());
        }
        if let Some(zona) = &patch.zona {
            doc.zona = Some(zona.clone());
        }
        Ok(())
    }

    async fn delete(&self, username: &Username) -> Result<bool, StoreError> {
        let mut docs = self.docs.write().map_err(|_| Self::poisoned())?;
        Ok(docs.remove(username.as_str()).is_some())
    }

    async fn delete_many(&self, usernames: &[Username]) -> Result<(), StoreError> {
        // One write lock for the whole batch: all-or-nothing by construction.
        let mut docs = self.docs.write().map_err(|_| Self::poisoned())?;
        for username in usernames {
            docs.remove(username.as_str());
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Profile>, StoreError> {
        let docs = self.docs.read().map_err(|_| Self::poisoned())?;
        let mut all: Vec<Profile> = docs.values().cloned().collect();
        all.sort_by(|a, b| a.username.as_str().cmp(b.username.as_str()));
        Ok(all)
    }

    async fn append_audit(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        let mut audit = self.audit.write().map_err(|_| Self::poisoned())?;
        audit.push(entry.clone());
        Ok(())
    }
}
