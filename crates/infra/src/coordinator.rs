//! Mutation coordination across the identity provider and the profile store.
//!
//! The two back-ends share no transaction. Every operation here follows the
//! same discipline: validate and authorize **before** any side effect, then
//! apply writes in a fixed order and surface the one documented
//! partial-effect outcome ([`MutationError::PartialCreateFailure`])
//! explicitly instead of papering over it.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};

use geopoint_auth::{CallerContext, DenyReason, Profile, ProfileUpdate, Role, evaluator, visibility};
use geopoint_core::{DomainError, Email, Username};

use crate::audit::{AuditAction, AuditEntry};
use crate::ports::{
    IdentityProvider, NewIdentity, ProfileStore, ProviderError, StoreError,
};

/// Minimum accepted credential length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Caller-facing mutation failure.
///
/// Provider/store detail never crosses this boundary: unexpected failures
/// collapse to [`MutationError::Internal`] and the detail goes to the log.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("permission denied: {}", .0.message())]
    PermissionDenied(DenyReason),

    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    /// Identity record created, profile write failed. The identity is
    /// orphaned and needs manual reconciliation; no automatic rollback is
    /// attempted.
    #[error("identity '{uid}' was created but its profile could not be written")]
    PartialCreateFailure { uid: Username },

    #[error("internal error")]
    Internal,
}

impl From<DomainError> for MutationError {
    fn from(err: DomainError) -> Self {
        MutationError::InvalidArgument(err.to_string())
    }
}

impl From<DenyReason> for MutationError {
    fn from(reason: DenyReason) -> Self {
        MutationError::PermissionDenied(reason)
    }
}

/// Outcome of the best-effort provider-side step inside delete.
///
/// `Skipped` is logged, never escalated: profile deletion is authoritative
/// and proceeds regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderCleanup {
    Succeeded,
    Skipped,
}

/// Input for account creation.
#[derive(Clone)]
pub struct CreateUserInput {
    pub username: String,
    pub nombres: String,
    pub email: String,
    pub password: String,
    pub tipo: String,
    pub notas: Option<String>,
    pub zona: Option<String>,
}

impl core::fmt::Debug for CreateUserInput {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CreateUserInput")
            .field("username", &self.username)
            .field("nombres", &self.nombres)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("tipo", &self.tipo)
            .field("notas", &self.notas)
            .field("zona", &self.zona)
            .finish()
    }
}

/// Input for a profile patch.
#[derive(Debug, Clone)]
pub struct UpdateUserInput {
    pub target_uid: String,
    pub nombres: String,
    pub tipo: String,
    pub email: Option<String>,
    pub notas: Option<String>,
    pub zona: Option<String>,
}

/// Orchestrates user mutations across both back-ends.
pub struct UserMutationCoordinator {
    provider: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
}

impl UserMutationCoordinator {
    pub fn new(provider: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self { provider, profiles }
    }

    /// All profiles the caller may see (possibly empty; never an error for
    /// a resolved caller).
    pub async fn list_users(&self, caller: &CallerContext) -> Result<Vec<Profile>, MutationError> {
        let all = self
            .profiles
            .list_all()
            .await
            .map_err(|e| classify_store("list_users", e))?;
        Ok(visibility::filter_profiles(caller.role(), all))
    }

    /// Create an account in both stores.
    ///
    /// Provider create happens first; the profile write follows under the
    /// same id. A failed profile write leaves an orphaned identity and is
    /// surfaced as [`MutationError::PartialCreateFailure`].
    pub async fn create_user(
        &self,
        caller: &CallerContext,
        input: CreateUserInput,
    ) -> Result<Username, MutationError> {
        let username = Username::parse(&input.username)?;
        let email = Email::parse(&input.email)?;
        if Username::from_email(&email) != username {
            return Err(MutationError::InvalidArgument(
                "username must equal the email's local part".to_string(),
            ));
        }
        let nombres = input.nombres.trim();
        if nombres.is_empty() {
            return Err(MutationError::InvalidArgument(
                "display name is required".to_string(),
            ));
        }
        validate_password(&input.password)?;
        let Some(role) = Role::parse(&input.tipo) else {
            return Err(MutationError::InvalidArgument(format!(
                "unknown role tag '{}'",
                input.tipo.trim()
            )));
        };

        evaluator::create_user(caller.role(), role).into_result()?;

        // The derived id is both provider primary key and profile key; an
        // existing provider account under this email is an id collision.
        let existing = self
            .provider
            .get_by_email(&email)
            .await
            .map_err(|e| classify_provider("create_user", e))?;
        if existing.is_some() {
            return Err(MutationError::AlreadyExists);
        }

        let record = self
            .provider
            .create(NewIdentity {
                uid: username.clone(),
                email: email.clone(),
                password: input.password.clone(),
                display_name: nombres.to_string(),
            })
            .await
            .map_err(|e| classify_provider("create_user", e))?;

        let mut profile = Profile::new(
            email,
            nombres.to_string(),
            role,
            caller.username().clone(),
            Utc::now(),
        );
        profile.notas = input.notas.filter(|n| !n.trim().is_empty());
        profile.zona = input.zona.filter(|z| !z.trim().is_empty());

        if let Err(err) = self.profiles.insert(&profile).await {
            error!(
                uid = %record.uid,
                error = %err,
                "identity created but profile write failed; orphaned identity needs manual reconciliation"
            );
            return Err(MutationError::PartialCreateFailure { uid: username });
        }

        self.audit(
            caller,
            AuditAction::CreateUser,
            username.as_str(),
            format!("created with role '{role}'"),
        )
        .await;
        info!(actor = %caller.username(), uid = %username, %role, "user created");
        Ok(username)
    }

    /// Patch an existing profile. Never touches the provider record: an
    /// email change here does not move the login credential.
    pub async fn update_user(
        &self,
        caller: &CallerContext,
        input: UpdateUserInput,
    ) -> Result<(), MutationError> {
        let target = Username::parse(&input.target_uid)?;
        let Some(requested) = Role::parse(&input.tipo) else {
            return Err(MutationError::InvalidArgument(format!(
                "unknown role tag '{}'",
                input.tipo.trim()
            )));
        };
        let email = input.email.as_deref().map(Email::parse).transpose()?;

        let patch = ProfileUpdate {
            nombres: input.nombres.trim().to_string(),
            tipo: requested,
            email,
            notas: input.notas,
            zona: input.zona,
        };
        patch.validate()?;

        let existing = self
            .profiles
            .get(&target)
            .await
            .map_err(|e| classify_store("update_user", e))?
            .ok_or(MutationError::NotFound)?;

        evaluator::update_user(caller.role(), existing.role(), requested).into_result()?;

        self.profiles
            .update(&target, &patch)
            .await
            .map_err(|e| classify_store("update_user", e))?;

        self.audit(
            caller,
            AuditAction::UpdateUser,
            target.as_str(),
            format!("role '{}' -> '{}'", existing.tipo, requested),
        )
        .await;
        info!(actor = %caller.username(), uid = %target, role = %requested, "user updated");
        Ok(())
    }

    /// Overwrite the credential of the account registered under
    /// `target_email`. Touches the provider only.
    pub async fn change_password(
        &self,
        caller: &CallerContext,
        target_email: &str,
        new_password: &str,
    ) -> Result<String, MutationError> {
        let email = Email::parse(target_email)?;

        if caller.is_self(&email) {
            return Err(DenyReason::SelfTargetForbidden.into());
        }
        validate_password(new_password)?;

        match self
            .profiles
            .find_by_email(&email)
            .await
            .map_err(|e| classify_store("change_password", e))?
        {
            Some(target) => {
                evaluator::change_password(caller.role(), target.role(), false).into_result()?;
            }
            None => {
                // Provider-only accounts have no profile to check against;
                // the operation proceeds without a role check. Flagged for
                // product-owner review (see DESIGN.md), kept as specified.
                warn!(
                    target = %email,
                    "no profile matches target email; proceeding without role check"
                );
            }
        }

        let record = self
            .provider
            .get_by_email(&email)
            .await
            .map_err(|e| classify_provider("change_password", e))?
            .ok_or(MutationError::NotFound)?;

        self.provider
            .update_password(&record.uid, new_password)
            .await
            .map_err(|e| classify_provider("change_password", e))?;

        self.audit(
            caller,
            AuditAction::ChangePassword,
            &record.uid,
            "credential overwritten".to_string(),
        )
        .await;
        info!(actor = %caller.username(), uid = %record.uid, "password changed");
        Ok(format!("password updated for {email}"))
    }

    /// Delete an account from both stores.
    ///
    /// Provider deletion is best-effort; profile deletion is authoritative
    /// and always attempted once the permission check passes.
    pub async fn delete_user(
        &self,
        caller: &CallerContext,
        target_uid: &str,
    ) -> Result<(), MutationError> {
        let target = Username::parse(target_uid)?;

        let profile = self
            .profiles
            .get(&target)
            .await
            .map_err(|e| classify_store("delete_user", e))?
            .ok_or(MutationError::NotFound)?;

        evaluator::delete_user(caller.role(), profile.role()).into_result()?;

        let cleanup = self.provider_cleanup(&target).await;

        self.profiles
            .delete(&target)
            .await
            .map_err(|e| classify_store("delete_user", e))?;

        let detail = match cleanup {
            ProviderCleanup::Succeeded => "identity and profile deleted",
            ProviderCleanup::Skipped => "profile deleted; identity absent or unavailable",
        };
        self.audit(caller, AuditAction::DeleteUser, target.as_str(), detail.to_string())
            .await;
        info!(actor = %caller.username(), uid = %target, ?cleanup, "user deleted");
        Ok(())
    }

    /// Delete several accounts: check-all-then-act-all.
    ///
    /// Every target's permission is evaluated before any deletion side
    /// effect; one denied target fails the whole batch untouched. A target
    /// with no profile fails the batch closed.
    pub async fn delete_users(
        &self,
        caller: &CallerContext,
        target_uids: &[String],
    ) -> Result<usize, MutationError> {
        if target_uids.is_empty() {
            return Err(MutationError::InvalidArgument(
                "target list is empty".to_string(),
            ));
        }

        let mut targets = Vec::with_capacity(target_uids.len());
        for raw in target_uids {
            targets.push(Username::parse(raw)?);
        }

        // Check phase: resolve every target before touching anything.
        let mut roles = Vec::with_capacity(targets.len());
        for target in &targets {
            match self
                .profiles
                .get(target)
                .await
                .map_err(|e| classify_store("delete_users_batch", e))?
            {
                Some(profile) => roles.push(profile.role()),
                None => {
                    warn!(uid = %target, "batch delete target has no profile; failing batch");
                    return Err(DenyReason::InsufficientRole.into());
                }
            }
        }
        evaluator::delete_users(caller.role(), &roles).into_result()?;

        // Act phase: one provider request, one atomic store commit.
        let uids: Vec<String> = targets.iter().map(|t| t.as_str().to_string()).collect();
        match self.provider.delete_many(&uids).await {
            Ok(report) => {
                if report.missing > 0 {
                    info!(missing = report.missing, "identities already absent at provider");
                }
            }
            Err(err) => warn!(error = %err, "provider batch delete failed; continuing"),
        }

        self.profiles
            .delete_many(&targets)
            .await
            .map_err(|e| classify_store("delete_users_batch", e))?;

        for target in &targets {
            self.audit(
                caller,
                AuditAction::DeleteUsersBatch,
                target.as_str(),
                format!("batch of {}", targets.len()),
            )
            .await;
        }
        info!(actor = %caller.username(), count = targets.len(), "batch delete completed");
        Ok(targets.len())
    }

    async fn provider_cleanup(&self, uid: &Username) -> ProviderCleanup {
        match self.provider.delete(uid.as_str()).await {
            Ok(()) => ProviderCleanup::Succeeded,
            Err(ProviderError::NotFound) => {
                info!(%uid, "identity absent at provider; continuing");
                ProviderCleanup::Skipped
            }
            Err(err) => {
                warn!(%uid, error = %err, "provider delete failed; continuing");
                ProviderCleanup::Skipped
            }
        }
    }

    /// Audit appends are best-effort: a failed append is logged, the
    /// mutation itself already happened.
    async fn audit(
        &self,
        caller: &CallerContext,
        action: AuditAction,
        target: &str,
        detail: String,
    ) {
        let entry = AuditEntry::new(caller.username().clone(), action, target, detail);
        if let Err(err) = self.profiles.append_audit(&entry).await {
            warn!(action = action.as_str(), target, error = %err, "audit append failed");
        }
    }
}

fn validate_password(password: &str) -> Result<(), MutationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(MutationError::InvalidArgument(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn classify_provider(op: &'static str, err: ProviderError) -> MutationError {
    match err {
        ProviderError::AlreadyExists => MutationError::AlreadyExists,
        ProviderError::NotFound => MutationError::NotFound,
        ProviderError::InvalidArgument(detail) => {
            warn!(op, %detail, "identity provider rejected request");
            MutationError::InvalidArgument("rejected by identity provider".to_string())
        }
        ProviderError::Unavailable(detail) => {
            error!(op, %detail, "identity provider failure");
            MutationError::Internal
        }
    }
}

fn classify_store(op: &'static str, err: StoreError) -> MutationError {
    match err {
        StoreError::AlreadyExists => MutationError::AlreadyExists,
        StoreError::NotFound => MutationError::NotFound,
        StoreError::Corrupt(detail) => {
            error!(op, %detail, "malformed document in profile store");
            MutationError::Internal
        }
        StoreError::Unavailable(detail) => {
            error!(op, %detail, "profile store failure");
            MutationError::Internal
        }
    }
}
