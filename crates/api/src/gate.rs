//! Auth gate: authenticated identity → resolved [`CallerContext`].
//!
//! The caller's username is derived from the asserted email's local part,
//! lowercased, and the role comes from exactly one profile lookup by that
//! key. If key and email have diverged for an account, resolution fails
//! closed; that is the documented system invariant, not a bug to repair
//! here.

use tracing::{error, warn};

use geopoint_auth::{CallerContext, IdentityClaims};
use geopoint_core::{Email, Username};
use geopoint_infra::ports::ProfileStore;

/// Why a caller context could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateFailure {
    /// The assertion carried an email the system cannot work with.
    Unauthenticated,

    /// Authenticated, but no profile document exists under the derived key.
    /// Such callers get empty listings and are denied every mutation.
    ProfileNotFound { username: Username },

    /// The profile store failed; detail is in the log.
    Internal,
}

/// Resolve the caller for this request. Performs exactly one profile lookup.
pub async fn resolve_caller(
    store: &dyn ProfileStore,
    claims: &IdentityClaims,
) -> Result<CallerContext, GateFailure> {
    let email = match Email::parse(&claims.email) {
        Ok(email) => email,
        Err(err) => {
            warn!(sub = %claims.sub, error = %err, "assertion carried an unusable email");
            return Err(GateFailure::Unauthenticated);
        }
    };

    let username = Username::from_email(&email);

    match store.get(&username).await {
        Ok(Some(profile)) => {
            let role = profile.role();
            if role.is_none() {
                warn!(%username, tipo = %profile.tipo, "caller profile has unrecognized role tag");
            }
            Ok(CallerContext::new(username, email, role))
        }
        Ok(None) => Err(GateFailure::ProfileNotFound { username }),
        Err(err) => {
            error!(%username, error = %err, "profile lookup failed during caller resolution");
            Err(GateFailure::Internal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use geopoint_auth::{Profile, Role};
    use geopoint_infra::InMemoryProfileStore;

    fn claims(email: &str) -> IdentityClaims {
        IdentityClaims {
            sub: "uid".to_string(),
            email: email.to_string(),
            iat: 0,
            exp: i64::MAX,
        }
    }

    fn seed(store: &InMemoryProfileStore, email: &str, tipo: &str) {
        let email = Email::parse(email).unwrap();
        let mut profile = Profile::new(
            email,
            "Seeded".to_string(),
            Role::Usuario,
            Username::parse("seed").unwrap(),
            Utc::now(),
        );
        profile.tipo = tipo.to_string();
        store.seed(profile);
    }

    #[tokio::test]
    async fn resolves_role_from_the_derived_key() {
        let store = InMemoryProfileStore::new();
        seed(&store, "sup@geo.com", "supervisor");

        let caller = resolve_caller(&store, &claims("Sup@Geo.com")).await.unwrap();
        assert_eq!(caller.username().as_str(), "sup");
        assert_eq!(caller.role(), Some(Role::Supervisor));
    }

    #[tokio::test]
    async fn missing_profile_is_reported_distinctly() {
        let store = InMemoryProfileStore::new();

        let failure = resolve_caller(&store, &claims("ghost@geo.com"))
            .await
            .unwrap_err();
        assert_eq!(
            failure,
            GateFailure::ProfileNotFound {
                username: Username::parse("ghost").unwrap()
            }
        );
    }

    #[tokio::test]
    async fn unrecognized_role_tag_resolves_with_no_role() {
        let store = InMemoryProfileStore::new();
        seed(&store, "old@geo.com", "operador");

        let caller = resolve_caller(&store, &claims("old@geo.com")).await.unwrap();
        assert_eq!(caller.role(), None);
    }

    #[tokio::test]
    async fn malformed_assertion_email_is_unauthenticated() {
        let store = InMemoryProfileStore::new();

        let failure = resolve_caller(&store, &claims("not-an-email"))
            .await
            .unwrap_err();
        assert_eq!(failure, GateFailure::Unauthenticated);
    }
}
