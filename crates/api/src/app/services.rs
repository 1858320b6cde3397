//! Back-end wiring: identity provider, profile store, coordinator.

use std::sync::Arc;

use chrono::Utc;

use geopoint_auth::{Profile, Role};
use geopoint_core::{Email, Username};
use geopoint_infra::{
    InMemoryIdentityProvider, InMemoryProfileStore, PostgresProfileStore, UserMutationCoordinator,
};
use geopoint_infra::ports::{IdentityProvider, ProfileStore};

/// Shared per-process services handed to every handler.
pub struct AppServices {
    pub coordinator: UserMutationCoordinator,
    pub profiles: Arc<dyn ProfileStore>,
}

impl AppServices {
    pub fn new(provider: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            coordinator: UserMutationCoordinator::new(provider, profiles.clone()),
            profiles,
        }
    }
}

/// Build services from the environment.
///
/// In-memory stores by default; `USE_PERSISTENT_STORES=true` switches the
/// profile store to Postgres (`DATABASE_URL`). The identity provider has no
/// persistent client in this repo (deployments bind the real provider at
/// the edge), so it stays in-memory either way.
pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    let provider: Arc<dyn IdentityProvider> = Arc::new(InMemoryIdentityProvider::new());

    let profiles: Arc<dyn ProfileStore> = if use_persistent {
        let url = std::env::var("DATABASE_URL")
            .expect("USE_PERSISTENT_STORES=true requires DATABASE_URL");
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .expect("failed to connect to DATABASE_URL");
        tracing::warn!("profile store is persistent; identity provider remains in-memory");
        Arc::new(PostgresProfileStore::new(pool))
    } else {
        Arc::new(InMemoryProfileStore::new())
    };

    bootstrap_admin(profiles.as_ref()).await;

    AppServices::new(provider, profiles)
}

/// First-admin bootstrap: `GEOPOINT_BOOTSTRAP_ADMIN=<email>` seeds a top-role
/// profile when none exists under the derived key. Without it, a fresh
/// in-memory deployment has no caller that can mutate anything.
async fn bootstrap_admin(profiles: &dyn ProfileStore) {
    let Ok(raw) = std::env::var("GEOPOINT_BOOTSTRAP_ADMIN") else {
        return;
    };

    let email = match Email::parse(&raw) {
        Ok(email) => email,
        Err(err) => {
            tracing::error!(error = %err, "GEOPOINT_BOOTSTRAP_ADMIN is not a valid email");
            return;
        }
    };
    let username = Username::from_email(&email);

    match profiles.get(&username).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            let profile = Profile::new(
                email,
                "Administrator".to_string(),
                Role::Admin,
                username.clone(),
                Utc::now(),
            );
            match profiles.insert(&profile).await {
                Ok(()) => tracing::info!(%username, "bootstrapped initial admin profile"),
                Err(err) => tracing::error!(%username, error = %err, "admin bootstrap failed"),
            }
        }
        Err(err) => tracing::error!(%username, error = %err, "admin bootstrap lookup failed"),
    }
}
