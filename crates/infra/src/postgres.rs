//! Postgres-backed profile store.
//!
//! Persistent implementation of [`ProfileStore`] for deployments that keep
//! the `usuarios` collection in PostgreSQL instead of a hosted document
//! store. Expected schema:
//!
//! ```sql
//! CREATE TABLE profiles (
//!     username      TEXT PRIMARY KEY,
//!     nombres       TEXT NOT NULL,
//!     tipo          TEXT NOT NULL,
//!     email         TEXT NOT NULL UNIQUE,
//!     notas         TEXT,
//!     zona          TEXT,
//!     fechacreacion TIMESTAMPTZ NOT NULL,
//!     creado_por    TEXT NOT NULL
//! );
//!
//! CREATE TABLE audit_log (
//!     id          UUID PRIMARY KEY,
//!     actor       TEXT NOT NULL,
//!     action      TEXT NOT NULL,
//!     collection  TEXT NOT NULL,
//!     target_id   TEXT NOT NULL,
//!     detail      TEXT NOT NULL,
//!     occurred_at TIMESTAMPTZ NOT NULL
//! );
//! ```
//!
//! ## Error Mapping
//!
//! | SQLx error | StoreError |
//! |------------|------------|
//! | Database, code `23505` (unique violation) | `AlreadyExists` |
//! | any other | `Unavailable` (detail logged, not surfaced) |
//!
//! Rows that fail to parse back into domain types map to `Corrupt`.

use std::sync::Arc;

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use async_trait::async_trait;

use geopoint_auth::{Profile, ProfileUpdate};
use geopoint_core::{Email, Username};

use crate::audit::AuditEntry;
use crate::ports::{ProfileStore, StoreError};

/// Postgres-backed profile/audit store.
///
/// Uses the SQLx connection pool, which handles thread-safe connection
/// management; the store is `Send + Sync` and shared via `Arc`.
#[derive(Debug, Clone)]
pub struct PostgresProfileStore {
    pool: Arc<PgPool>,
}

impl PostgresProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

const SELECT_COLUMNS: &str =
    "username, nombres, tipo, email, notas, zona, fechacreacion, creado_por";

#[async_trait]
impl ProfileStore for PostgresProfileStore {
    #[instrument(skip(self), fields(username = %username))]
    async fn get(&self, username: &Username) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM profiles WHERE username = $1"
        ))
        .bind(username.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get", e))?;

        row.as_ref().map(row_to_profile).transpose()
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn find_by_email(&self, email: &Email) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM profiles WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_email", e))?;

        row.as_ref().map(row_to_profile).transpose()
    }

    #[instrument(skip(self, profile), fields(username = %profile.username))]
    async fn insert(&self, profile: &Profile) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO profiles
                (username, nombres, tipo, email, notas, zona, fechacreacion, creado_por)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(profile.username.as_str())
        .bind(&profile.nombres)
        .bind(&profile.tipo)
        .bind(profile.email.as_str())
        .bind(&profile.notas)
        .bind(&profile.zona)
        .bind(profile.fechacreacion)
        .bind(profile.creado_por.as_str())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;

        Ok(())
    }

    #[instrument(skip(self, patch), fields(username = %username))]
    async fn update(&self, username: &Username, patch: &ProfileUpdate) -> Result<(), StoreError> {
        // COALESCE keeps the stored value when a patch field is absent. The
        // row is never re-keyed on email change (key/email divergence fails
        // closed at the auth gate).
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET nombres = $2,
                tipo = $3,
                email = COALESCE($4, email),
                notas = COALESCE($5, notas),
                zona = COALESCE($6, zona)
            WHERE username = $1
            "#,
        )
        .bind(username.as_str())
        .bind(&patch.nombres)
        .bind(patch.tipo.as_str())
        .bind(patch.email.as_ref().map(|e| e.as_str().to_string()))
        .bind(&patch.notas)
        .bind(&patch.zona)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(username = %username))]
    async fn delete(&self, username: &Username) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM profiles WHERE username = $1")
            .bind(username.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, usernames), fields(count = usernames.len()))]
    async fn delete_many(&self, usernames: &[Username]) -> Result<(), StoreError> {
        let keys: Vec<String> = usernames.iter().map(|u| u.as_str().to_string()).collect();

        // Single statement, single transaction: the batch commits atomically.
        sqlx::query("DELETE FROM profiles WHERE username = ANY($1)")
            .bind(&keys)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_many", e))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Profile>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM profiles ORDER BY username ASC"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_all", e))?;

        rows.iter().map(row_to_profile).collect()
    }

    #[instrument(skip(self, entry), fields(action = entry.action.as_str()))]
    async fn append_audit(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (id, actor, action, collection, target_id, detail, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(entry.actor.as_str())
        .bind(entry.action.as_str())
        .bind(&entry.collection)
        .bind(&entry.target_id)
        .bind(&entry.detail)
        .bind(entry.timestamp)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("append_audit", e))?;

        Ok(())
    }
}

fn row_to_profile(row: &PgRow) -> Result<Profile, StoreError> {
    let username: String = try_column(row, "username")?;
    let email: String = try_column(row, "email")?;
    let creado_por: String = try_column(row, "creado_por")?;

    Ok(Profile {
        username: Username::parse(&username)
            .map_err(|e| StoreError::Corrupt(format!("username: {e}")))?,
        nombres: try_column(row, "nombres")?,
        tipo: try_column(row, "tipo")?,
        email: Email::parse(&email).map_err(|e| StoreError::Corrupt(format!("email: {e}")))?,
        notas: try_column(row, "notas")?,
        zona: try_column(row, "zona")?,
        fechacreacion: try_column(row, "fechacreacion")?,
        creado_por: Username::parse(&creado_por)
            .map_err(|e| StoreError::Corrupt(format!("creado_por: {e}")))?,
    })
}

fn try_column<'r, T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>>(
    row: &'r PgRow,
    name: &str,
) -> Result<T, StoreError> {
    row.try_get(name)
        .map_err(|e| StoreError::Corrupt(format!("{name}: {e}")))
}

fn map_sqlx_error(op: &'static str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some("23505") {
            return StoreError::AlreadyExists;
        }
    }
    StoreError::Unavailable(format!("{op}: {err}"))
}
