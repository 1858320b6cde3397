//! `geopoint-infra` — collaborator ports and mutation orchestration.
//!
//! The two back-ends (identity provider, profile/document store) are consumed
//! through minimal capability traits; this crate also carries their dev/test
//! in-memory implementations, the Postgres-backed profile store, and the
//! saga-style [`coordinator::UserMutationCoordinator`] that keeps the two
//! stores consistent across partial failures.

pub mod audit;
pub mod coordinator;
pub mod in_memory;
pub mod ports;
pub mod postgres;

pub use audit::{AuditAction, AuditEntry};
pub use coordinator::{CreateUserInput, MutationError, UpdateUserInput, UserMutationCoordinator};
pub use in_memory::{InMemoryIdentityProvider, InMemoryProfileStore};
pub use ports::{
    BatchDeleteReport, IdentityProvider, IdentityRecord, NewIdentity, ProfileStore, ProviderError,
    StoreError, PROFILES_COLLECTION,
};
pub use postgres::PostgresProfileStore;
