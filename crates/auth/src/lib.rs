//! `geopoint-auth` — pure authorization boundary (zero-trust).
//!
//! This crate is intentionally decoupled from HTTP and storage: role
//! normalization, permission evaluation, and list visibility are deterministic
//! functions over resolved inputs. The API layer resolves a [`CallerContext`]
//! once per request and threads it through every call; nothing in this crate
//! re-derives a role mid-operation.

pub mod claims;
pub mod context;
pub mod evaluator;
pub mod profile;
pub mod role;
pub mod visibility;

pub use claims::{IdentityClaims, TokenValidationError, validate_claims};
pub use context::CallerContext;
pub use evaluator::{DenyReason, Verdict};
pub use profile::{Profile, ProfileUpdate};
pub use role::{Role, Tier};
