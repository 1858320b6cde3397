//! Identity value objects shared by the auth and infra layers.
//!
//! Account identity in this system is string-based: the profile document key
//! is the lowercased local part of the account's email, and the same string
//! doubles as the identity-provider primary key. Both value objects normalize
//! (trim + lowercase) exactly once, at parse time.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A validated, normalized email address.
///
/// Normalization is intentionally minimal (trim + lowercase + shape check);
/// deliverability is the identity provider's problem, not ours.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let normalized = raw.trim().to_lowercase();

        let Some((local, domain)) = normalized.split_once('@') else {
            return Err(DomainError::validation("email must contain '@'"));
        };
        if local.is_empty() {
            return Err(DomainError::validation("email local part is empty"));
        }
        if domain.is_empty() || !domain.contains('.') {
            return Err(DomainError::validation("email domain is malformed"));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before `@`. Always non-empty for a parsed email.
    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or("")
    }
}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A normalized account username.
///
/// This is both the profile document key and the identity-provider primary
/// key. For accounts created through this system the two are equal by
/// construction; `from_email` is the single place the derivation rule lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let normalized = raw.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(DomainError::invalid_id("username is empty"));
        }
        if normalized.contains('@') {
            return Err(DomainError::invalid_id("username must not contain '@'"));
        }
        if normalized.contains('/') {
            // Document keys are path segments in the profile store.
            return Err(DomainError::invalid_id("username must not contain '/'"));
        }

        Ok(Self(normalized))
    }

    /// Derive the username from an email's local part (lowercased).
    ///
    /// This is the caller-identity derivation rule: if a profile's key and
    /// its email local part diverge, authorization for that account fails
    /// closed (profile not found).
    pub fn from_email(email: &Email) -> Self {
        Self(email.local_part().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Username {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Username {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized_on_parse() {
        let email = Email::parse("  JSolis@Geo.COM ").unwrap();
        assert_eq!(email.as_str(), "jsolis@geo.com");
        assert_eq!(email.local_part(), "jsolis");
    }

    #[test]
    fn email_shape_is_checked() {
        assert!(Email::parse("not-an-email").is_err());
        assert!(Email::parse("@geo.com").is_err());
        assert!(Email::parse("user@").is_err());
        assert!(Email::parse("user@nodot").is_err());
    }

    #[test]
    fn username_is_normalized_on_parse() {
        let username = Username::parse("  JSolis ").unwrap();
        assert_eq!(username.as_str(), "jsolis");
    }

    #[test]
    fn username_rejects_reserved_characters() {
        assert!(Username::parse("").is_err());
        assert!(Username::parse("jsolis@geo.com").is_err());
        assert!(Username::parse("a/b").is_err());
    }

    #[test]
    fn username_derivation_matches_local_part() {
        let email = Email::parse("MRivera@geo.com").unwrap();
        let username = Username::from_email(&email);
        assert_eq!(username.as_str(), "mrivera");
    }
}
