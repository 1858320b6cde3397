//! Resolved caller context for a request.

use geopoint_core::{Email, Username};

use crate::role::Role;

/// The authenticated caller, resolved once per request by the auth gate.
///
/// `role` is `None` when the caller's profile exists but carries an
/// unrecognized role tag; such callers are authenticated yet satisfy no
/// positive permission check. Callers with *no* profile never reach this
/// type: the gate reports them separately so read-only listing can degrade
/// to an empty result while mutations fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    username: Username,
    email: Email,
    role: Option<Role>,
}

impl CallerContext {
    pub fn new(username: Username, email: Email, role: Option<Role>) -> Self {
        Self {
            username,
            email,
            role,
        }
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Whether `email` refers to the caller's own account.
    ///
    /// Emails are normalized at parse time, so plain equality is enough.
    pub fn is_self(&self, email: &Email) -> bool {
        &self.email == email
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geopoint_core::Email;

    #[test]
    fn self_detection_uses_normalized_emails() {
        let email = Email::parse("JSolis@geo.com").unwrap();
        let caller = CallerContext::new(
            Username::from_email(&email),
            email,
            Some(Role::Usuario),
        );

        assert!(caller.is_self(&Email::parse("jsolis@GEO.com").unwrap()));
        assert!(!caller.is_self(&Email::parse("other@geo.com").unwrap()));
    }
}
