//! Permission evaluation: one stateless function per operation.
//!
//! Every function takes already-resolved roles (the gate resolves the caller
//! exactly once; call sites parse the target's stored tag exactly once) and
//! returns a [`Verdict`]. Deny verdicts carry a machine-distinguishable
//! [`DenyReason`]; no internal detail leaks to the caller.
//!
//! The rule table, authoritative across all operations:
//!
//! | caller      | change pwd target | create        | update target      | delete target   |
//! |-------------|-------------------|---------------|--------------------|-----------------|
//! | top         | anyone but self   | any role      | any                | any             |
//! | mid         | base tier         | mid, base     | any non-top        | below mid only  |
//! | base        | base tier         | base          | base tier, to base | base tier       |
//! | unrecognized| nothing           | nothing       | nothing            | nothing         |

use serde::Serialize;

use crate::role::{Role, Tier};

/// Machine-readable reason for a denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The caller's role does not cover the requested operation/target.
    InsufficientRole,

    /// The operation may not target the caller's own account.
    SelfTargetForbidden,

    /// The caller is authenticated but has no profile document.
    CallerProfileMissing,
}

impl DenyReason {
    /// Stable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::InsufficientRole => "insufficient_role",
            DenyReason::SelfTargetForbidden => "self_target_forbidden",
            DenyReason::CallerProfileMissing => "caller_profile_missing",
        }
    }

    /// Short human-readable message. Intentionally generic: permission
    /// failures never explain what *would* have been allowed.
    pub fn message(&self) -> &'static str {
        match self {
            DenyReason::InsufficientRole => "role does not permit this operation",
            DenyReason::SelfTargetForbidden => "operation may not target your own account",
            DenyReason::CallerProfileMissing => "no profile is configured for this account",
        }
    }
}

impl core::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Verdict {
    Allow,
    Deny(DenyReason),
}

impl Verdict {
    pub fn is_allow(&self) -> bool {
        matches!(self, Verdict::Allow)
    }

    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Verdict::Allow => Ok(()),
            Verdict::Deny(reason) => Err(reason),
        }
    }
}

/// May `caller` overwrite the credential of an account with role `target`?
///
/// `target` is the role of the profile matched by the target email; `None`
/// means the profile exists but its tag is unrecognized. The
/// no-profile-at-all case is handled by the coordinator (permissive skip,
/// see DESIGN.md) and never reaches this function.
pub fn change_password(
    caller: Option<Role>,
    target: Option<Role>,
    self_target: bool,
) -> Verdict {
    let Some(caller) = caller else {
        return Verdict::Deny(DenyReason::InsufficientRole);
    };

    // Self-service password change goes through a different flow; this
    // endpoint is strictly on-others.
    if self_target {
        return Verdict::Deny(DenyReason::SelfTargetForbidden);
    }

    if caller.is_top() {
        return Verdict::Allow;
    }

    match target {
        Some(target) if target.is_base() => Verdict::Allow,
        _ => Verdict::Deny(DenyReason::InsufficientRole),
    }
}

/// May `caller` create an account with role `requested`?
pub fn create_user(caller: Option<Role>, requested: Role) -> Verdict {
    let Some(caller) = caller else {
        return Verdict::Deny(DenyReason::InsufficientRole);
    };

    let allowed = match caller.tier() {
        Tier::Top => true,
        Tier::Mid => requested.is_mid() || requested.is_base(),
        Tier::Base => requested.is_base(),
    };

    if allowed {
        Verdict::Allow
    } else {
        Verdict::Deny(DenyReason::InsufficientRole)
    }
}

/// May `caller` patch a profile whose current role is `existing`, setting its
/// role to `requested`?
///
/// `existing` is `None` for unrecognized stored tags: those rank below base,
/// so a mid caller may still edit them, while a base caller may not (base may
/// only touch confirmed base-tier peers).
pub fn update_user(caller: Option<Role>, existing: Option<Role>, requested: Role) -> Verdict {
    let Some(caller) = caller else {
        return Verdict::Deny(DenyReason::InsufficientRole);
    };

    let allowed = match caller.tier() {
        Tier::Top => true,
        Tier::Mid => {
            // A mid caller can never touch a top-tier profile, nor promote
            // anyone into top tier.
            !existing.is_some_and(|r| r.is_top()) && !requested.is_top()
        }
        Tier::Base => {
            existing.is_some_and(|r| r.is_base()) && requested.is_base()
        }
    };

    if allowed {
        Verdict::Allow
    } else {
        Verdict::Deny(DenyReason::InsufficientRole)
    }
}

/// May `caller` delete an account with role `target`?
pub fn delete_user(caller: Option<Role>, target: Option<Role>) -> Verdict {
    let Some(caller) = caller else {
        return Verdict::Deny(DenyReason::InsufficientRole);
    };

    let allowed = match caller.tier() {
        Tier::Top => true,
        // Mid may not delete equals or superiors.
        Tier::Mid => !target.is_some_and(|r| r.is_top() || r.is_mid()),
        Tier::Base => target.is_some_and(|r| r.is_base()),
    };

    if allowed {
        Verdict::Allow
    } else {
        Verdict::Deny(DenyReason::InsufficientRole)
    }
}

/// Batch variant of [`delete_user`]: every target must pass its own check.
///
/// Returns the first deny encountered, `Allow` only when all targets pass.
/// Callers must run this to completion **before** any deletion side effect.
pub fn delete_users(caller: Option<Role>, targets: &[Option<Role>]) -> Verdict {
    for target in targets {
        if let Verdict::Deny(reason) = delete_user(caller, *target) {
            return Verdict::Deny(reason);
        }
    }
    Verdict::Allow
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROLES: [Role; 4] = [Role::Admin, Role::Supervisor, Role::Usuario, Role::Zonal];
    const ALL_TARGETS: [Option<Role>; 5] = [
        Some(Role::Admin),
        Some(Role::Supervisor),
        Some(Role::Usuario),
        Some(Role::Zonal),
        None,
    ];

    fn deny(reason: DenyReason) -> Verdict {
        Verdict::Deny(reason)
    }

    // ── change_password ──────────────────────────────────────────────────

    #[test]
    fn password_self_target_is_always_forbidden() {
        for caller in ALL_ROLES {
            assert_eq!(
                change_password(Some(caller), Some(caller), true),
                deny(DenyReason::SelfTargetForbidden),
                "caller {caller}"
            );
        }
    }

    #[test]
    fn password_top_may_target_anyone_but_self() {
        for target in ALL_TARGETS {
            assert!(change_password(Some(Role::Admin), target, false).is_allow());
        }
    }

    #[test]
    fn password_mid_and_base_may_target_base_only() {
        for caller in [Role::Supervisor, Role::Usuario, Role::Zonal] {
            assert!(change_password(Some(caller), Some(Role::Usuario), false).is_allow());
            assert!(change_password(Some(caller), Some(Role::Zonal), false).is_allow());
            assert_eq!(
                change_password(Some(caller), Some(Role::Admin), false),
                deny(DenyReason::InsufficientRole)
            );
            assert_eq!(
                change_password(Some(caller), Some(Role::Supervisor), false),
                deny(DenyReason::InsufficientRole)
            );
            assert_eq!(
                change_password(Some(caller), None, false),
                deny(DenyReason::InsufficientRole)
            );
        }
    }

    #[test]
    fn password_unrecognized_caller_is_denied() {
        assert_eq!(
            change_password(None, Some(Role::Usuario), false),
            deny(DenyReason::InsufficientRole)
        );
    }

    // ── create_user ──────────────────────────────────────────────────────

    #[test]
    fn create_top_may_create_any_role() {
        for requested in ALL_ROLES {
            assert!(create_user(Some(Role::Admin), requested).is_allow());
        }
    }

    #[test]
    fn create_mid_may_create_mid_and_base() {
        assert!(create_user(Some(Role::Supervisor), Role::Supervisor).is_allow());
        assert!(create_user(Some(Role::Supervisor), Role::Usuario).is_allow());
        assert!(create_user(Some(Role::Supervisor), Role::Zonal).is_allow());
        // Concrete scenario: a supervisor asking for an admin account.
        assert_eq!(
            create_user(Some(Role::Supervisor), Role::Admin),
            deny(DenyReason::InsufficientRole)
        );
    }

    #[test]
    fn create_base_may_create_base_only() {
        for caller in [Role::Usuario, Role::Zonal] {
            assert!(create_user(Some(caller), Role::Usuario).is_allow());
            assert!(create_user(Some(caller), Role::Zonal).is_allow());
            assert!(!create_user(Some(caller), Role::Supervisor).is_allow());
            assert!(!create_user(Some(caller), Role::Admin).is_allow());
        }
    }

    #[test]
    fn create_unrecognized_caller_is_denied() {
        for requested in ALL_ROLES {
            assert_eq!(
                create_user(None, requested),
                deny(DenyReason::InsufficientRole)
            );
        }
    }

    // ── update_user ──────────────────────────────────────────────────────

    #[test]
    fn update_supervisor_may_move_base_between_base_roles() {
        // Concrete scenario: supervisor retags usuario -> zonal.
        assert!(update_user(Some(Role::Supervisor), Some(Role::Usuario), Role::Zonal).is_allow());
    }

    #[test]
    fn update_supervisor_may_not_touch_top_profiles() {
        // Concrete scenario: supervisor against an admin profile.
        assert_eq!(
            update_user(Some(Role::Supervisor), Some(Role::Admin), Role::Usuario),
            deny(DenyReason::InsufficientRole)
        );
    }

    #[test]
    fn update_supervisor_may_not_promote_into_top() {
        assert_eq!(
            update_user(Some(Role::Supervisor), Some(Role::Usuario), Role::Admin),
            deny(DenyReason::InsufficientRole)
        );
    }

    #[test]
    fn update_supervisor_may_edit_unrecognized_tags() {
        // Unknown tags rank below base; a mid caller may repair them.
        assert!(update_user(Some(Role::Supervisor), None, Role::Usuario).is_allow());
    }

    #[test]
    fn update_base_may_only_edit_base_peers_within_base() {
        for caller in [Role::Usuario, Role::Zonal] {
            assert!(update_user(Some(caller), Some(Role::Zonal), Role::Usuario).is_allow());
            assert!(!update_user(Some(caller), Some(Role::Supervisor), Role::Usuario).is_allow());
            assert!(!update_user(Some(caller), Some(Role::Usuario), Role::Supervisor).is_allow());
            // Unknown tags are not confirmed base-tier peers.
            assert!(!update_user(Some(caller), None, Role::Usuario).is_allow());
        }
    }

    #[test]
    fn update_top_is_always_allowed() {
        for existing in ALL_TARGETS {
            for requested in ALL_ROLES {
                assert!(update_user(Some(Role::Admin), existing, requested).is_allow());
            }
        }
    }

    // ── delete_user ──────────────────────────────────────────────────────

    #[test]
    fn delete_top_may_delete_anyone() {
        for target in ALL_TARGETS {
            assert!(delete_user(Some(Role::Admin), target).is_allow());
        }
    }

    #[test]
    fn delete_mid_may_not_delete_equals_or_superiors() {
        assert_eq!(
            delete_user(Some(Role::Supervisor), Some(Role::Admin)),
            deny(DenyReason::InsufficientRole)
        );
        assert_eq!(
            delete_user(Some(Role::Supervisor), Some(Role::Supervisor)),
            deny(DenyReason::InsufficientRole)
        );
        assert!(delete_user(Some(Role::Supervisor), Some(Role::Usuario)).is_allow());
        assert!(delete_user(Some(Role::Supervisor), Some(Role::Zonal)).is_allow());
        assert!(delete_user(Some(Role::Supervisor), None).is_allow());
    }

    #[test]
    fn delete_base_may_delete_base_only() {
        for caller in [Role::Usuario, Role::Zonal] {
            assert!(delete_user(Some(caller), Some(Role::Usuario)).is_allow());
            assert!(delete_user(Some(caller), Some(Role::Zonal)).is_allow());
            assert!(!delete_user(Some(caller), Some(Role::Supervisor)).is_allow());
            assert!(!delete_user(Some(caller), Some(Role::Admin)).is_allow());
            assert!(!delete_user(Some(caller), None).is_allow());
        }
    }

    // ── batch ────────────────────────────────────────────────────────────

    #[test]
    fn batch_denies_when_any_target_fails() {
        let targets = [Some(Role::Usuario), Some(Role::Admin)];
        assert_eq!(
            delete_users(Some(Role::Supervisor), &targets),
            deny(DenyReason::InsufficientRole)
        );
    }

    #[test]
    fn batch_allows_when_every_target_passes() {
        let targets = [Some(Role::Usuario), Some(Role::Zonal), None];
        assert!(delete_users(Some(Role::Supervisor), &targets).is_allow());
    }

    #[test]
    fn batch_of_nothing_is_allowed() {
        // Emptiness is rejected at the API boundary, not here.
        assert!(delete_users(Some(Role::Usuario), &[]).is_allow());
    }

    // ── cross-cutting properties ─────────────────────────────────────────

    /// Ranks ordered most- to least-privileged, as (rank, role) pairs. The
    /// two base roles are interchangeable for privilege purposes; one
    /// representative suffices.
    const RANKED: [Role; 3] = [Role::Admin, Role::Supervisor, Role::Usuario];

    #[test]
    fn privilege_is_monotonic_in_rank() {
        // Anything a lower rank may do, every higher rank may do as well
        // (self-targeting excluded: that denial is rank-independent).
        for (i, caller) in RANKED.iter().enumerate() {
            for stronger in &RANKED[..i] {
                for target in ALL_TARGETS {
                    if change_password(Some(*caller), target, false).is_allow() {
                        assert!(change_password(Some(*stronger), target, false).is_allow());
                    }
                    if delete_user(Some(*caller), target).is_allow() {
                        assert!(delete_user(Some(*stronger), target).is_allow());
                    }
                    for requested in ALL_ROLES {
                        if update_user(Some(*caller), target, requested).is_allow() {
                            assert!(update_user(Some(*stronger), target, requested).is_allow());
                        }
                    }
                }
                for requested in ALL_ROLES {
                    if create_user(Some(*caller), requested).is_allow() {
                        assert!(create_user(Some(*stronger), requested).is_allow());
                    }
                }
            }
        }
    }

    #[test]
    fn evaluation_is_deterministic() {
        for caller in ALL_TARGETS {
            for target in ALL_TARGETS {
                for self_target in [false, true] {
                    assert_eq!(
                        change_password(caller, target, self_target),
                        change_password(caller, target, self_target)
                    );
                }
                assert_eq!(delete_user(caller, target), delete_user(caller, target));
                for requested in ALL_ROLES {
                    assert_eq!(
                        update_user(caller, target, requested),
                        update_user(caller, target, requested)
                    );
                    assert_eq!(create_user(caller, requested), create_user(caller, requested));
                }
            }
        }
    }
}
