//! List visibility: which profiles a caller may see.
//!
//! Mirrors the ListUsers tier table exactly; both are tested against the
//! same fixtures so the read path and the permission path cannot drift.

use crate::profile::Profile;
use crate::role::{Role, Tier};

/// May a caller with `caller` role see a profile whose role is `target`?
///
/// `target` is `None` for unrecognized stored tags; only the top role sees
/// those (it sees everything).
pub fn visible_to(caller: Option<Role>, target: Option<Role>) -> bool {
    let Some(caller) = caller else {
        return false;
    };

    match caller.tier() {
        Tier::Top => true,
        Tier::Mid => target.is_some_and(|r| r.is_mid() || r.is_base()),
        Tier::Base => target.is_some_and(|r| r.is_base()),
    }
}

/// Filter a full profile list down to what the caller may see.
///
/// The result is always a subset of the input; for a top-role caller it is
/// the input itself.
pub fn filter_profiles(caller: Option<Role>, profiles: Vec<Profile>) -> Vec<Profile> {
    profiles
        .into_iter()
        .filter(|p| visible_to(caller, p.role()))
        .collect()
}
