//! Role model: a closed enum with a total privilege order.
//!
//! Roles arrive as free-form strings from the profile store (`tipo` field).
//! Normalization (trim + lowercase + synonym fold) happens exactly once, in
//! [`Role::parse`]; everything downstream works with the enum. Strings that
//! do not parse rank *below* base tier: they satisfy no positive check.

use serde::{Deserialize, Serialize};

/// A recognized account role.
///
/// `admin` and `administrador` are synonyms for the top role; `usuario` and
/// `zonal` are distinct tags on the same (lowest) privilege tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "administrador")]
    Admin,
    Supervisor,
    Usuario,
    Zonal,
}

/// Privilege tier. Ordering follows privilege: `Top < Mid < Base` in the
/// derived `Ord` means a *smaller* tier is *more* privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Top,
    Mid,
    Base,
}

impl Role {
    /// Normalize and parse a raw role tag.
    ///
    /// Trims whitespace, lowercases, and folds `administrador` into
    /// [`Role::Admin`]. Unknown or empty tags yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "admin" | "administrador" => Some(Role::Admin),
            "supervisor" => Some(Role::Supervisor),
            "usuario" => Some(Role::Usuario),
            "zonal" => Some(Role::Zonal),
            _ => None,
        }
    }

    /// Canonical stored tag for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Supervisor => "supervisor",
            Role::Usuario => "usuario",
            Role::Zonal => "zonal",
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            Role::Admin => Tier::Top,
            Role::Supervisor => Tier::Mid,
            Role::Usuario | Role::Zonal => Tier::Base,
        }
    }

    /// Numeric rank: 0 = most privileged (top), 2 = least (base).
    pub fn rank(&self) -> u8 {
        match self.tier() {
            Tier::Top => 0,
            Tier::Mid => 1,
            Tier::Base => 2,
        }
    }

    pub fn is_top(&self) -> bool {
        self.tier() == Tier::Top
    }

    pub fn is_mid(&self) -> bool {
        self.tier() == Tier::Mid
    }

    pub fn is_base(&self) -> bool {
        self.tier() == Tier::Base
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
