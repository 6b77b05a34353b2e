//! User roles.

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a [`Role`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("role must be one of 'user', 'admin' or 'storeOwner' (got '{0}')")]
pub struct RoleError(pub String);

/// The role of a registered user.
///
/// This is a closed set with exactly one spelling per role: `"admin"`,
/// `"user"` and `"storeOwner"`, both on the wire and in the `role` column
/// (which carries a matching CHECK constraint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    /// Platform-wide read/write over users and stores.
    Admin,
    /// Browses stores and rates them.
    #[default]
    User,
    /// Read-only dashboard over the stores they own.
    StoreOwner,
}

impl Role {
    /// The wire spelling of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::StoreOwner => "storeOwner",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            "storeOwner" => Ok(Self::StoreOwner),
            _ => Err(RoleError(s.to_owned())),
        }
    }
}
