//! Caller identity.
//!
//! Every request resolves to exactly one [`Actor`]. Views that depend on who is
//! asking take the actor as an explicit argument and gate themselves with
//! [`Actor::require_role`].

use serde::{Deserialize, Serialize};

use super::{Role, UserId};

/// An authenticated caller: a user id and the role read from the user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// The caller's user id.
    pub id: UserId,
    /// The caller's role.
    pub role: Role,
}

impl Principal {
    /// Create a principal.
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }
}

/// Who is making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Actor {
    /// No token, or a token that could not be verified.
    #[default]
    Anonymous,
    /// A verified caller.
    Authenticated(Principal),
}

/// Why an [`Actor`] was refused.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    /// The caller is anonymous.
    #[error("authentication required")]
    Unauthenticated,
    /// The caller is authenticated but lacks the required role.
    #[error("requires role '{required}'")]
    Forbidden {
        /// The role the operation needs.
        required: Role,
    },
}

impl Actor {
    /// The principal, if the caller is authenticated.
    #[must_use]
    pub const fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(principal) => Some(principal),
        }
    }

    /// Whether the caller is authenticated with exactly `required`.
    #[must_use]
    pub fn has_role(&self, required: Role) -> bool {
        self.principal().is_some_and(|p| p.role == required)
    }

    /// Require any authenticated caller.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied::Unauthenticated` for anonymous callers.
    pub const fn require_authenticated(&self) -> Result<&Principal, AccessDenied> {
        match self {
            Self::Anonymous => Err(AccessDenied::Unauthenticated),
            Self::Authenticated(principal) => Ok(principal),
        }
    }

    /// Require an authenticated caller holding `required`.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied::Unauthenticated` for anonymous callers and
    /// `AccessDenied::Forbidden` for callers with a different role.
    pub fn require_role(&self, required: Role) -> Result<&Principal, AccessDenied> {
        let principal = self.require_authenticated()?;
        if principal.role == required {
            Ok(principal)
        } else {
            Err(AccessDenied::Forbidden { required })
        }
    }
}

impl From<Principal> for Actor {
    fn from(principal: Principal) -> Self {
        Self::Authenticated(principal)
    }
}

impl From<Option<Principal>> for Actor {
    fn from(principal: Option<Principal>) -> Self {
        principal.map_or(Self::Anonymous, Self::Authenticated)
    }
}
