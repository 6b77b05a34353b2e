//! User domain types.

use chrono::{DateTime, Utc};
use store_ratings_core::{Email, Role, UserId};

use super::contains_ci;

/// A registered account (domain type).
///
/// The password digest is deliberately not part of this type; it is only
/// fetched by the operations that need it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email, unique across users.
    pub email: Email,
    /// Postal address, possibly empty.
    pub address: String,
    /// Role, fixed at creation.
    pub role: Role,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A validated user ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub address: String,
    pub role: Role,
    pub password_hash: String,
}

/// Filters for the admin user listing.
///
/// Text fields are case-insensitive substring matches, `role` is exact.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub role: Option<Role>,
}

impl UserFilter {
    /// Whether `user` passes every filter that is set.
    #[must_use]
    pub fn matches(&self, user: &User) -> bool {
        contains_ci(&user.name, self.name.as_deref())
            && contains_ci(user.email.as_str(), self.email.as_deref())
            && contains_ci(&user.address, self.address.as_deref())
            && self.role.is_none_or(|role| role == user.role)
    }
}
