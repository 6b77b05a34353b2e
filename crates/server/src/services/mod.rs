//! Business logic services.
//!
//! # Services
//!
//! - `auth` - registration, login, password changes, profiles
//! - `tokens` - access and refresh token minting and verification
//! - `ratings` - the public store listing and the rating ledger
//! - `stores` - store creation and owner-scoped edits
//! - `dashboards` - owner and admin aggregates and listings
//!
//! Every service takes the caller as an explicit [`Actor`] and checks its
//! role before touching storage.
//!
//! [`Actor`]: store_ratings_core::Actor

pub mod auth;
pub mod dashboards;
pub mod ratings;
pub mod stores;
pub mod tokens;

use thiserror::Error;

use store_ratings_core::AccessDenied;

use crate::db::RepositoryError;

/// Errors from the rating, store and dashboard services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad input from the client.
    #[error("{0}")]
    Validation(String),

    /// The entity doesn't exist, or isn't visible to the caller.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The caller is anonymous or lacks the role.
    #[error(transparent)]
    Access(#[from] AccessDenied),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
