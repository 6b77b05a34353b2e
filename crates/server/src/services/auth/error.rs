//! Authentication error types.

use thiserror::Error;

use store_ratings_core::{AccessDenied, EmailError};

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Unknown email or wrong password at login.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The current password given for a password change is wrong.
    #[error("old password is incorrect")]
    IncorrectPassword,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// A field failed validation (missing, too short, too long, bad role).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The caller may not act on this account.
    #[error(transparent)]
    Access(#[from] AccessDenied),

    /// Only the account holder may do this.
    #[error("cannot act on another user's account")]
    NotOwnAccount,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
