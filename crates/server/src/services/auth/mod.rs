//! Authentication service.
//!
//! Registration, password login, password changes and profile reads. Token
//! issuance lives in [`crate::services::tokens`]; this service only decides
//! who someone is.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use store_ratings_core::{Actor, Email, Role, UserId};

use crate::db::{Repository, RepositoryError};
use crate::models::{NewUser, User};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;
/// Maximum name length, in characters.
pub const MAX_NAME_LENGTH: usize = 60;
/// Maximum address length, in characters.
pub const MAX_ADDRESS_LENGTH: usize = 400;

/// Unvalidated registration fields, as they arrive from a client.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: String,
    pub role: Role,
}

/// Authentication service.
pub struct AuthService<'a> {
    repo: &'a dyn Repository,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(repo: &'a dyn Repository) -> Self {
        Self { repo }
    }

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` or `AuthError::InvalidEmail` for bad
    /// input and `AuthError::UserAlreadyExists` if the email is taken.
    pub async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        let email = Email::parse(registration.email.trim())?;
        let name = validate_name(&registration.name)?;
        validate_address(&registration.address)?;
        validate_password(&registration.password)?;

        let password_hash = hash_password(&registration.password)?;

        let user = self
            .repo
            .create_user(&NewUser {
                name,
                email,
                address: registration.address,
                role: registration.role,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Register a user on behalf of an admin.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Access` unless `actor` is an admin, otherwise the
    /// same errors as [`AuthService::register`].
    pub async fn create_user(
        &self,
        actor: &Actor,
        registration: Registration,
    ) -> Result<User, AuthError> {
        let admin = actor.require_role(Role::Admin)?;
        let user = self.register(registration).await?;
        tracing::info!(admin_id = %admin.id, user_id = %user.id, "Admin created user");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email.trim()).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .repo
            .get_user_with_password(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash).map_err(|_| AuthError::InvalidCredentials)?;

        Ok(user)
    }

    /// Get a user's profile.
    ///
    /// Users may read their own profile; admins may read any.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Access` for other callers and
    /// `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn profile(&self, actor: &Actor, id: UserId) -> Result<User, AuthError> {
        let caller = actor.require_authenticated()?;
        if caller.id != id {
            actor.require_role(Role::Admin)?;
        }

        self.repo
            .get_user(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Change the caller's own password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotOwnAccount` if `id` is not the caller,
    /// `AuthError::IncorrectPassword` if `old_password` doesn't match and
    /// `AuthError::Validation` if the new password is too short.
    pub async fn change_password(
        &self,
        actor: &Actor,
        id: UserId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let caller = actor.require_authenticated()?;
        if caller.id != id {
            return Err(AuthError::NotOwnAccount);
        }
        if old_password.is_empty() || new_password.is_empty() {
            return Err(AuthError::Validation("All fields are required".to_owned()));
        }

        let current = self
            .repo
            .get_password_hash(id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        verify_password(old_password, &current).map_err(|_| AuthError::IncorrectPassword)?;

        validate_password(new_password)?;
        let password_hash = hash_password(new_password)?;
        self.repo.update_password(id, &password_hash).await?;

        tracing::info!(user_id = %id, "Password changed");
        Ok(())
    }
}

/// Trim and check a display name.
fn validate_name(name: &str) -> Result<String, AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::Validation("name is required".to_owned()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AuthError::Validation(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_owned())
}

/// Check an address.
pub(crate) fn validate_address(address: &str) -> Result<(), AuthError> {
    if address.chars().count() > MAX_ADDRESS_LENGTH {
        return Err(AuthError::Validation(format!(
            "address must be at most {MAX_ADDRESS_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
