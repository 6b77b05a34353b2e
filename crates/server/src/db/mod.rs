//! Storage for users, stores and ratings.
//!
//! # Backends
//!
//! - [`postgres::PgRepository`] - the production backend (`ratings` schema)
//! - [`memory::MemoryRepository`] - an in-process backend for tests and local runs
//!
//! Both implement the same three traits, one per registry, and the combined
//! [`Repository`] trait that the rest of the server depends on.
//!
//! ## Tables
//!
//! - `ratings.user` - accounts, with a unique email and an argon2 digest
//! - `ratings.store` - stores with an optional owning user
//! - `ratings.rating` - one row per (store, user), enforced by a unique constraint
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p store-ratings-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use store_ratings_core::{Email, RatingValue, StoreId, UserId};

use crate::models::{
    NewStore, NewUser, RaterEntry, Rating, Store, StoreFilter, StoreUpdate, UpsertedRating, User,
    UserFilter,
};

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The backend is unusable (e.g., a poisoned in-memory lock).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError>;

    /// Get a user by ID.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Get several users by ID. Unknown IDs are skipped.
    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError>;

    /// Get a user and their password digest by exact email match.
    async fn get_user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Get a user's password digest.
    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError>;

    /// Replace a user's password digest.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    async fn update_password(&self, id: UserId, password_hash: &str)
    -> Result<(), RepositoryError>;

    /// List users matching a filter, ordered by ID.
    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError>;

    /// Total number of users.
    async fn count_users(&self) -> Result<u64, RepositoryError>;
}

/// Stores.
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Insert a store. Names are not unique.
    async fn create_store(&self, store: &NewStore) -> Result<Store, RepositoryError>;

    /// Get a store by ID.
    async fn get_store(&self, id: StoreId) -> Result<Option<Store>, RepositoryError>;

    /// List stores matching a filter, ordered by ID.
    async fn list_stores(&self, filter: &StoreFilter) -> Result<Vec<Store>, RepositoryError>;

    /// All stores owned by a user, ordered by ID.
    async fn stores_owned_by(&self, owner: UserId) -> Result<Vec<Store>, RepositoryError>;

    /// Update a store only if `owner` owns it.
    ///
    /// Returns `None` when no store matches `(id, owner)` jointly.
    async fn update_owned_store(
        &self,
        id: StoreId,
        owner: UserId,
        update: &StoreUpdate,
    ) -> Result<Option<Store>, RepositoryError>;

    /// Delete a store (and its ratings) only if `owner` owns it.
    ///
    /// Returns `false` when no store matches `(id, owner)` jointly.
    async fn delete_owned_store(&self, id: StoreId, owner: UserId)
    -> Result<bool, RepositoryError>;

    /// Total number of stores.
    async fn count_stores(&self) -> Result<u64, RepositoryError>;
}

/// The rating ledger: at most one rating per (store, user).
#[async_trait]
pub trait RatingLedger: Send + Sync {
    /// Insert or overwrite the caller's rating of a store in one atomic step.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store or user doesn't exist.
    async fn upsert_rating(
        &self,
        store: StoreId,
        user: UserId,
        value: RatingValue,
    ) -> Result<UpsertedRating, RepositoryError>;

    /// Every rating of a store, in no particular order.
    async fn ratings_for_store(&self, store: StoreId) -> Result<Vec<Rating>, RepositoryError>;

    /// Every rating of every listed store, pooled into one sequence.
    async fn ratings_for_stores(&self, stores: &[StoreId])
    -> Result<Vec<Rating>, RepositoryError>;

    /// The rating a user gave a store, if any.
    async fn my_rating(
        &self,
        store: StoreId,
        user: UserId,
    ) -> Result<Option<Rating>, RepositoryError>;

    /// Every rating of every listed store joined with the rater's name and email.
    async fn raters_for_stores(
        &self,
        stores: &[StoreId],
    ) -> Result<Vec<RaterEntry>, RepositoryError>;

    /// Total number of ratings.
    async fn count_ratings(&self) -> Result<u64, RepositoryError>;
}

/// Everything the server needs from storage.
#[async_trait]
pub trait Repository: UserRepository + StoreRepository + RatingLedger {
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
