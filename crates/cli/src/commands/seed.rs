//! Seed the database with users, stores and ratings from a YAML file.
//!
//! Users are matched by email and stores by exact name, so running the same
//! file twice leaves one copy of everything. Ratings are upserts.
//!
//! ```yaml
//! users:
//!   - name: Corner Bakery Owner
//!     email: owner@example.com
//!     password: bakery-owner-pass
//!     role: storeOwner
//! stores:
//!   - name: Corner Bakery
//!     address: 1 Main St
//!     owner: owner@example.com
//! ratings:
//!   - store: Corner Bakery
//!     user: owner@example.com
//!     rating: 5
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use store_ratings_core::{Email, RatingValue, Role, StoreId, UserId};
use store_ratings_server::db::{PgRepository, Repository, RepositoryError};
use store_ratings_server::models::{NewStore, StoreFilter};
use store_ratings_server::services::auth::{AuthError, AuthService, Registration};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("invalid seed file: {0}")]
    Invalid(String),

    #[error("user {email}: {source}")]
    User {
        email: String,
        #[source]
        source: AuthError,
    },

    #[error("storage error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    pub users: Vec<SeedUser>,
    pub stores: Vec<SeedStore>,
    pub ratings: Vec<SeedRating>,
}

#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct SeedStore {
    pub name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Owner's email. The owner must be a `storeOwner`.
    pub owner: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedRating {
    /// Store name.
    pub store: String,
    /// Rater's email.
    pub user: String,
    pub rating: i64,
}

/// What a seed run did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: usize,
    pub users_existing: usize,
    pub stores_created: usize,
    pub stores_existing: usize,
    pub ratings_written: usize,
}

impl SeedFile {
    /// Check cross references before anything is written.
    ///
    /// Returns every problem found, not just the first.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let users: HashMap<&str, Role> = self
            .users
            .iter()
            .map(|u| (u.email.as_str(), u.role))
            .collect();
        let stores: HashSet<&str> = self.stores.iter().map(|s| s.name.as_str()).collect();

        for user in &self.users {
            if Email::parse(&user.email).is_err() {
                errors.push(format!("user '{}' has an invalid email", user.email));
            }
        }

        for store in &self.stores {
            if let Some(owner) = &store.owner {
                match users.get(owner.as_str()) {
                    None => errors.push(format!(
                        "store '{}' names unknown owner '{owner}'",
                        store.name
                    )),
                    Some(role) if *role != Role::StoreOwner => errors.push(format!(
                        "store '{}' owner '{owner}' is a '{role}', not a storeOwner",
                        store.name
                    )),
                    Some(_) => {}
                }
            }
        }

        for rating in &self.ratings {
            if !stores.contains(rating.store.as_str()) {
                errors.push(format!("rating names unknown store '{}'", rating.store));
            }
            if !users.contains_key(rating.user.as_str()) {
                errors.push(format!("rating names unknown user '{}'", rating.user));
            }
            if let Err(e) = RatingValue::new(rating.rating) {
                errors.push(format!(
                    "rating of '{}' by '{}': {e}",
                    rating.store, rating.user
                ));
            }
        }

        errors
    }
}

/// Seed from a YAML file into the database named by the environment.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, or if any write fails.
pub async fn from_file(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    tracing::info!(path = %file_path, "Loading seed data from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let repo = PgRepository::new(super::connect().await?);
    let report = apply(&repo, &seed).await?;

    tracing::info!("Seeding complete!");
    tracing::info!(
        "  Users: {} created, {} already present",
        report.users_created,
        report.users_existing
    );
    tracing::info!(
        "  Stores: {} created, {} already present",
        report.stores_created,
        report.stores_existing
    );
    tracing::info!("  Ratings written: {}", report.ratings_written);

    Ok(())
}

/// Write a validated seed into any repository.
///
/// # Errors
///
/// Returns `SeedError::Invalid` listing every validation problem, or the
/// first storage error.
pub async fn apply(repo: &dyn Repository, seed: &SeedFile) -> Result<SeedReport, SeedError> {
    let errors = seed.validate();
    if !errors.is_empty() {
        for err in &errors {
            tracing::error!("  - {err}");
        }
        return Err(SeedError::Invalid(format!(
            "{} validation errors found",
            errors.len()
        )));
    }

    let mut report = SeedReport::default();
    let auth = AuthService::new(repo);
    let mut users: HashMap<&str, UserId> = HashMap::new();

    for user in &seed.users {
        let registration = Registration {
            name: user.name.clone(),
            email: user.email.clone(),
            password: user.password.clone(),
            address: user.address.clone(),
            role: user.role,
        };
        let id = match auth.register(registration).await {
            Ok(created) => {
                report.users_created += 1;
                created.id
            }
            Err(AuthError::UserAlreadyExists) => {
                report.users_existing += 1;
                existing_user(repo, &user.email).await?
            }
            Err(source) => {
                return Err(SeedError::User {
                    email: user.email.clone(),
                    source,
                });
            }
        };
        users.insert(user.email.as_str(), id);
    }

    let mut stores: HashMap<&str, StoreId> = HashMap::new();
    for store in &seed.stores {
        let filter = StoreFilter::by_name(Some(store.name.clone()));
        let existing = repo
            .list_stores(&filter)
            .await?
            .into_iter()
            .find(|s| s.name == store.name);

        let id = if let Some(existing) = existing {
            report.stores_existing += 1;
            existing.id
        } else {
            let email = store
                .email
                .as_deref()
                .map(Email::parse)
                .transpose()
                .map_err(|e| SeedError::Invalid(format!("store '{}': {e}", store.name)))?;
            let created = repo
                .create_store(&NewStore {
                    name: store.name.clone(),
                    email,
                    address: store.address.clone(),
                    owner_id: store
                        .owner
                        .as_deref()
                        .and_then(|owner| users.get(owner).copied()),
                })
                .await?;
            report.stores_created += 1;
            created.id
        };
        stores.insert(store.name.as_str(), id);
    }

    for rating in &seed.ratings {
        let (Some(store), Some(user)) = (
            stores.get(rating.store.as_str()),
            users.get(rating.user.as_str()),
        ) else {
            continue;
        };
        let value = RatingValue::new(rating.rating)
            .map_err(|e| SeedError::Invalid(e.to_string()))?;
        repo.upsert_rating(*store, *user, value).await?;
        report.ratings_written += 1;
    }

    Ok(report)
}

async fn existing_user(repo: &dyn Repository, email: &str) -> Result<UserId, SeedError> {
    let email = Email::parse(email).map_err(|e| SeedError::Invalid(e.to_string()))?;
    repo.get_user_with_password(&email)
        .await?
        .map(|(user, _)| user.id)
        .ok_or(SeedError::Repository(RepositoryError::NotFound))
}
