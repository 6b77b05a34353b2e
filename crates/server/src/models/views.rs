//! JSON views returned by the API.
//!
//! Every view uses camelCase field names. None of them carries a password
//! digest.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use store_ratings_core::{Email, RatingValue, Role, StoreId, UserId};

use super::{RaterEntry, Rating, Store, User};

/// A user as shown to themselves or to an admin.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub address: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            address: user.address,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Who owns a store.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: UserId,
    pub name: String,
    pub email: Email,
}

impl From<&User> for OwnerSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Plain store attributes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreView {
    pub id: StoreId,
    pub name: String,
    pub email: Option<Email>,
    pub address: Option<String>,
    pub owner_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl From<Store> for StoreView {
    fn from(store: Store) -> Self {
        Self {
            id: store.id,
            name: store.name,
            email: store.email,
            address: store.address,
            owner_id: store.owner_id,
            created_at: store.created_at,
        }
    }
}

/// One row of the public store listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreListing {
    #[serde(flatten)]
    pub store: StoreView,
    pub owner: Option<OwnerSummary>,
    /// Unrounded mean of every rating of the store, 0 when unrated.
    pub average_rating: f64,
    pub total_ratings: usize,
    /// The caller's own rating; `null` when anonymous or not yet rated.
    pub my_rating: Option<RatingValue>,
}

/// Response to rating a store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateStoreResponse {
    pub message: &'static str,
    pub average_rating: f64,
    pub my_rating: RatingValue,
}

/// A raw rating row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingView {
    pub id: store_ratings_core::RatingId,
    pub store_id: StoreId,
    pub user_id: UserId,
    pub rating: RatingValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Rating> for RatingView {
    fn from(rating: Rating) -> Self {
        Self {
            id: rating.id,
            store_id: rating.store_id,
            user_id: rating.user_id,
            rating: rating.value,
            created_at: rating.created_at,
            updated_at: rating.updated_at,
        }
    }
}

/// Average of one store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreAverage {
    pub store_id: StoreId,
    pub average_rating: f64,
    pub total_ratings: usize,
}

/// A rating on one of the caller's stores, with who gave it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaterView {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub store_id: StoreId,
    pub rating: RatingValue,
}

impl From<RaterEntry> for RaterView {
    fn from(entry: RaterEntry) -> Self {
        Self {
            id: entry.user_id,
            name: entry.name,
            email: entry.email,
            store_id: entry.store_id,
            rating: entry.value,
        }
    }
}

/// A store owner's view over every store they own.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerDashboard {
    pub total_stores: usize,
    pub total_ratings: usize,
    /// Pooled over every rating of every owned store.
    pub avg_rating: f64,
    pub raters: Vec<RaterView>,
}

/// Platform-wide counts.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub total_users: u64,
    pub total_stores: u64,
    pub total_ratings: u64,
}

/// The first store of a store owner, as shown in the admin user listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedStoreSummary {
    pub id: StoreId,
    pub name: String,
    pub address: Option<String>,
    pub average_rating: Decimal,
}

/// One row of the admin user listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserRow {
    #[serde(flatten)]
    pub user: UserView,
    /// Present only for store owners who own at least one store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<OwnedStoreSummary>,
}

/// One row of the admin store listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStoreRow {
    #[serde(flatten)]
    pub store: StoreView,
    pub owner: Option<OwnerSummary>,
    /// Rounded to two decimal places.
    pub average_rating: Decimal,
    pub total_ratings: usize,
}
