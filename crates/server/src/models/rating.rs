//! Rating ledger types.

use chrono::{DateTime, Utc};

use store_ratings_core::{Email, RatingId, RatingValue, StoreId, UserId};

/// One user's rating of one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rating {
    pub id: RatingId,
    pub store_id: StoreId,
    pub user_id: UserId,
    pub value: RatingValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of an upsert: the stored row and whether it was newly created.
#[derive(Debug, Clone)]
pub struct UpsertedRating {
    pub rating: Rating,
    pub inserted: bool,
}

/// A rating joined with the user who gave it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaterEntry {
    pub store_id: StoreId,
    pub user_id: UserId,
    pub name: String,
    pub email: Email,
    pub value: RatingValue,
}
