//! `ratings.rating` queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use store_ratings_core::{Email, RatingId, RatingValue, StoreId, UserId};

use super::{PgRepository, corrupt, count};
use crate::db::{RatingLedger, RepositoryError};
use crate::models::{RaterEntry, Rating, UpsertedRating};

const RATING_COLUMNS: &str = "id, store_id, user_id, value, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct RatingRow {
    id: i32,
    store_id: i32,
    user_id: i32,
    value: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    rating: RatingRow,
    inserted: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct RaterRow {
    store_id: i32,
    user_id: i32,
    name: String,
    email: String,
    value: i16,
}

fn rating_value(raw: i16) -> Result<RatingValue, RepositoryError> {
    RatingValue::new(i64::from(raw)).map_err(|e| corrupt("rating", e))
}

impl TryFrom<RatingRow> for Rating {
    type Error = RepositoryError;

    fn try_from(row: RatingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RatingId::new(row.id),
            store_id: StoreId::new(row.store_id),
            user_id: UserId::new(row.user_id),
            value: rating_value(row.value)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<RaterRow> for RaterEntry {
    type Error = RepositoryError;

    fn try_from(row: RaterRow) -> Result<Self, Self::Error> {
        Ok(Self {
            store_id: StoreId::new(row.store_id),
            user_id: UserId::new(row.user_id),
            name: row.name,
            email: Email::parse(&row.email).map_err(|e| corrupt("email", e))?,
            value: rating_value(row.value)?,
        })
    }
}

fn into_ratings(rows: Vec<RatingRow>) -> Result<Vec<Rating>, RepositoryError> {
    rows.into_iter().map(Rating::try_from).collect()
}

fn raw_ids(stores: &[StoreId]) -> Vec<i32> {
    stores.iter().map(StoreId::as_i32).collect()
}

#[async_trait]
impl RatingLedger for PgRepository {
    async fn upsert_rating(
        &self,
        store: StoreId,
        user: UserId,
        value: RatingValue,
    ) -> Result<UpsertedRating, RepositoryError> {
        // xmax is 0 only for a freshly inserted tuple
        let row = sqlx::query_as::<_, UpsertRow>(&format!(
            r"
            INSERT INTO ratings.rating (store_id, user_id, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (store_id, user_id)
            DO UPDATE SET value = EXCLUDED.value, updated_at = now()
            RETURNING {RATING_COLUMNS}, (xmax = 0) AS inserted
            "
        ))
        .bind(store)
        .bind(user)
        .bind(value)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        Ok(UpsertedRating {
            rating: row.rating.try_into()?,
            inserted: row.inserted,
        })
    }

    async fn ratings_for_store(&self, store: StoreId) -> Result<Vec<Rating>, RepositoryError> {
        let rows = sqlx::query_as::<_, RatingRow>(&format!(
            "SELECT {RATING_COLUMNS} FROM ratings.rating WHERE store_id = $1"
        ))
        .bind(store)
        .fetch_all(self.pool())
        .await?;

        into_ratings(rows)
    }

    async fn ratings_for_stores(
        &self,
        stores: &[StoreId],
    ) -> Result<Vec<Rating>, RepositoryError> {
        let rows = sqlx::query_as::<_, RatingRow>(&format!(
            "SELECT {RATING_COLUMNS} FROM ratings.rating WHERE store_id = ANY($1)"
        ))
        .bind(raw_ids(stores))
        .fetch_all(self.pool())
        .await?;

        into_ratings(rows)
    }

    async fn my_rating(
        &self,
        store: StoreId,
        user: UserId,
    ) -> Result<Option<Rating>, RepositoryError> {
        sqlx::query_as::<_, RatingRow>(&format!(
            "SELECT {RATING_COLUMNS} FROM ratings.rating WHERE store_id = $1 AND user_id = $2"
        ))
        .bind(store)
        .bind(user)
        .fetch_optional(self.pool())
        .await?
        .map(Rating::try_from)
        .transpose()
    }

    async fn raters_for_stores(
        &self,
        stores: &[StoreId],
    ) -> Result<Vec<RaterEntry>, RepositoryError> {
        sqlx::query_as::<_, RaterRow>(
            r"
            SELECT r.store_id, r.user_id, u.name, u.email, r.value
            FROM ratings.rating r
            JOIN ratings.user u ON u.id = r.user_id
            WHERE r.store_id = ANY($1)
            ORDER BY r.store_id, r.id
            ",
        )
        .bind(raw_ids(stores))
        .fetch_all(self.pool())
        .await?
        .into_iter()
        .map(RaterEntry::try_from)
        .collect()
    }

    async fn count_ratings(&self) -> Result<u64, RepositoryError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ratings.rating")
            .fetch_one(self.pool())
            .await?;
        count(n)
    }
}
