//! `ratings.store` queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use store_ratings_core::{Email, StoreId, UserId};

use super::{PgRepository, corrupt, count, filter_value};
use crate::db::{RepositoryError, StoreRepository};
use crate::models::{NewStore, Store, StoreFilter, StoreUpdate};

const STORE_COLUMNS: &str = "id, name, email, address, owner_id, created_at";

#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: i32,
    name: String,
    email: Option<String>,
    address: Option<String>,
    owner_id: Option<i32>,
    created_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| corrupt("store email", e))?;

        Ok(Self {
            id: StoreId::new(row.id),
            name: row.name,
            email,
            address: row.address,
            owner_id: row.owner_id.map(UserId::new),
            created_at: row.created_at,
        })
    }
}

fn into_stores(rows: Vec<StoreRow>) -> Result<Vec<Store>, RepositoryError> {
    rows.into_iter().map(Store::try_from).collect()
}

#[async_trait]
impl StoreRepository for PgRepository {
    async fn create_store(&self, store: &NewStore) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            INSERT INTO ratings.store (name, email, address, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {STORE_COLUMNS}
            "
        ))
        .bind(&store.name)
        .bind(store.email.as_ref())
        .bind(store.address.as_deref())
        .bind(store.owner_id)
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

        row.try_into()
    }

    async fn get_store(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM ratings.store WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        .map(Store::try_from)
        .transpose()
    }

    async fn list_stores(&self, filter: &StoreFilter) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            SELECT {STORE_COLUMNS}
            FROM ratings.store
            WHERE ($1::text IS NULL OR strpos(lower(name), lower($1)) > 0)
              AND ($2::text IS NULL OR strpos(lower(email), lower($2)) > 0)
              AND ($3::text IS NULL OR strpos(lower(address), lower($3)) > 0)
            ORDER BY id
            "
        ))
        .bind(filter_value(filter.name.as_ref()))
        .bind(filter_value(filter.email.as_ref()))
        .bind(filter_value(filter.address.as_ref()))
        .fetch_all(self.pool())
        .await?;

        into_stores(rows)
    }

    async fn stores_owned_by(&self, owner: UserId) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM ratings.store WHERE owner_id = $1 ORDER BY id"
        ))
        .bind(owner)
        .fetch_all(self.pool())
        .await?;

        into_stores(rows)
    }

    async fn update_owned_store(
        &self,
        id: StoreId,
        owner: UserId,
        update: &StoreUpdate,
    ) -> Result<Option<Store>, RepositoryError> {
        sqlx::query_as::<_, StoreRow>(&format!(
            r"
            UPDATE ratings.store
            SET name = COALESCE($3, name),
                email = COALESCE($4, email),
                address = COALESCE($5, address)
            WHERE id = $1 AND owner_id = $2
            RETURNING {STORE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(owner)
        .bind(update.name.as_deref())
        .bind(update.email.as_ref())
        .bind(update.address.as_deref())
        .fetch_optional(self.pool())
        .await?
        .map(Store::try_from)
        .transpose()
    }

    async fn delete_owned_store(
        &self,
        id: StoreId,
        owner: UserId,
    ) -> Result<bool, RepositoryError> {
        // Ratings go with the store via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM ratings.store WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_stores(&self) -> Result<u64, RepositoryError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ratings.store")
            .fetch_one(self.pool())
            .await?;
        count(n)
    }
}
