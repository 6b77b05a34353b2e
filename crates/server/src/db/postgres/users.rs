//! `ratings.user` queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use store_ratings_core::{Email, UserId};

use super::{PgRepository, corrupt, count, filter_value};
use crate::db::{RepositoryError, UserRepository};
use crate::models::{NewUser, User, UserFilter};

const USER_COLUMNS: &str = "id, name, email, address, role, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    address: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| corrupt("email", e))?;
        let role = row.role.parse().map_err(|e| corrupt("role", e))?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email,
            address: row.address,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl UserRepository for PgRepository {
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO ratings.user (name, email, address, role, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.address)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM ratings.user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(UserId::as_i32).collect();

        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM ratings.user WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(ids)
        .fetch_all(self.pool())
        .await?
        .into_iter()
        .map(User::try_from)
        .collect()
    }

    async fn get_user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithPasswordRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM ratings.user WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(r) => Ok(Some((r.user.try_into()?, r.password_hash))),
            None => Ok(None),
        }
    }

    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let hash: Option<(String,)> =
            sqlx::query_as("SELECT password_hash FROM ratings.user WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool())
                .await?;

        Ok(hash.map(|(h,)| h))
    }

    async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE ratings.user
            SET password_hash = $2, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(&format!(
            r"
            SELECT {USER_COLUMNS}
            FROM ratings.user
            WHERE ($1::text IS NULL OR strpos(lower(name), lower($1)) > 0)
              AND ($2::text IS NULL OR strpos(lower(email), lower($2)) > 0)
              AND ($3::text IS NULL OR strpos(lower(address), lower($3)) > 0)
              AND ($4::text IS NULL OR role = $4)
            ORDER BY id
            "
        ))
        .bind(filter_value(filter.name.as_ref()))
        .bind(filter_value(filter.email.as_ref()))
        .bind(filter_value(filter.address.as_ref()))
        .bind(filter.role.map(|r| r.as_str()))
        .fetch_all(self.pool())
        .await?
        .into_iter()
        .map(User::try_from)
        .collect()
    }

    async fn count_users(&self) -> Result<u64, RepositoryError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ratings.user")
            .fetch_one(self.pool())
            .await?;
        count(n)
    }
}
