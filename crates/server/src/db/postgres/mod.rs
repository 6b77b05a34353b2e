//! `PostgreSQL` backend.
//!
//! Queries are runtime-checked (`sqlx::query_as::<_, Row>`) and map into the
//! domain types through `TryFrom<Row>`, so a row that fails validation
//! surfaces as [`RepositoryError::DataCorruption`] rather than a panic.

mod ratings;
mod stores;
mod users;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{Repository, RepositoryError};

/// Repository backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    /// Create a repository over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Treat an empty filter string the same as an absent one.
fn filter_value(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Convert a `COUNT(*)` result.
fn count(value: i64) -> Result<u64, RepositoryError> {
    u64::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative count: {value}")))
}

fn corrupt(what: &str, err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::DataCorruption(format!("invalid {what} in database: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_value() {
        let empty = String::new();
        let bakery = "bakery".to_owned();
        assert_eq!(filter_value(None), None);
        assert_eq!(filter_value(Some(&empty)), None);
        assert_eq!(filter_value(Some(&bakery)), Some("bakery"));
    }

    #[test]
    fn test_count_rejects_negative() {
        assert_eq!(count(3).ok(), Some(3));
        assert!(matches!(count(-1), Err(RepositoryError::DataCorruption(_))));
    }
}
