//! CLI subcommands.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;

use store_ratings_server::config::{ConfigError, get_database_url};
use store_ratings_server::db;

/// Resolve the database URL from the environment.
pub fn database_url() -> Result<SecretString, ConfigError> {
    dotenvy::dotenv().ok();
    get_database_url("RATINGS_DATABASE_URL")
}

/// Connect to the database named by the environment.
pub async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&url).await?)
}
