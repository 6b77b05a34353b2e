//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! ratings-cli user create -e owner@example.com -n "Corner Bakery Owner" -p 'long-passphrase' -r storeOwner
//! ```

use store_ratings_core::Role;
use store_ratings_server::db::PgRepository;
use store_ratings_server::services::auth::{AuthService, Registration};

/// Create a user with any role, bypassing the admin check.
///
/// # Errors
///
/// Returns an error if the role is unknown, a field fails validation, the
/// email is taken or the database is unreachable.
pub async fn create(
    email: &str,
    name: &str,
    password: &str,
    address: &str,
    role: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let role: Role = role.parse()?;

    let repo = PgRepository::new(super::connect().await?);
    let user = AuthService::new(&repo)
        .register(Registration {
            name: name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
            address: address.to_owned(),
            role,
        })
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(())
}
