//! Store creation and owner-scoped edits.

use store_ratings_core::{Actor, Email, Role, StoreId, UserId};

use super::ServiceError;
use super::auth::MAX_ADDRESS_LENGTH;
use crate::db::Repository;
use crate::models::{NewStore, Store, StoreUpdate};

/// Unvalidated store fields, as they arrive from a client.
#[derive(Debug, Clone, Default)]
pub struct StoreInput {
    pub name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub owner_id: Option<UserId>,
}

/// Unvalidated owner edits. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct StoreChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

pub struct StoreService<'a> {
    repo: &'a dyn Repository,
}

impl<'a> StoreService<'a> {
    #[must_use]
    pub const fn new(repo: &'a dyn Repository) -> Self {
        Self { repo }
    }

    /// Create a store. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Access` unless the caller is an admin and
    /// `ServiceError::Validation` for bad fields or an owner who is not a
    /// store owner.
    pub async fn create(&self, actor: &Actor, input: StoreInput) -> Result<Store, ServiceError> {
        let admin = actor.require_role(Role::Admin)?;

        let name = validate_store_name(&input.name)?;
        let email = parse_optional_email(input.email.as_deref())?;
        let address = validate_optional_address(input.address)?;

        if let Some(owner_id) = input.owner_id {
            let owner = self.repo.get_user(owner_id).await?;
            if owner.is_none_or(|o| o.role != Role::StoreOwner) {
                return Err(ServiceError::Validation(format!(
                    "owner {owner_id} is not a store owner"
                )));
            }
        }

        let store = self
            .repo
            .create_store(&NewStore {
                name,
                email,
                address,
                owner_id: input.owner_id,
            })
            .await?;

        tracing::info!(admin_id = %admin.id, store_id = %store.id, "Store created");
        Ok(store)
    }

    /// Update a store the caller owns.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the store doesn't exist or belongs
    /// to someone else.
    pub async fn update_owned(
        &self,
        actor: &Actor,
        id: StoreId,
        changes: StoreChanges,
    ) -> Result<Store, ServiceError> {
        let owner = actor.require_role(Role::StoreOwner)?;

        let update = StoreUpdate {
            name: changes.name.as_deref().map(validate_store_name).transpose()?,
            email: parse_optional_email(changes.email.as_deref())?,
            address: validate_optional_address(changes.address)?,
        };

        let store = self
            .repo
            .update_owned_store(id, owner.id, &update)
            .await?
            .ok_or(ServiceError::NotFound("store"))?;

        tracing::info!(owner_id = %owner.id, store_id = %id, "Store updated");
        Ok(store)
    }

    /// Delete a store the caller owns, with its ratings.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the store doesn't exist or belongs
    /// to someone else.
    pub async fn delete_owned(&self, actor: &Actor, id: StoreId) -> Result<(), ServiceError> {
        let owner = actor.require_role(Role::StoreOwner)?;

        if !self.repo.delete_owned_store(id, owner.id).await? {
            return Err(ServiceError::NotFound("store"));
        }

        tracing::info!(owner_id = %owner.id, store_id = %id, "Store deleted");
        Ok(())
    }
}

/// Store names are required but have no length cap.
fn validate_store_name(name: &str) -> Result<String, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::Validation("store name is required".to_owned()));
    }
    Ok(name.to_owned())
}

fn parse_optional_email(email: Option<&str>) -> Result<Option<Email>, ServiceError> {
    match email.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => Email::parse(raw)
            .map(Some)
            .map_err(|e| ServiceError::Validation(format!("invalid email: {e}"))),
    }
}

fn validate_optional_address(address: Option<String>) -> Result<Option<String>, ServiceError> {
    match address {
        Some(a) if a.chars().count() > MAX_ADDRESS_LENGTH => Err(ServiceError::Validation(
            format!("address must be at most {MAX_ADDRESS_LENGTH} characters"),
        )),
        other => Ok(other),
    }
}
