//! The public store listing and the rating ledger.

use std::collections::HashMap;

use store_ratings_core::{Actor, RatingValue, StoreId, UserId, average};

use super::ServiceError;
use crate::db::{Repository, RepositoryError};
use crate::models::views::{
    OwnerSummary, RateStoreResponse, RatingView, StoreAverage, StoreListing, StoreView,
};
use crate::models::{Rating, Store, StoreFilter, User};

/// Message returned when a rating row was created.
pub const RATING_SUBMITTED: &str = "Rating submitted";
/// Message returned when an existing rating row was overwritten.
pub const RATING_UPDATED: &str = "Rating updated";

/// Rating operations and the views built on them.
pub struct RatingService<'a> {
    repo: &'a dyn Repository,
}

impl<'a> RatingService<'a> {
    #[must_use]
    pub const fn new(repo: &'a dyn Repository) -> Self {
        Self { repo }
    }

    /// Every store matching an optional name search, with its owner, its
    /// average and the caller's own rating.
    ///
    /// Anonymous callers are allowed and always see `my_rating: None`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if storage fails.
    pub async fn list_stores(
        &self,
        actor: &Actor,
        search: Option<String>,
    ) -> Result<Vec<StoreListing>, ServiceError> {
        let stores = self.repo.list_stores(&StoreFilter::by_name(search)).await?;
        let owners = self.owners_of(&stores).await?;
        let caller = actor.principal().map(|p| p.id);

        let mut listing = Vec::with_capacity(stores.len());
        for store in stores {
            let ratings = self.repo.ratings_for_store(store.id).await?;
            let my_rating = match caller {
                Some(me) => self.repo.my_rating(store.id, me).await?.map(|r| r.value),
                None => None,
            };

            listing.push(StoreListing {
                owner: store
                    .owner_id
                    .and_then(|id| owners.get(&id))
                    .map(OwnerSummary::from),
                average_rating: average(ratings.iter().map(|r| r.value)),
                total_ratings: ratings.len(),
                my_rating,
                store: StoreView::from(store),
            });
        }
        Ok(listing)
    }

    /// Insert or overwrite the caller's rating of a store.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Access` for anonymous callers and
    /// `ServiceError::NotFound` if the store doesn't exist.
    pub async fn rate_store(
        &self,
        actor: &Actor,
        store: StoreId,
        value: RatingValue,
    ) -> Result<RateStoreResponse, ServiceError> {
        let caller = actor.require_authenticated()?;

        let upserted = self
            .repo
            .upsert_rating(store, caller.id, value)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ServiceError::NotFound("store"),
                other => ServiceError::Repository(other),
            })?;

        tracing::info!(
            store_id = %store,
            user_id = %caller.id,
            rating = %value,
            inserted = upserted.inserted,
            "Rating recorded"
        );

        let ratings = self.repo.ratings_for_store(store).await?;
        Ok(RateStoreResponse {
            message: if upserted.inserted {
                RATING_SUBMITTED
            } else {
                RATING_UPDATED
            },
            average_rating: average(ratings.iter().map(|r| r.value)),
            my_rating: upserted.rating.value,
        })
    }

    /// Every rating of one store.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the store doesn't exist.
    pub async fn store_ratings(&self, store: StoreId) -> Result<Vec<RatingView>, ServiceError> {
        let ratings = self.existing_store_ratings(store).await?;
        Ok(ratings.into_iter().map(RatingView::from).collect())
    }

    /// The average rating of one store.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the store doesn't exist.
    pub async fn store_average(&self, store: StoreId) -> Result<StoreAverage, ServiceError> {
        let ratings = self.existing_store_ratings(store).await?;
        Ok(StoreAverage {
            store_id: store,
            average_rating: average(ratings.iter().map(|r| r.value)),
            total_ratings: ratings.len(),
        })
    }

    /// One average over every rating of every listed store, and how many
    /// ratings went into it.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if storage fails.
    pub async fn average_across_stores(
        &self,
        stores: &[StoreId],
    ) -> Result<(f64, usize), ServiceError> {
        let pooled = self.repo.ratings_for_stores(stores).await?;
        Ok((average(pooled.iter().map(|r| r.value)), pooled.len()))
    }

    async fn existing_store_ratings(&self, store: StoreId) -> Result<Vec<Rating>, ServiceError> {
        if self.repo.get_store(store).await?.is_none() {
            return Err(ServiceError::NotFound("store"));
        }
        Ok(self.repo.ratings_for_store(store).await?)
    }

    async fn owners_of(&self, stores: &[Store]) -> Result<HashMap<UserId, User>, ServiceError> {
        let mut ids: Vec<UserId> = stores.iter().filter_map(|s| s.owner_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let owners = self.repo.get_users(&ids).await?;
        Ok(owners.into_iter().map(|u| (u.id, u)).collect())
    }
}
