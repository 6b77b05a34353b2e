//! Owner and admin aggregates.
//!
//! Owner averages pool every rating of every owned store before dividing.
//! Admin listings round to two places at the very end, after the average has
//! been computed from raw values.

use std::collections::HashMap;

use store_ratings_core::{Actor, Role, StoreId, UserId, average, round_for_display};

use super::ServiceError;
use super::ratings::RatingService;
use crate::db::Repository;
use crate::models::views::{
    AdminDashboard, AdminStoreRow, AdminUserRow, OwnedStoreSummary, OwnerDashboard,
    OwnerSummary, RaterView, StoreView, UserView,
};
use crate::models::{StoreFilter, UserFilter};

pub struct DashboardService<'a> {
    repo: &'a dyn Repository,
}

impl<'a> DashboardService<'a> {
    #[must_use]
    pub const fn new(repo: &'a dyn Repository) -> Self {
        Self { repo }
    }

    /// Aggregate over every store the calling owner owns.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Access` unless the caller is a store owner.
    pub async fn owner_dashboard(&self, actor: &Actor) -> Result<OwnerDashboard, ServiceError> {
        let owner = actor.require_role(Role::StoreOwner)?;

        let stores = self.repo.stores_owned_by(owner.id).await?;
        let ids: Vec<StoreId> = stores.iter().map(|s| s.id).collect();
        let (avg_rating, total_ratings) = RatingService::new(self.repo)
            .average_across_stores(&ids)
            .await?;
        let raters = self.repo.raters_for_stores(&ids).await?;

        Ok(OwnerDashboard {
            total_stores: stores.len(),
            total_ratings,
            avg_rating,
            raters: raters.into_iter().map(RaterView::from).collect(),
        })
    }

    /// Platform-wide counts.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Access` unless the caller is an admin.
    pub async fn admin_dashboard(&self, actor: &Actor) -> Result<AdminDashboard, ServiceError> {
        actor.require_role(Role::Admin)?;

        Ok(AdminDashboard {
            total_users: self.repo.count_users().await?,
            total_stores: self.repo.count_stores().await?,
            total_ratings: self.repo.count_ratings().await?,
        })
    }

    /// Users matching `filter`. Store owners with at least one store also
    /// get their first store's name, address and rounded average.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Access` unless the caller is an admin.
    pub async fn admin_users(
        &self,
        actor: &Actor,
        filter: &UserFilter,
    ) -> Result<Vec<AdminUserRow>, ServiceError> {
        actor.require_role(Role::Admin)?;

        let users = self.repo.list_users(filter).await?;
        let mut rows = Vec::with_capacity(users.len());
        for user in users {
            let store = if user.role == Role::StoreOwner {
                self.first_store_summary(user.id).await?
            } else {
                None
            };
            rows.push(AdminUserRow {
                user: UserView::from(user),
                store,
            });
        }
        Ok(rows)
    }

    /// Stores matching `filter`, with owner and rounded average.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Access` unless the caller is an admin.
    pub async fn admin_stores(
        &self,
        actor: &Actor,
        filter: &StoreFilter,
    ) -> Result<Vec<AdminStoreRow>, ServiceError> {
        actor.require_role(Role::Admin)?;

        let stores = self.repo.list_stores(filter).await?;

        let mut owner_ids: Vec<UserId> = stores.iter().filter_map(|s| s.owner_id).collect();
        owner_ids.sort_unstable();
        owner_ids.dedup();
        let owners: HashMap<UserId, OwnerSummary> = self
            .repo
            .get_users(&owner_ids)
            .await?
            .iter()
            .map(|u| (u.id, OwnerSummary::from(u)))
            .collect();

        let mut rows = Vec::with_capacity(stores.len());
        for store in stores {
            let ratings = self.repo.ratings_for_store(store.id).await?;
            rows.push(AdminStoreRow {
                owner: store.owner_id.and_then(|id| owners.get(&id).cloned()),
                average_rating: round_for_display(average(ratings.iter().map(|r| r.value))),
                total_ratings: ratings.len(),
                store: StoreView::from(store),
            });
        }
        Ok(rows)
    }

    async fn first_store_summary(
        &self,
        owner: UserId,
    ) -> Result<Option<OwnedStoreSummary>, ServiceError> {
        let Some(store) = self.repo.stores_owned_by(owner).await?.into_iter().next() else {
            return Ok(None);
        };

        let ratings = self.repo.ratings_for_store(store.id).await?;
        Ok(Some(OwnedStoreSummary {
            id: store.id,
            name: store.name,
            address: store.address,
            average_rating: round_for_display(average(ratings.iter().map(|r| r.value))),
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use store_ratings_core::{AccessDenied, Email, Principal, RatingValue};

    use super::*;
    use crate::db::{MemoryRepository, RatingLedger, StoreRepository, UserRepository};
    use crate::models::{NewStore, NewUser};

    async fn user(repo: &MemoryRepository, name: &str, role: Role) -> (UserId, Actor) {
        let u = repo
            .create_user(&NewUser {
                name: name.to_owned(),
                email: Email::parse(&format!("{}@x.com", name.to_lowercase())).unwrap(),
                address: format!("{name} Street"),
                role,
                password_hash: "digest".to_owned(),
            })
            .await
            .unwrap();
        (u.id, Actor::from(Principal::new(u.id, u.role)))
    }

    async fn store(repo: &MemoryRepository, name: &str, owner: Option<UserId>) -> StoreId {
        repo.create_store(&NewStore {
            name: name.to_owned(),
            email: None,
            address: Some(format!("{name} Plaza")),
            owner_id: owner,
        })
        .await
        .unwrap()
        .id
    }

    async fn rate(repo: &MemoryRepository, store: StoreId, user: UserId, v: i64) {
        repo.upsert_rating(store, user, RatingValue::new(v).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_owner_average_is_pooled() {
        let repo = MemoryRepository::new();
        let (owner_id, owner) = user(&repo, "Owner", Role::StoreOwner).await;
        let (u1, _) = user(&repo, "Una", Role::User).await;
        let (u2, _) = user(&repo, "Ugo", Role::User).await;
        let a = store(&repo, "A", Some(owner_id)).await;
        let b = store(&repo, "B", Some(owner_id)).await;
        let elsewhere = store(&repo, "C", None).await;

        rate(&repo, a, u1, 5).await;
        rate(&repo, b, u1, 1).await;
        rate(&repo, b, u2, 1).await;
        rate(&repo, elsewhere, u2, 5).await;

        let dashboard = DashboardService::new(&repo)
            .owner_dashboard(&owner)
            .await
            .unwrap();
        assert_eq!(dashboard.total_stores, 2);
        assert_eq!(dashboard.total_ratings, 3);
        assert!((dashboard.avg_rating - 7.0 / 3.0).abs() < 1e-9);
        assert_eq!(dashboard.raters.len(), 3);
    }

    #[tokio::test]
    async fn test_owner_without_stores() {
        let repo = MemoryRepository::new();
        let (_, owner) = user(&repo, "Owner", Role::StoreOwner).await;

        let dashboard = DashboardService::new(&repo)
            .owner_dashboard(&owner)
            .await
            .unwrap();
        assert_eq!(dashboard.total_stores, 0);
        assert!(dashboard.avg_rating.abs() < f64::EPSILON);
        assert!(dashboard.raters.is_empty());
    }

    #[tokio::test]
    async fn test_dashboards_check_roles() {
        let repo = MemoryRepository::new();
        let (_, plain) = user(&repo, "Plain", Role::User).await;
        let service = DashboardService::new(&repo);

        assert!(matches!(
            service.owner_dashboard(&plain).await,
            Err(ServiceError::Access(AccessDenied::Forbidden { .. }))
        ));
        assert!(matches!(
            service.admin_dashboard(&Actor::Anonymous).await,
            Err(ServiceError::Access(AccessDenied::Unauthenticated))
        ));
    }

    #[tokio::test]
    async fn test_admin_listing_enriches_owners() {
        let repo = MemoryRepository::new();
        let (_, admin) = user(&repo, "Admin", Role::Admin).await;
        let (owner_id, _) = user(&repo, "Owner", Role::StoreOwner).await;
        user(&repo, "Lonely", Role::StoreOwner).await;
        let (u1, _) = user(&repo, "Una", Role::User).await;
        let (u2, _) = user(&repo, "Ugo", Role::User).await;
        let (u3, _) = user(&repo, "Ula", Role::User).await;
        let a = store(&repo, "A", Some(owner_id)).await;
        rate(&repo, a, u1, 5).await;
        rate(&repo, a, u2, 1).await;
        rate(&repo, a, u3, 1).await;

        let service = DashboardService::new(&repo);
        let owners = service
            .admin_users(
                &admin,
                &UserFilter {
                    role: Some(Role::StoreOwner),
                    ..UserFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(owners.len(), 2);

        let enriched = owners.iter().find(|r| r.user.id == owner_id).unwrap();
        let summary = enriched.store.as_ref().unwrap();
        assert_eq!(summary.name, "A");
        assert_eq!(summary.average_rating.to_string(), "2.33");

        let lonely = owners.iter().find(|r| r.user.name == "Lonely").unwrap();
        assert!(lonely.store.is_none());

        let counts = service.admin_dashboard(&admin).await.unwrap();
        assert_eq!(
            counts,
            AdminDashboard {
                total_users: 6,
                total_stores: 1,
                total_ratings: 3,
            }
        );
    }

    #[tokio::test]
    async fn test_admin_store_listing() {
        let repo = MemoryRepository::new();
        let (_, admin) = user(&repo, "Admin", Role::Admin).await;
        let (owner_id, _) = user(&repo, "Owner", Role::StoreOwner).await;
        let (u1, _) = user(&repo, "Una", Role::User).await;
        let a = store(&repo, "Alpha", Some(owner_id)).await;
        store(&repo, "Beta", None).await;
        rate(&repo, a, u1, 4).await;

        let rows = DashboardService::new(&repo)
            .admin_stores(&admin, &StoreFilter::by_name(Some("ALP".to_owned())))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].owner.as_ref().unwrap().id, owner_id);
        assert_eq!(rows[0].average_rating.to_string(), "4");
    }
}
