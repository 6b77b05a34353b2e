//! In-memory backend.
//!
//! Holds every table behind one mutex, so each trait method is a single
//! critical section. This gives the rating upsert the same atomicity the
//! Postgres unique constraint gives it. Used by the integration tests and by
//! `RATINGS_STORAGE=memory`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use store_ratings_core::{Email, RatingId, RatingValue, StoreId, UserId};

use super::{RatingLedger, Repository, RepositoryError, StoreRepository, UserRepository};
use crate::models::{
    NewStore, NewUser, RaterEntry, Rating, Store, StoreFilter, StoreUpdate, UpsertedRating, User,
    UserFilter,
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, (User, String)>,
    stores: BTreeMap<StoreId, Store>,
    ratings: BTreeMap<(StoreId, UserId), Rating>,
    next_user: i32,
    next_store: i32,
    next_rating: i32,
}

impl Tables {
    fn next_id(counter: &mut i32) -> i32 {
        *counter += 1;
        *counter
    }

    fn ratings_of<'a>(&'a self, stores: &'a [StoreId]) -> impl Iterator<Item = &'a Rating> + 'a {
        self.ratings
            .values()
            .filter(move |r| stores.contains(&r.store_id))
    }
}

/// Repository holding everything in process memory.
///
/// Cloning shares the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> Result<T, RepositoryError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("in-memory store lock poisoned".to_owned()))?;
        Ok(f(&mut tables))
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        self.with(|t| {
            if t.users.values().any(|(u, _)| u.email == user.email) {
                return Err(RepositoryError::Conflict("email already exists".to_owned()));
            }

            let now = Utc::now();
            let created = User {
                id: UserId::new(Tables::next_id(&mut t.next_user)),
                name: user.name.clone(),
                email: user.email.clone(),
                address: user.address.clone(),
                role: user.role,
                created_at: now,
                updated_at: now,
            };
            t.users
                .insert(created.id, (created.clone(), user.password_hash.clone()));
            Ok(created)
        })?
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.with(|t| t.users.get(&id).map(|(u, _)| u.clone()))
    }

    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError> {
        self.with(|t| {
            t.users
                .values()
                .filter(|(u, _)| ids.contains(&u.id))
                .map(|(u, _)| u.clone())
                .collect()
        })
    }

    async fn get_user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        self.with(|t| t.users.values().find(|(u, _)| &u.email == email).cloned())
    }

    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        self.with(|t| t.users.get(&id).map(|(_, hash)| hash.clone()))
    }

    async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        self.with(|t| {
            let (user, hash) = t.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
            password_hash.clone_into(hash);
            user.updated_at = Utc::now();
            Ok(())
        })?
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError> {
        self.with(|t| {
            t.users
                .values()
                .filter(|(u, _)| filter.matches(u))
                .map(|(u, _)| u.clone())
                .collect()
        })
    }

    async fn count_users(&self) -> Result<u64, RepositoryError> {
        self.with(|t| t.users.len() as u64)
    }
}

#[async_trait]
impl StoreRepository for MemoryRepository {
    async fn create_store(&self, store: &NewStore) -> Result<Store, RepositoryError> {
        self.with(|t| {
            if let Some(owner) = store.owner_id
                && !t.users.contains_key(&owner)
            {
                return Err(RepositoryError::NotFound);
            }

            let created = Store {
                id: StoreId::new(Tables::next_id(&mut t.next_store)),
                name: store.name.clone(),
                email: store.email.clone(),
                address: store.address.clone(),
                owner_id: store.owner_id,
                created_at: Utc::now(),
            };
            t.stores.insert(created.id, created.clone());
            Ok(created)
        })?
    }

    async fn get_store(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        self.with(|t| t.stores.get(&id).cloned())
    }

    async fn list_stores(&self, filter: &StoreFilter) -> Result<Vec<Store>, RepositoryError> {
        self.with(|t| {
            t.stores
                .values()
                .filter(|s| filter.matches(s))
                .cloned()
                .collect()
        })
    }

    async fn stores_owned_by(&self, owner: UserId) -> Result<Vec<Store>, RepositoryError> {
        self.with(|t| {
            t.stores
                .values()
                .filter(|s| s.owner_id == Some(owner))
                .cloned()
                .collect()
        })
    }

    async fn update_owned_store(
        &self,
        id: StoreId,
        owner: UserId,
        update: &StoreUpdate,
    ) -> Result<Option<Store>, RepositoryError> {
        self.with(|t| {
            t.stores
                .get_mut(&id)
                .filter(|s| s.owner_id == Some(owner))
                .map(|s| {
                    update.apply(s);
                    s.clone()
                })
        })
    }

    async fn delete_owned_store(
        &self,
        id: StoreId,
        owner: UserId,
    ) -> Result<bool, RepositoryError> {
        self.with(|t| {
            let owned = t.stores.get(&id).is_some_and(|s| s.owner_id == Some(owner));
            if owned {
                t.stores.remove(&id);
                t.ratings.retain(|(store, _), _| *store != id);
            }
            owned
        })
    }

    async fn count_stores(&self) -> Result<u64, RepositoryError> {
        self.with(|t| t.stores.len() as u64)
    }
}

#[async_trait]
impl RatingLedger for MemoryRepository {
    async fn upsert_rating(
        &self,
        store: StoreId,
        user: UserId,
        value: RatingValue,
    ) -> Result<UpsertedRating, RepositoryError> {
        self.with(|t| {
            if !t.stores.contains_key(&store) || !t.users.contains_key(&user) {
                return Err(RepositoryError::NotFound);
            }

            let now = Utc::now();
            if let Some(existing) = t.ratings.get_mut(&(store, user)) {
                existing.value = value;
                existing.updated_at = now;
                return Ok(UpsertedRating {
                    rating: existing.clone(),
                    inserted: false,
                });
            }

            let rating = Rating {
                id: RatingId::new(Tables::next_id(&mut t.next_rating)),
                store_id: store,
                user_id: user,
                value,
                created_at: now,
                updated_at: now,
            };
            t.ratings.insert((store, user), rating.clone());
            Ok(UpsertedRating {
                rating,
                inserted: true,
            })
        })?
    }

    async fn ratings_for_store(&self, store: StoreId) -> Result<Vec<Rating>, RepositoryError> {
        self.with(|t| t.ratings_of(&[store]).cloned().collect())
    }

    async fn ratings_for_stores(
        &self,
        stores: &[StoreId],
    ) -> Result<Vec<Rating>, RepositoryError> {
        self.with(|t| t.ratings_of(stores).cloned().collect())
    }

    async fn my_rating(
        &self,
        store: StoreId,
        user: UserId,
    ) -> Result<Option<Rating>, RepositoryError> {
        self.with(|t| t.ratings.get(&(store, user)).cloned())
    }

    async fn raters_for_stores(
        &self,
        stores: &[StoreId],
    ) -> Result<Vec<RaterEntry>, RepositoryError> {
        self.with(|t| {
            t.ratings_of(stores)
                .filter_map(|r| {
                    t.users.get(&r.user_id).map(|(u, _)| RaterEntry {
                        store_id: r.store_id,
                        user_id: u.id,
                        name: u.name.clone(),
                        email: u.email.clone(),
                        value: r.value,
                    })
                })
                .collect()
        })
    }

    async fn count_ratings(&self) -> Result<u64, RepositoryError> {
        self.with(|t| t.ratings.len() as u64)
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.with(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use store_ratings_core::Role;

    use super::*;

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            name: "Test User".to_owned(),
            email: Email::parse(email).unwrap(),
            address: String::new(),
            role,
            password_hash: "digest".to_owned(),
        }
    }

    fn new_store(name: &str, owner: Option<UserId>) -> NewStore {
        NewStore {
            name: name.to_owned(),
            email: None,
            address: None,
            owner_id: owner,
        }
    }

    fn rating(v: i64) -> RatingValue {
        RatingValue::new(v).unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = MemoryRepository::new();
        repo.create_user(&new_user("a@x.com", Role::User)).await.unwrap();

        let err = repo
            .create_user(&new_user("a@x.com", Role::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(repo.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_email_match_is_case_sensitive() {
        let repo = MemoryRepository::new();
        repo.create_user(&new_user("a@x.com", Role::User)).await.unwrap();
        repo.create_user(&new_user("A@x.com", Role::User)).await.unwrap();
        assert_eq!(repo.count_users().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_upsert_keeps_one_row() {
        let repo = MemoryRepository::new();
        let user = repo.create_user(&new_user("a@x.com", Role::User)).await.unwrap();
        let store = repo.create_store(&new_store("Deli", None)).await.unwrap();

        let first = repo.upsert_rating(store.id, user.id, rating(2)).await.unwrap();
        assert!(first.inserted);

        for v in [3, 5, 4] {
            let again = repo.upsert_rating(store.id, user.id, rating(v)).await.unwrap();
            assert!(!again.inserted);
            assert_eq!(again.rating.id, first.rating.id);
        }

        let rows = repo.ratings_for_store(store.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value.get(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_keep_one_row() {
        let repo = MemoryRepository::new();
        let user = repo.create_user(&new_user("a@x.com", Role::User)).await.unwrap();
        let store = repo.create_store(&new_store("Deli", None)).await.unwrap();
        let (store_id, user_id) = (store.id, user.id);

        let tasks: Vec<_> = (0..64_i64)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.upsert_rating(store_id, user_id, rating(i % 5 + 1)).await
                })
            })
            .collect();

        let mut inserted = 0;
        for task in tasks {
            if task.await.unwrap().unwrap().inserted {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(repo.ratings_for_store(store_id).await.unwrap().len(), 1);
        assert_eq!(repo.count_ratings().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_my_rating_is_per_pair() {
        let repo = MemoryRepository::new();
        let alice = repo.create_user(&new_user("a@x.com", Role::User)).await.unwrap();
        let bob = repo.create_user(&new_user("b@x.com", Role::User)).await.unwrap();
        let deli = repo.create_store(&new_store("Deli", None)).await.unwrap();
        let cafe = repo.create_store(&new_store("Cafe", None)).await.unwrap();
        repo.upsert_rating(deli.id, alice.id, rating(3)).await.unwrap();

        let mine = repo.my_rating(deli.id, alice.id).await.unwrap().unwrap();
        assert_eq!(mine.value.get(), 3);
        assert!(repo.my_rating(deli.id, bob.id).await.unwrap().is_none());
        assert!(repo.my_rating(cafe.id, alice.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ratings_for_stores_pools_only_listed() {
        let repo = MemoryRepository::new();
        let alice = repo.create_user(&new_user("a@x.com", Role::User)).await.unwrap();
        let bob = repo.create_user(&new_user("b@x.com", Role::User)).await.unwrap();
        let a = repo.create_store(&new_store("A", None)).await.unwrap();
        let b = repo.create_store(&new_store("B", None)).await.unwrap();
        let c = repo.create_store(&new_store("C", None)).await.unwrap();
        repo.upsert_rating(a.id, alice.id, rating(5)).await.unwrap();
        repo.upsert_rating(b.id, alice.id, rating(1)).await.unwrap();
        repo.upsert_rating(b.id, bob.id, rating(2)).await.unwrap();
        repo.upsert_rating(c.id, bob.id, rating(4)).await.unwrap();

        let pooled = repo.ratings_for_stores(&[a.id, b.id]).await.unwrap();
        assert_eq!(pooled.len(), 3);
        assert!(pooled.iter().all(|r| r.store_id != c.id));
        assert!(repo.ratings_for_stores(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_unknown_store_is_not_found() {
        let repo = MemoryRepository::new();
        let user = repo.create_user(&new_user("a@x.com", Role::User)).await.unwrap();

        let err = repo
            .upsert_rating(StoreId::new(99), user.id, rating(3))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_owner_scoped_mutations() {
        let repo = MemoryRepository::new();
        let owner = repo.create_user(&new_user("o@x.com", Role::StoreOwner)).await.unwrap();
        let other = repo.create_user(&new_user("p@x.com", Role::StoreOwner)).await.unwrap();
        let store = repo.create_store(&new_store("Deli", Some(owner.id))).await.unwrap();
        repo.upsert_rating(store.id, other.id, rating(5)).await.unwrap();

        let update = StoreUpdate {
            name: Some("Hijacked".to_owned()),
            ..StoreUpdate::default()
        };
        assert!(repo.update_owned_store(store.id, other.id, &update).await.unwrap().is_none());
        assert!(!repo.delete_owned_store(store.id, other.id).await.unwrap());
        assert_eq!(repo.get_store(store.id).await.unwrap().unwrap().name, "Deli");

        assert!(repo.delete_owned_store(store.id, owner.id).await.unwrap());
        assert!(repo.get_store(store.id).await.unwrap().is_none());
        assert_eq!(repo.count_ratings().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_raters_join_user() {
        let repo = MemoryRepository::new();
        let owner = repo.create_user(&new_user("o@x.com", Role::StoreOwner)).await.unwrap();
        let rater = repo.create_user(&new_user("r@x.com", Role::User)).await.unwrap();
        let a = repo.create_store(&new_store("A", Some(owner.id))).await.unwrap();
        let b = repo.create_store(&new_store("B", None)).await.unwrap();
        repo.upsert_rating(a.id, rater.id, rating(4)).await.unwrap();
        repo.upsert_rating(b.id, rater.id, rating(1)).await.unwrap();

        let raters = repo.raters_for_stores(&[a.id]).await.unwrap();
        assert_eq!(raters.len(), 1);
        assert_eq!(raters[0].email.as_str(), "r@x.com");
        assert_eq!(raters[0].value.get(), 4);
    }
}
