//! Store domain types.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use store_ratings_core::{Email, StoreId, UserId};

use super::contains_ci;

/// A rateable store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub email: Option<Email>,
    pub address: Option<String>,
    /// The owning user. Cleared if that user row ever disappears.
    pub owner_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// A validated store ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewStore {
    pub name: String,
    pub email: Option<Email>,
    pub address: Option<String>,
    pub owner_id: Option<UserId>,
}

/// Fields an owner may change. `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct StoreUpdate {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub address: Option<String>,
}

impl StoreUpdate {
    /// Apply the update to a store in place.
    pub fn apply(&self, store: &mut Store) {
        if let Some(name) = &self.name {
            store.name.clone_from(name);
        }
        if let Some(email) = &self.email {
            store.email = Some(email.clone());
        }
        if let Some(address) = &self.address {
            store.address = Some(address.clone());
        }
    }
}

/// Filters for store listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreFilter {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl StoreFilter {
    /// Filter on name only, as the public listing's `search` parameter does.
    #[must_use]
    pub fn by_name(search: Option<String>) -> Self {
        Self {
            name: search,
            ..Self::default()
        }
    }

    /// Whether `store` passes every filter that is set.
    ///
    /// A missing store email or address only matches an absent filter.
    #[must_use]
    pub fn matches(&self, store: &Store) -> bool {
        contains_ci(&store.name, self.name.as_deref())
            && optional_contains(store.email.as_ref().map(Email::as_str), self.email.as_deref())
            && optional_contains(store.address.as_deref(), self.address.as_deref())
    }
}

fn optional_contains(haystack: Option<&str>, needle: Option<&str>) -> bool {
    match (haystack, needle) {
        (_, None | Some("")) => true,
        (None, Some(_)) => false,
        (Some(h), n) => contains_ci(h, n),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store() -> Store {
        Store {
            id: StoreId::new(1),
            name: "Corner Bakery".to_owned(),
            email: None,
            address: Some("1 Main St".to_owned()),
            owner_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_on_missing_email() {
        let s = store();
        assert!(StoreFilter::default().matches(&s));
        assert!(StoreFilter::by_name(Some("bakery".to_owned())).matches(&s));

        let by_email = StoreFilter {
            email: Some("x".to_owned()),
            ..StoreFilter::default()
        };
        assert!(!by_email.matches(&s));
    }

    #[test]
    fn test_update_apply_partial() {
        let mut s = store();
        let update = StoreUpdate {
            name: Some("Renamed".to_owned()),
            email: Some(Email::parse("hi@bakery.com").unwrap()),
            address: None,
        };
        update.apply(&mut s);

        assert_eq!(s.name, "Renamed");
        assert_eq!(s.email.unwrap().as_str(), "hi@bakery.com");
        assert_eq!(s.address.as_deref(), Some("1 Main St"));
    }
}
