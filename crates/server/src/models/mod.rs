//! Domain models for the ratings server.
//!
//! These are validated domain objects, separate from database row types and
//! from the JSON views in [`views`].

pub mod rating;
pub mod store;
pub mod user;
pub mod views;

pub use rating::{RaterEntry, Rating, UpsertedRating};
pub use store::{NewStore, Store, StoreFilter, StoreUpdate};
pub use user::{NewUser, User, UserFilter};

/// Case-insensitive substring match used by every free-text filter.
///
/// An absent or empty needle matches everything.
pub(crate) fn contains_ci(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        None | Some("") => true,
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
    }
}
