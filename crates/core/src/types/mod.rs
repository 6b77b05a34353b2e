//! Core types for the store ratings service.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod identity;
pub mod rating;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use identity::{Actor, AccessDenied, Principal};
pub use rating::{RatingError, RatingValue};
pub use role::{Role, RoleError};
