//! Store Ratings Core - Shared types and rating aggregation.
//!
//! This crate provides the types shared by every store ratings component:
//! - `server` - The HTTP API (auth, stores, owner and admin views)
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Averages are computed here from plain rating values so the
//! same arithmetic is used by every storage backend and every view.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, roles, rating values and caller identity
//! - [`aggregate`] - Arithmetic mean over ratings and display rounding

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod aggregate;
pub mod types;

pub use aggregate::{average, round_for_display};
pub use types::*;
