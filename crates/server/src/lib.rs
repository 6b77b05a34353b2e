//! Store ratings server library.
//!
//! The HTTP API is built by [`routes::app`] over any [`db::Repository`], so
//! the binary, the CLI and the integration tests share one code path.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
