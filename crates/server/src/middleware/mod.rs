//! HTTP middleware and extractors.
//!
//! # Layer order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. CORS
//! 3. `TraceLayer` (one span per request, with `request_id` and `user_id` fields)
//! 4. Request ID

pub mod auth;
pub mod request_id;

pub use auth::{CurrentActor, RequireAuth};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
