//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                            - Liveness
//! GET    /health                      - Liveness
//! GET    /health/ready                - Readiness (storage ping)
//!
//! # Auth
//! POST   /v1/auth/signup              - Register (role defaults to user)
//! POST   /v1/auth/login               - Token pair for email + password
//! POST   /v1/auth/refresh             - New access token for a refresh token
//! GET    /v1/auth/{id}                - Profile (self or admin)
//! PUT    /v1/auth/{id}/password       - Change own password
//!
//! # Stores
//! GET    /v1/stores?search=           - Public listing, optional auth
//! POST   /v1/stores                   - Create store (admin)
//! POST   /v1/stores/{id}/rating       - Rate a store
//! GET    /v1/stores/owner/dashboard   - Owner dashboard
//!
//! # Owner
//! GET    /v1/owner/dashboard          - Owner dashboard
//! PUT    /v1/owner/stores/{id}        - Update an owned store
//! DELETE /v1/owner/stores/{id}        - Delete an owned store
//!
//! # Admin
//! GET    /v1/admin/dashboard          - Global counts
//! GET    /v1/admin/users              - Filtered user listing
//! POST   /v1/admin/users              - Create a user with any role
//! GET    /v1/admin/stores             - Filtered store listing
//!
//! # Ratings
//! POST   /v1/rating                   - Rate a store ({storeId, rating})
//! GET    /v1/rating/{storeId}         - Ratings of a store
//! GET    /v1/rating/{storeId}/average - Average of a store
//! ```

pub mod admin;
pub mod auth;
pub mod extract;
pub mod owner;
pub mod ratings;
pub mod stores;

use axum::extract::State;
use axum::http::{HeaderValue, Request, StatusCode};
use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/{id}", get(auth::profile))
        .route("/{id}/password", put(auth::change_password))
}

/// Create the store routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::list).post(stores::create))
        .route("/{id}/rating", post(stores::rate))
        .route("/owner/dashboard", get(owner::dashboard))
}

/// Create the owner routes router.
pub fn owner_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(owner::dashboard))
        .route(
            "/stores/{id}",
            put(owner::update_store).delete(owner::delete_store),
        )
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route("/stores", get(admin::list_stores))
}

/// Create the rating routes router.
pub fn rating_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(ratings::submit))
        .route("/{store_id}", get(ratings::for_store))
        .route("/{store_id}/average", get(ratings::average))
}

/// Create all `/v1` routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/v1/auth", auth_routes())
        .nest("/v1/stores", store_routes())
        .nest("/v1/owner", owner_routes())
        .nest("/v1/admin", admin_routes())
        .nest("/v1/rating", rating_routes())
}

/// The complete application: health checks, API routes, request IDs,
/// tracing and CORS.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config().cors_origins);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(cors)
        .with_state(state)
}

/// CORS for the configured origins, or any origin when none are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if storage is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.repo().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
