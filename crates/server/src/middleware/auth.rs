//! Bearer token extractors.
//!
//! A request carries at most one `Authorization: Bearer <token>` header. The
//! token is verified, then the user row is loaded so the role used for
//! authorization always comes from storage, never from the token.
//!
//! Handlers that allow anonymous callers take [`CurrentActor`]; handlers that
//! need a caller take [`RequireAuth`]. Role checks happen in the services.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use store_ratings_core::{Actor, Principal};

use crate::error::{AppError, set_sentry_user};
use crate::services::tokens::TokenKind;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Outcome of looking at a request's credentials.
enum Resolution {
    /// No `Authorization` header at all.
    NoToken,
    /// A token was present but didn't resolve to a user.
    Rejected(&'static str),
    Authenticated(Principal),
}

async fn resolve(parts: &Parts, state: &AppState) -> Result<Resolution, AppError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(Resolution::NoToken);
    };

    let Some(token) = header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|t| !t.is_empty())
    else {
        return Ok(Resolution::Rejected("Malformed authorization header"));
    };

    let claims = match state.tokens().verify(token, TokenKind::Access) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "Token rejected");
            return Ok(Resolution::Rejected("Invalid or expired token"));
        }
    };

    let Some(user) = state.repo().get_user(claims.sub).await? else {
        tracing::debug!(user_id = %claims.sub, "Token for unknown user");
        return Ok(Resolution::Rejected("Invalid or expired token"));
    };

    tracing::Span::current().record("user_id", tracing::field::display(user.id));
    set_sentry_user(&user.id);

    Ok(Resolution::Authenticated(Principal::new(user.id, user.role)))
}

/// Extractor that requires a valid access token.
///
/// Rejects with 401 when the header is missing or the token doesn't verify.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAuth(actor): RequireAuth) -> Result<Json<Profile>> {
///     let me = actor.require_authenticated()?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireAuth(pub Actor);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve(parts, state).await? {
            Resolution::Authenticated(principal) => Ok(Self(Actor::from(principal))),
            Resolution::NoToken => Err(AppError::Unauthenticated(
                "No token provided".to_string(),
            )),
            Resolution::Rejected(reason) => Err(AppError::Unauthenticated(reason.to_string())),
        }
    }
}

/// Extractor that resolves the caller without requiring one.
///
/// A missing or invalid token yields [`Actor::Anonymous`].
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let actor = match resolve(parts, state).await? {
            Resolution::Authenticated(principal) => Actor::from(principal),
            Resolution::NoToken | Resolution::Rejected(_) => Actor::Anonymous,
        };
        Ok(Self(actor))
    }
}
