//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Server errors are captured to
//! Sentry before responding; clients only ever see the JSON body
//! `{"error": <kind>, "message": <text>}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use store_ratings_core::AccessDenied;

use crate::db::RepositoryError;
use crate::services::ServiceError;
use crate::services::auth::AuthError;
use crate::services::tokens::TokenError;

/// Message returned for a duplicate registration.
pub const DUPLICATE_EMAIL_MESSAGE: &str = "An account with this email already exists";

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Bad input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unique constraint hit.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found, or not visible to the caller.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No token, or a token that failed verification.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated, but lacking the role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_)
                | AuthError::Validation(_)
                | AuthError::InvalidCredentials
                | AuthError::IncorrectPassword => StatusCode::BAD_REQUEST,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::Access(AccessDenied::Unauthenticated) => StatusCode::UNAUTHORIZED,
                AuthError::Access(AccessDenied::Forbidden { .. }) | AuthError::NotOwnAccount => {
                    StatusCode::FORBIDDEN
                }
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Stable error kind for the response body.
    ///
    /// A login mismatch is `unauthenticated` even though it answers 400.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Database(_) | Self::Internal(_) => "internal",
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_)
                | AuthError::Validation(_)
                | AuthError::IncorrectPassword => "validation",
                AuthError::InvalidCredentials
                | AuthError::Access(AccessDenied::Unauthenticated) => "unauthenticated",
                AuthError::Access(AccessDenied::Forbidden { .. }) | AuthError::NotOwnAccount => {
                    "forbidden"
                }
                AuthError::UserAlreadyExists => "conflict",
                AuthError::UserNotFound => "not_found",
                AuthError::Repository(_) | AuthError::PasswordHash => "internal",
            },
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
        }
    }

    /// Message safe to show to clients.
    fn client_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::IncorrectPassword => "Old password is incorrect".to_string(),
                AuthError::UserAlreadyExists => DUPLICATE_EMAIL_MESSAGE.to_string(),
                AuthError::UserNotFound => "User not found".to_string(),
                AuthError::InvalidEmail(e) => format!("Invalid email address: {e}"),
                AuthError::Validation(msg) => msg.clone(),
                AuthError::Access(denied) => access_message(*denied),
                AuthError::NotOwnAccount => err.to_string(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Internal server error".to_string()
                }
            },
            Self::Validation(msg)
            | Self::Conflict(msg)
            | Self::NotFound(msg)
            | Self::Unauthenticated(msg)
            | Self::Forbidden(msg) => msg.clone(),
        }
    }
}

fn access_message(denied: AccessDenied) -> String {
    match denied {
        AccessDenied::Unauthenticated => "Authentication required".to_string(),
        AccessDenied::Forbidden { required } => {
            format!("Access denied: requires role '{required}'")
        }
    }
}

impl From<AccessDenied> for AppError {
    fn from(denied: AccessDenied) -> Self {
        match denied {
            AccessDenied::Unauthenticated => Self::Unauthenticated(access_message(denied)),
            AccessDenied::Forbidden { .. } => Self::Forbidden(access_message(denied)),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::Validation(msg),
            ServiceError::NotFound(what) => Self::NotFound(format!("{} not found", capitalize(what))),
            ServiceError::Access(denied) => denied.into(),
            ServiceError::Repository(RepositoryError::Conflict(msg)) => Self::Conflict(msg),
            ServiceError::Repository(RepositoryError::NotFound) => {
                Self::NotFound("Not found".to_string())
            }
            ServiceError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Key(_) | TokenError::Sign(_) | TokenError::ExpiryOverflow => {
                Self::Internal(err.to_string())
            }
            TokenError::Invalid(_) | TokenError::Expired(_) | TokenError::WrongKind { .. } => {
                Self::Unauthenticated("Invalid or expired token".to_string())
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        let body = ErrorBody {
            error: self.kind(),
            message: self.client_message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}
