//! Account routes: signup, login, token refresh, profile, password change.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use store_ratings_core::{Role, UserId};

use super::extract::{ApiJson, ApiPath};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::views::UserView;
use crate::services::auth::{AuthService, Registration};
use crate::services::tokens::TokenKind;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Signup body. `address` and `role` are optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: &'static str,
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Parse an optional wire role, defaulting to `user`.
pub(crate) fn parse_role(role: Option<&str>) -> Result<Role> {
    match role.map(str::trim) {
        None | Some("") => Ok(Role::default()),
        Some(raw) => raw
            .parse()
            .map_err(|e: store_ratings_core::RoleError| AppError::Validation(e.to_string())),
    }
}

/// Role for a public signup. Admin accounts come only from `POST /v1/admin/users`.
fn signup_role(role: Option<&str>) -> Result<Role> {
    match parse_role(role)? {
        Role::Admin => Err(AppError::Validation(
            "Signup role must be 'user' or 'storeOwner'".to_string(),
        )),
        role => Ok(role),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /v1/auth/signup`
#[tracing::instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    if body.name.trim().is_empty() || body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::Validation(
            "Name, email and password are required".to_string(),
        ));
    }

    let registration = Registration {
        role: signup_role(body.role.as_deref())?,
        name: body.name,
        email: body.email,
        password: body.password,
        address: body.address.unwrap_or_default(),
    };

    let user = AuthService::new(state.repo())
        .register(registration)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User registered successfully",
            user: user.into(),
        }),
    ))
}

/// `POST /v1/auth/login`
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let user = AuthService::new(state.repo())
        .login(&body.email, &body.password)
        .await?;
    let tokens = state.tokens().issue_pair(user.id, user.role)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        message: "Login successful",
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        user: user.into(),
    }))
}

/// `POST /v1/auth/refresh`
///
/// Exchanges a refresh token for a new access token. The user must still
/// exist; the new token carries their current role.
#[tracing::instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RefreshRequest>,
) -> Result<Json<RefreshResponse>> {
    let claims = state.tokens().verify(&body.refresh_token, TokenKind::Refresh)?;

    let user = state
        .repo()
        .get_user(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("Invalid or expired token".to_string()))?;

    let access_token = state.tokens().issue(user.id, user.role, TokenKind::Access)?;
    Ok(Json(RefreshResponse { access_token }))
}

/// `GET /v1/auth/{id}`
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(actor): RequireAuth,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<UserView>> {
    let user = AuthService::new(state.repo()).profile(&actor, id).await?;
    Ok(Json(user.into()))
}

/// `PUT /v1/auth/{id}/password`
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(actor): RequireAuth,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    AuthService::new(state.repo())
        .change_password(&actor, id, &body.old_password, &body.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password updated successfully",
    }))
}
