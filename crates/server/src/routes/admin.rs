//! Admin routes.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use super::auth::parse_role;
use super::extract::{ApiJson, ApiQuery};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::views::{AdminDashboard, AdminStoreRow, AdminUserRow, UserView};
use crate::models::{StoreFilter, UserFilter};
use crate::services::auth::{AuthService, Registration};
use crate::services::dashboards::DashboardService;
use crate::state::AppState;

/// Query string for `GET /v1/admin/users`.
///
/// `role` is kept as a string so an unknown role is a validation error with
/// the same body as any other.
#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub role: Option<String>,
}

impl UserListQuery {
    fn into_filter(self) -> Result<UserFilter> {
        let role = match self.role.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_role(Some(raw))?),
        };
        Ok(UserFilter {
            name: self.name,
            email: self.email,
            address: self.address,
            role,
        })
    }
}

/// Body for `POST /v1/admin/users`. Every field is required.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: String,
    pub role: String,
}

/// `GET /v1/admin/dashboard`
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAuth(actor): RequireAuth,
) -> Result<Json<AdminDashboard>> {
    let counts = DashboardService::new(state.repo())
        .admin_dashboard(&actor)
        .await?;
    Ok(Json(counts))
}

/// `GET /v1/admin/users?name=&email=&address=&role=`
pub async fn list_users(
    State(state): State<AppState>,
    RequireAuth(actor): RequireAuth,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<Json<Vec<AdminUserRow>>> {
    let filter = query.into_filter()?;
    let users = DashboardService::new(state.repo())
        .admin_users(&actor, &filter)
        .await?;
    Ok(Json(users))
}

/// `POST /v1/admin/users`
pub async fn create_user(
    State(state): State<AppState>,
    RequireAuth(actor): RequireAuth,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserView>)> {
    // Role before field validation: non-admins always get 403
    actor.require_role(store_ratings_core::Role::Admin)?;

    let required = [&body.name, &body.email, &body.password, &body.address, &body.role];
    if required.iter().any(|v| v.trim().is_empty()) {
        return Err(AppError::Validation("All fields are required".to_string()));
    }

    let registration = Registration {
        role: parse_role(Some(&body.role))?,
        name: body.name,
        email: body.email,
        password: body.password,
        address: body.address,
    };
    let user = AuthService::new(state.repo())
        .create_user(&actor, registration)
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// `GET /v1/admin/stores?name=&email=&address=`
pub async fn list_stores(
    State(state): State<AppState>,
    RequireAuth(actor): RequireAuth,
    ApiQuery(filter): ApiQuery<StoreFilter>,
) -> Result<Json<Vec<AdminStoreRow>>> {
    let stores = DashboardService::new(state.repo())
        .admin_stores(&actor, &filter)
        .await?;
    Ok(Json(stores))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use store_ratings_core::Role;

    use super::*;

    #[test]
    fn test_user_query_role() {
        let query = UserListQuery {
            role: Some("storeOwner".to_owned()),
            ..UserListQuery::default()
        };
        assert_eq!(query.into_filter().unwrap().role, Some(Role::StoreOwner));

        let blank = UserListQuery {
            role: Some(String::new()),
            ..UserListQuery::default()
        };
        assert_eq!(blank.into_filter().unwrap().role, None);

        let bad = UserListQuery {
            role: Some("owner".to_owned()),
            ..UserListQuery::default()
        };
        assert!(matches!(bad.into_filter(), Err(AppError::Validation(_))));
    }
}
