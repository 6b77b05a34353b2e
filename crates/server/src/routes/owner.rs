//! Store owner routes.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use store_ratings_core::StoreId;

use super::extract::{ApiJson, ApiPath};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::views::{OwnerDashboard, StoreView};
use crate::services::dashboards::DashboardService;
use crate::services::stores::{StoreChanges, StoreService};
use crate::state::AppState;

/// Owner edits. Any other field in the body is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateStoreRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: &'static str,
    pub id: StoreId,
}

/// `GET /v1/owner/dashboard` and `GET /v1/stores/owner/dashboard`
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAuth(actor): RequireAuth,
) -> Result<Json<OwnerDashboard>> {
    let dashboard = DashboardService::new(state.repo())
        .owner_dashboard(&actor)
        .await?;
    Ok(Json(dashboard))
}

/// `PUT /v1/owner/stores/{id}`
pub async fn update_store(
    State(state): State<AppState>,
    RequireAuth(actor): RequireAuth,
    ApiPath(id): ApiPath<StoreId>,
    ApiJson(body): ApiJson<UpdateStoreRequest>,
) -> Result<Json<StoreView>> {
    let changes = StoreChanges {
        name: body.name,
        email: body.email,
        address: body.address,
    };
    let store = StoreService::new(state.repo())
        .update_owned(&actor, id, changes)
        .await?;
    Ok(Json(store.into()))
}

/// `DELETE /v1/owner/stores/{id}`
pub async fn delete_store(
    State(state): State<AppState>,
    RequireAuth(actor): RequireAuth,
    ApiPath(id): ApiPath<StoreId>,
) -> Result<Json<DeletedResponse>> {
    StoreService::new(state.repo())
        .delete_owned(&actor, id)
        .await?;
    Ok(Json(DeletedResponse {
        message: "Store deleted",
        id,
    }))
}
