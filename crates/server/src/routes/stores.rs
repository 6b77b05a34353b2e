//! Store listing, creation and rating.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use store_ratings_core::{RatingValue, StoreId, UserId};

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::error::{AppError, Result};
use crate::middleware::{CurrentActor, RequireAuth};
use crate::models::views::{RateStoreResponse, StoreListing, StoreView};
use crate::services::ratings::RatingService;
use crate::services::stores::{StoreInput, StoreService};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateStoreRequest {
    pub name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub owner_id: Option<UserId>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RateRequest {
    pub rating: Option<f64>,
}

/// Validate a rating that arrived as a JSON number.
pub(crate) fn rating_value(raw: Option<f64>) -> Result<RatingValue> {
    let raw = raw.ok_or_else(|| AppError::Validation("rating is required".to_string()))?;
    RatingValue::from_f64(raw).map_err(|e| AppError::Validation(e.to_string()))
}

/// `GET /v1/stores?search=`
pub async fn list(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<StoreListing>>> {
    let stores = RatingService::new(state.repo())
        .list_stores(&actor, query.search)
        .await?;
    Ok(Json(stores))
}

/// `POST /v1/stores`
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(actor): RequireAuth,
    ApiJson(body): ApiJson<CreateStoreRequest>,
) -> Result<(StatusCode, Json<StoreView>)> {
    let store = StoreService::new(state.repo())
        .create(
            &actor,
            StoreInput {
                name: body.name,
                email: body.email,
                address: body.address,
                owner_id: body.owner_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(store.into())))
}

/// `POST /v1/stores/{id}/rating`
pub async fn rate(
    State(state): State<AppState>,
    RequireAuth(actor): RequireAuth,
    ApiPath(id): ApiPath<StoreId>,
    ApiJson(body): ApiJson<RateRequest>,
) -> Result<Json<RateStoreResponse>> {
    let value = rating_value(body.rating)?;
    let response = RatingService::new(state.repo())
        .rate_store(&actor, id, value)
        .await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_value() {
        assert_eq!(rating_value(Some(5.0)).ok().map(RatingValue::get), Some(5));
        assert!(matches!(rating_value(None), Err(AppError::Validation(_))));
        assert!(matches!(rating_value(Some(0.0)), Err(AppError::Validation(_))));
        assert!(matches!(rating_value(Some(3.5)), Err(AppError::Validation(_))));
    }
}
