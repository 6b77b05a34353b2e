//! Rating ledger routes.

use axum::{Json, extract::State};
use serde::Deserialize;

use store_ratings_core::StoreId;

use super::extract::{ApiJson, ApiPath};
use super::stores::rating_value;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::views::{RateStoreResponse, RatingView, StoreAverage};
use crate::services::ratings::RatingService;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubmitRatingRequest {
    pub store_id: Option<StoreId>,
    pub rating: Option<f64>,
}

/// `POST /v1/rating`
pub async fn submit(
    State(state): State<AppState>,
    RequireAuth(actor): RequireAuth,
    ApiJson(body): ApiJson<SubmitRatingRequest>,
) -> Result<Json<RateStoreResponse>> {
    let store = body
        .store_id
        .ok_or_else(|| AppError::Validation("storeId is required".to_string()))?;
    let value = rating_value(body.rating)?;

    let response = RatingService::new(state.repo())
        .rate_store(&actor, store, value)
        .await?;
    Ok(Json(response))
}

/// `GET /v1/rating/{storeId}`
pub async fn for_store(
    State(state): State<AppState>,
    ApiPath(store): ApiPath<StoreId>,
) -> Result<Json<Vec<RatingView>>> {
    let ratings = RatingService::new(state.repo())
        .store_ratings(store)
        .await?;
    Ok(Json(ratings))
}

/// `GET /v1/rating/{storeId}/average`
pub async fn average(
    State(state): State<AppState>,
    ApiPath(store): ApiPath<StoreId>,
) -> Result<Json<StoreAverage>> {
    let avg = RatingService::new(state.repo())
        .store_average(store)
        .await?;
    Ok(Json(avg))
}
