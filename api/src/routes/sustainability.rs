//! Sustainability Endpoints
//!
//! Every figure here is recomputed from delivered orders on each request.

use axum::{
    extract::{Path, State},
    Json,
};
use eco_impact::{LeaderboardEntry, UserLifetimeImpact};
use uuid::Uuid;

use crate::{
    error::ApiError,
    services::{reporting, PlatformStats},
    types::ApiResponse,
    AppState,
};

/// GET /api/sustainability/impact/:user_id
///
/// Users without delivered orders get all-zero totals, not 404.
pub async fn get_user_impact(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserLifetimeImpact>>, ApiError> {
    let impact = reporting::user_impact(state.store.as_ref(), user_id).await?;
    Ok(Json(ApiResponse::success(impact)))
}

/// GET /api/sustainability/leaderboard
pub async fn get_leaderboard(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<LeaderboardEntry>>>, ApiError> {
    let entries =
        reporting::leaderboard(state.store.as_ref(), state.config.leaderboard_size).await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// GET /api/sustainability/stats
pub async fn get_platform_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PlatformStats>>, ApiError> {
    let stats = reporting::platform_stats(state.store.as_ref()).await?;
    Ok(Json(ApiResponse::success(stats)))
}
