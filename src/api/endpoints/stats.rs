//! Summary counts for the admin dashboard.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::backend::Backend;
use crate::models::DashboardStats;

/// `GET /api/dashboard/stats`
pub async fn summary(State(ctx): State<ApiContext>) -> Result<Json<DashboardStats>, ApiError> {
    Ok(Json(ctx.backend.stats()?))
}
