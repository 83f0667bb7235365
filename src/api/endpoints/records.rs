//! CRUD handlers shared by every collection path.
//!
//! Lists are wrapped in a `{ "data": [...], "total": n }` envelope, the
//! shape the real backend uses for paginated lists.

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::backend::{Backend, Resource};

#[derive(Serialize)]
pub struct ListResponse {
    pub data: Vec<Value>,
    pub total: usize,
}

/// `GET /api/<path>`
pub async fn list(ctx: ApiContext, resource: Resource) -> Result<Json<ListResponse>, ApiError> {
    let data = ctx.backend.list(resource)?;
    Ok(Json(ListResponse {
        total: data.len(),
        data,
    }))
}

/// `POST /api/<path>`
pub async fn create(
    ctx: ApiContext,
    resource: Resource,
    body: Value,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    require_object(&body)?;
    let created = ctx.backend.create(resource, &body)?;
    tracing::debug!(path = resource.path(), "Mock record created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PUT /api/<path>/:id`
pub async fn update(
    ctx: ApiContext,
    resource: Resource,
    id: String,
    body: Value,
) -> Result<Json<Value>, ApiError> {
    require_object(&body)?;
    Ok(Json(ctx.backend.update(resource, &id, &body)?))
}

/// `PATCH /api/<path>/:id`
pub async fn patch(
    ctx: ApiContext,
    resource: Resource,
    id: String,
    body: Value,
) -> Result<Json<Value>, ApiError> {
    require_object(&body)?;
    Ok(Json(ctx.backend.patch(resource, &id, &body)?))
}

/// `DELETE /api/<path>/:id`
pub async fn remove(ctx: ApiContext, resource: Resource, id: String) -> Result<StatusCode, ApiError> {
    ctx.backend.delete(resource, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

fn require_object(body: &Value) -> Result<(), ApiError> {
    if body.is_object() {
        Ok(())
    } else {
        Err(ApiError::BadRequest("expected a JSON object".into()))
    }
}
