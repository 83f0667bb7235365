//! Mock API router.
//!
//! Returns a composable `Router` with every REST path nested under
//! `/api/`. Middleware stack (outermost → innermost):
//! CORS → Extension → Auth → Access log → Handler.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use tower_http::cors::CorsLayer;

use crate::api::endpoints::{self, records};
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::backend::{MockBackend, Resource, STATS_PATH};

/// Build the mock API router over `backend`.
pub fn mock_api_router(backend: Arc<MockBackend>) -> Router {
    build_router(ApiContext::new(backend))
}

pub(crate) fn build_router(ctx: ApiContext) -> Router {
    let mut protected = Router::new().route(STATS_PATH, get(endpoints::stats::summary));
    for resource in Resource::ALL {
        protected = protected.merge(resource_routes(*resource));
    }

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = protected
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_token))
        .layer(axum::Extension(ctx.clone()));

    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .with_state(ctx);

    // Browser dashboards call the mock from another origin.
    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
        .layer(CorsLayer::permissive())
}

/// `GET`/`POST` on the collection, `PUT`/`PATCH`/`DELETE` on `/:id`.
fn resource_routes(resource: Resource) -> Router<ApiContext> {
    let collection = get(move |State(ctx): State<ApiContext>| records::list(ctx, resource)).post(
        move |State(ctx): State<ApiContext>, Json(body): Json<Value>| {
            records::create(ctx, resource, body)
        },
    );

    let item = axum::routing::put(
        move |State(ctx): State<ApiContext>, Path(id): Path<String>, Json(body): Json<Value>| {
            records::update(ctx, resource, id, body)
        },
    )
    .patch(
        move |State(ctx): State<ApiContext>, Path(id): Path<String>, Json(body): Json<Value>| {
            records::patch(ctx, resource, id, body)
        },
    )
    .delete(move |State(ctx): State<ApiContext>, Path(id): Path<String>| {
        records::remove(ctx, resource, id)
    });

    Router::new()
        .route(resource.path(), collection)
        .route(&format!("{}/:id", resource.path()), item)
}
