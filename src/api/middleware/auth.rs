//! Bearer token check.
//!
//! The mock server accepts any request unless `ApiContext` carries a
//! required token, in which case `Authorization: Bearer <token>` must
//! match it exactly.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

pub async fn require_token(req: Request<axum::body::Body>, next: Next) -> Response {
    match check(&req) {
        Ok(()) => next.run(req).await,
        Err(err) => err.into_response(),
    }
}

fn check(req: &Request<axum::body::Body>) -> Result<(), ApiError> {
    let ctx = req
        .extensions()
        .get::<ApiContext>()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let Some(expected) = ctx.required_token.as_deref() else {
        return Ok(());
    };

    let presented = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    if presented != expected {
        tracing::warn!(path = %req.uri().path(), "Rejected request with wrong token");
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}
