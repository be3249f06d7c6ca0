//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, resolves it to a user and
//! injects `UserContext` into request extensions for downstream handlers.

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::actions::users::authenticate;
use crate::api::error::ApiError;
use crate::api::types::{bearer_token, ApiContext, UserContext};

/// Require a valid bearer token.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
pub async fn require_auth(
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = bearer_token(req.headers())
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    let user = authenticate(&ctx.core, &token)?.ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(UserContext {
        user_id: user.id,
        email: user.email,
    });

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));

    Ok(response)
}
