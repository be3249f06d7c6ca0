//! Audit logging middleware.
//!
//! Logs every protected request with method, path, status and the
//! authenticated user. Runs innermost (after auth has injected UserContext).

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::UserContext;

pub async fn log_access(
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let user_id = req
        .extensions()
        .get::<UserContext>()
        .map(|u| u.user_id.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16();
    if response.status().is_server_error() {
        tracing::warn!(%method, %path, status, %user_id, "API request failed");
    } else {
        tracing::info!(%method, %path, status, %user_id, "API request");
    }

    response
}
