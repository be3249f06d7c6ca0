//! HTTP API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Middleware stack (outermost to innermost):
//! CORS, trace, body limit, then for protected routes auth and audit.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Headroom above the file size limit for multipart framing and text fields.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    let body_limit = core.config.max_upload_bytes() + MULTIPART_OVERHEAD_BYTES;
    let ctx = ApiContext::new(core);

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route(
            "/workspaces",
            get(endpoints::workspaces::list).post(endpoints::workspaces::create),
        )
        .route("/workspaces/:id", get(endpoints::workspaces::detail))
        .route("/analyze-offer", post(endpoints::analyze::analyze))
        .route(
            "/workspaces/:id/offers",
            get(endpoints::offers::list).post(endpoints::offers::create),
        )
        .route("/offers/:id", get(endpoints::offers::detail))
        .route("/offers/:id/funnels", post(endpoints::funnels::create))
        .route("/funnels/:id", get(endpoints::funnels::detail))
        .route(
            "/workspaces/:id/offer-contexts",
            get(endpoints::offer_contexts::list).post(endpoints::offer_contexts::save),
        )
        .route(
            "/offer-contexts/:id",
            get(endpoints::offer_contexts::detail).delete(endpoints::offer_contexts::delete),
        )
        .route("/offer-contexts/:id/files", get(endpoints::offer_files::list))
        .route("/upload-offer-file", post(endpoints::offer_files::upload))
        .route("/offer-files/:id", axum::routing::delete(endpoints::offer_files::delete))
        .route(
            "/offer-files/:id/download-url",
            get(endpoints::offer_files::download_url),
        )
        .route(
            "/workspaces/:id/sales-reports",
            get(endpoints::sales_reports::list).post(endpoints::sales_reports::create),
        )
        .route("/sales-reports/refine", post(endpoints::sales_reports::refine))
        .route(
            "/sales-reports/:id",
            get(endpoints::sales_reports::detail)
                .put(endpoints::sales_reports::update)
                .delete(endpoints::sales_reports::delete),
        )
        .route(
            "/sales-reports/:id/generate",
            post(endpoints::sales_reports::generate),
        )
        .route(
            "/sales-reports/:id/versions",
            get(endpoints::sales_reports::list_versions)
                .post(endpoints::sales_reports::create_version),
        )
        .route(
            "/sales-reports/:id/sections/:section/regenerate",
            post(endpoints::sales_reports::regenerate_section),
        )
        .with_state(ctx.clone())
        // Middleware stack (innermost first, outermost last):
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/users", post(endpoints::users::register))
        .with_state(ctx.clone())
        .layer(axum::Extension(ctx));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any);

    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
