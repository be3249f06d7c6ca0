//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub storage: &'static str,
    pub transcription: bool,
}

/// `GET /api/health`: liveness plus which backends are configured.
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    // Fails loudly when the database file is unreachable
    ctx.core.open_db()?;

    let config = &ctx.core.config;
    Ok(Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        storage: if config.supabase().is_some() { "supabase" } else { "local" },
        transcription: config.openai_api_key.is_some(),
    }))
}
