//! `POST /api/analyze-offer`: run the offer analyzer without saving.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::actions::offers::analyze_offer;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::enums::OfferInputType;
use crate::models::OfferAnalysis;

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub input_type: Option<OfferInputType>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub analysis: OfferAnalysis,
    /// True when the canned analysis was substituted for a failed model call.
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

pub async fn analyze(
    State(ctx): State<ApiContext>,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    if body.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Content is required".into()));
    }
    // URL inputs are analyzed as given; nothing is fetched
    if body.input_type == Some(OfferInputType::Url) {
        tracing::debug!("Analyzing URL input as plain text");
    }

    let outcome = analyze_offer(&ctx.core, &body.content).await?;
    let fallback_reason = outcome.fallback_reason().map(str::to_string);
    Ok(Json(AnalyzeResponse {
        success: true,
        fallback: fallback_reason.is_some(),
        fallback_reason,
        analysis: outcome.into_analysis(),
    }))
}
