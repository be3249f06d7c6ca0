//! Offer endpoints.
//!
//! - `GET /api/workspaces/:id/offers`: offers of a workspace, newest first
//! - `POST /api/workspaces/:id/offers`: save an analyzed offer
//! - `GET /api/offers/:id`: a single offer

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::parse_id;
use crate::actions::offers;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::models::{Offer, OfferAnalysis, OfferInput};

#[derive(Deserialize)]
pub struct SaveOfferRequest {
    pub input: OfferInput,
    /// Analysis returned earlier by `/analyze-offer`. Analyzed now when absent.
    #[serde(default)]
    pub analysis: Option<OfferAnalysis>,
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(workspace_id): Path<String>,
) -> Result<Json<Vec<Offer>>, ApiError> {
    let workspace_id = parse_id("workspace", &workspace_id)?;
    Ok(Json(offers::list_offers(&ctx.core, &user.user_id, &workspace_id)?))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(workspace_id): Path<String>,
    Json(body): Json<SaveOfferRequest>,
) -> Result<(StatusCode, Json<Offer>), ApiError> {
    let workspace_id = parse_id("workspace", &workspace_id)?;

    let analysis = match body.analysis {
        Some(analysis) => analysis,
        None => {
            // Check ownership before spending a model call
            crate::actions::workspaces::get_workspace(&ctx.core, &user.user_id, &workspace_id)?;
            offers::analyze_offer(&ctx.core, body.input.value()).await?.into_analysis()
        }
    };

    let offer = offers::save_offer(&ctx.core, &user.user_id, &workspace_id, &body.input, analysis)?;
    Ok((StatusCode::CREATED, Json(offer)))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(offer_id): Path<String>,
) -> Result<Json<Offer>, ApiError> {
    let offer_id = parse_id("offer", &offer_id)?;
    Ok(Json(offers::get_offer(&ctx.core, &user.user_id, &offer_id)?))
}
