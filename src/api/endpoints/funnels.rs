//! Funnel endpoints.
//!
//! - `POST /api/offers/:id/funnels`: generate a draft funnel from an offer
//! - `GET /api/funnels/:id`: funnel with its ordered pages

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use super::parse_id;
use crate::actions::funnels;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::models::FunnelWithPages;

#[derive(Serialize)]
pub struct CreatedFunnel {
    pub id: Uuid,
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(offer_id): Path<String>,
) -> Result<(StatusCode, Json<CreatedFunnel>), ApiError> {
    let offer_id = parse_id("offer", &offer_id)?;
    let id = funnels::create_funnel_from_offer(&ctx.core, &user.user_id, &offer_id).await?;
    Ok((StatusCode::CREATED, Json(CreatedFunnel { id })))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(funnel_id): Path<String>,
) -> Result<Json<FunnelWithPages>, ApiError> {
    let funnel_id = parse_id("funnel", &funnel_id)?;
    Ok(Json(funnels::get_funnel(&ctx.core, &user.user_id, &funnel_id)?))
}
