//! Offer context endpoints.
//!
//! - `GET /api/workspaces/:id/offer-contexts`: contexts of a workspace
//! - `POST /api/workspaces/:id/offer-contexts`: create, or update when `id` is set
//! - `GET /api/offer-contexts/:id`, `DELETE /api/offer-contexts/:id`

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;

use super::parse_id;
use crate::actions::offer_contexts::{self, OfferContextInput};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::models::OfferContext;

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(workspace_id): Path<String>,
) -> Result<Json<Vec<OfferContext>>, ApiError> {
    let workspace_id = parse_id("workspace", &workspace_id)?;
    Ok(Json(offer_contexts::list_offer_contexts(
        &ctx.core,
        &user.user_id,
        &workspace_id,
    )?))
}

pub async fn save(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(workspace_id): Path<String>,
    Json(body): Json<OfferContextInput>,
) -> Result<(StatusCode, Json<OfferContext>), ApiError> {
    let workspace_id = parse_id("workspace", &workspace_id)?;
    let status = if body.id.is_some() { StatusCode::OK } else { StatusCode::CREATED };
    let context = offer_contexts::save_offer_context(&ctx.core, &user.user_id, &workspace_id, body)?;
    Ok((status, Json(context)))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(offer_id): Path<String>,
) -> Result<Json<OfferContext>, ApiError> {
    let offer_id = parse_id("offer context", &offer_id)?;
    Ok(Json(offer_contexts::get_offer_context(&ctx.core, &user.user_id, &offer_id)?))
}

pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(offer_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let offer_id = parse_id("offer context", &offer_id)?;
    offer_contexts::delete_offer_context(&ctx.core, &user.user_id, &offer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
