//! Workspace endpoints.
//!
//! - `GET /api/workspaces`: the caller's workspaces
//! - `POST /api/workspaces`: create one
//! - `GET /api/workspaces/:id`: a single workspace

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::parse_id;
use crate::actions::workspaces;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::models::Workspace;

#[derive(Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<Vec<Workspace>>, ApiError> {
    Ok(Json(workspaces::list_workspaces(&ctx.core, &user.user_id)?))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Json(body): Json<CreateWorkspaceRequest>,
) -> Result<(StatusCode, Json<Workspace>), ApiError> {
    let workspace = workspaces::create_workspace(&ctx.core, &user.user_id, &body.name)?;
    Ok((StatusCode::CREATED, Json(workspace)))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(workspace_id): Path<String>,
) -> Result<Json<Workspace>, ApiError> {
    let workspace_id = parse_id("workspace", &workspace_id)?;
    Ok(Json(workspaces::get_workspace(&ctx.core, &user.user_id, &workspace_id)?))
}
