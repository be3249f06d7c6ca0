//! Sales report endpoints.
//!
//! - `GET|POST /api/workspaces/:id/sales-reports`
//! - `GET|PUT|DELETE /api/sales-reports/:id`
//! - `POST /api/sales-reports/:id/generate`: full generation, blocks until done
//! - `GET|POST /api/sales-reports/:id/versions`
//! - `POST /api/sales-reports/:id/sections/:section/regenerate`
//! - `POST /api/sales-reports/refine`: rewrite a section body from a chat message

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::parse_id;
use crate::actions::sales_reports::{self, GenerationSummary};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::models::{ReportVersion, SalesReport};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub offer_id: Uuid,
    pub title: String,
}

#[derive(Deserialize)]
pub struct UpdateContentRequest {
    pub content: String,
}

#[derive(Deserialize, Default)]
pub struct RegenerateSectionRequest {
    #[serde(default)]
    pub instructions: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineRequest {
    pub current_content: String,
    pub user_message: String,
}

#[derive(Serialize)]
pub struct RefineResponse {
    pub content: String,
}

#[derive(Serialize)]
pub struct VersionCreated {
    pub version: i64,
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(workspace_id): Path<String>,
) -> Result<Json<Vec<SalesReport>>, ApiError> {
    let workspace_id = parse_id("workspace", &workspace_id)?;
    Ok(Json(sales_reports::list_sales_reports(&ctx.core, &user.user_id, &workspace_id)?))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(workspace_id): Path<String>,
    Json(body): Json<CreateReportRequest>,
) -> Result<(StatusCode, Json<SalesReport>), ApiError> {
    let workspace_id = parse_id("workspace", &workspace_id)?;
    let report = sales_reports::create_sales_report(
        &ctx.core,
        &user.user_id,
        &workspace_id,
        &body.offer_id,
        &body.title,
    )?;
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(report_id): Path<String>,
) -> Result<Json<SalesReport>, ApiError> {
    let report_id = parse_id("report", &report_id)?;
    Ok(Json(sales_reports::get_sales_report(&ctx.core, &user.user_id, &report_id)?))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(report_id): Path<String>,
    Json(body): Json<UpdateContentRequest>,
) -> Result<Json<SalesReport>, ApiError> {
    let report_id = parse_id("report", &report_id)?;
    Ok(Json(sales_reports::update_report_content(
        &ctx.core,
        &user.user_id,
        &report_id,
        &body.content,
    )?))
}

pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(report_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let report_id = parse_id("report", &report_id)?;
    sales_reports::delete_sales_report(&ctx.core, &user.user_id, &report_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Generation takes minutes with the serialized fan-out. It runs on its own
/// task so a dropped connection cannot leave the report stuck in
/// `generating`.
pub async fn generate(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(report_id): Path<String>,
) -> Result<Json<GenerationSummary>, ApiError> {
    let report_id = parse_id("report", &report_id)?;
    let core = ctx.core.clone();
    let task = tokio::spawn(async move {
        sales_reports::generate_report_content(&core, &user.user_id, &report_id).await
    });

    let summary = task
        .await
        .map_err(|e| ApiError::Internal(format!("generation task: {e}")))??;
    Ok(Json(summary))
}

pub async fn list_versions(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(report_id): Path<String>,
) -> Result<Json<Vec<ReportVersion>>, ApiError> {
    let report_id = parse_id("report", &report_id)?;
    Ok(Json(sales_reports::list_report_versions(&ctx.core, &user.user_id, &report_id)?))
}

pub async fn create_version(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(report_id): Path<String>,
) -> Result<(StatusCode, Json<VersionCreated>), ApiError> {
    let report_id = parse_id("report", &report_id)?;
    let version = sales_reports::create_report_version(&ctx.core, &user.user_id, &report_id)?;
    Ok((StatusCode::CREATED, Json(VersionCreated { version })))
}

pub async fn regenerate_section(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path((report_id, section)): Path<(String, String)>,
    body: Option<Json<RegenerateSectionRequest>>,
) -> Result<Json<SalesReport>, ApiError> {
    let report_id = parse_id("report", &report_id)?;
    let Json(body) = body.unwrap_or_default();
    let report = sales_reports::regenerate_report_section(
        &ctx.core,
        &user.user_id,
        &report_id,
        &section,
        &body.instructions,
    )
    .await?;
    Ok(Json(report))
}

pub async fn refine(
    State(ctx): State<ApiContext>,
    Json(body): Json<RefineRequest>,
) -> Result<Json<RefineResponse>, ApiError> {
    let content =
        sales_reports::refine_report_section(&ctx.core, &body.current_content, &body.user_message).await?;
    Ok(Json(RefineResponse { content }))
}
