//! Offer file endpoints.
//!
//! - `POST /api/upload-offer-file`: multipart upload (`file`, `workspaceId`, `offerId`)
//! - `GET /api/offer-contexts/:id/files`: files of an offer context
//! - `DELETE /api/offer-files/:id`
//! - `GET /api/offer-files/:id/download-url`: signed link, valid two hours

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Serialize;

use super::parse_id;
use crate::actions::offer_files::{self, FileUpload};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::models::OfferFile;

#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub file: OfferFile,
}

#[derive(Serialize)]
pub struct DownloadUrlResponse {
    pub url: String,
}

pub async fn upload(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut upload: Option<FileUpload> = None;
    let mut workspace_id: Option<String> = None;
    let mut offer_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let mime = match field.content_type() {
                    Some(ct) if ct != "application/octet-stream" => ct.to_string(),
                    _ => mime_guess::from_path(&file_name)
                        .first_or_octet_stream()
                        .essence_str()
                        .to_string(),
                };
                let bytes = field.bytes().await?.to_vec();
                upload = Some(FileUpload {
                    file_name,
                    mime,
                    bytes,
                });
            }
            Some("workspaceId") => workspace_id = Some(field.text().await?),
            Some("offerId") => offer_id = Some(field.text().await?),
            _ => {}
        }
    }

    let (Some(upload), Some(workspace_id), Some(offer_id)) = (upload, workspace_id, offer_id) else {
        return Err(ApiError::BadRequest("Missing required fields".into()));
    };
    let workspace_id = parse_id("workspace", workspace_id.trim())?;
    let offer_id = parse_id("offer", offer_id.trim())?;

    let file = offer_files::upload_offer_file(&ctx.core, &user.user_id, &workspace_id, &offer_id, upload).await?;
    Ok((StatusCode::CREATED, Json(UploadResponse { success: true, file })))
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(offer_id): Path<String>,
) -> Result<Json<Vec<OfferFile>>, ApiError> {
    let offer_id = parse_id("offer context", &offer_id)?;
    Ok(Json(offer_files::list_offer_files(&ctx.core, &user.user_id, &offer_id)?))
}

pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(file_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let file_id = parse_id("file", &file_id)?;
    offer_files::delete_offer_file(&ctx.core, &user.user_id, &file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn download_url(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(file_id): Path<String>,
) -> Result<Json<DownloadUrlResponse>, ApiError> {
    let file_id = parse_id("file", &file_id)?;
    let url = offer_files::file_download_url(&ctx.core, &user.user_id, &file_id).await?;
    Ok(Json(DownloadUrlResponse { url }))
}
