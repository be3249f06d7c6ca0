use std::time::Duration;

use uuid::Uuid;

use super::offer_contexts::owned_offer_context;
use super::{owned_workspace, ActionError};
use crate::core_state::CoreState;
use crate::db::now_timestamp;
use crate::db::repository::{
    delete_offer_file as remove_offer_file, get_offer_file, insert_offer_file,
    list_offer_files as load_offer_files,
};
use crate::models::enums::ExtractionStatus;
use crate::models::OfferFile;
use crate::pipeline::extraction::{format_file_size, is_valid_file_type};
use crate::storage::build_storage_path;

/// Lifetime of download links handed to clients.
pub const DOWNLOAD_URL_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// An uploaded file as received from the transport.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Store an uploaded file and queue it for extraction.
///
/// Returns once the row is `pending`; extraction runs in the background.
pub async fn upload_offer_file(
    core: &CoreState,
    user_id: &Uuid,
    workspace_id: &Uuid,
    offer_id: &Uuid,
    upload: FileUpload,
) -> Result<OfferFile, ActionError> {
    let file_name = upload.file_name.trim().to_string();
    if file_name.is_empty() || upload.bytes.is_empty() {
        return Err(ActionError::InvalidInput("Missing required fields".into()));
    }
    if !is_valid_file_type(&upload.mime) {
        return Err(ActionError::InvalidInput(format!(
            "Invalid file type: {}. Supported: PDF, Word, MP4, MOV, AVI, MP3, WAV, M4A, TXT",
            upload.mime
        )));
    }
    let limit = core.config.max_upload_bytes();
    if upload.bytes.len() > limit {
        return Err(ActionError::PayloadTooLarge { limit_bytes: limit });
    }

    {
        let conn = core.open_db()?;
        owned_workspace(&conn, user_id, workspace_id)?;
        let context = owned_offer_context(&conn, user_id, offer_id)?;
        if context.workspace_id != *workspace_id {
            return Err(ActionError::NotFound("Offer context".into()));
        }
    }

    let size = upload.bytes.len();
    let path = build_storage_path(workspace_id, offer_id, &file_name, &upload.mime);
    let storage_path = core.store().upload(&path, upload.bytes, &upload.mime).await?;

    let now = now_timestamp();
    let file = OfferFile {
        id: Uuid::new_v4(),
        workspace_id: *workspace_id,
        offer_id: *offer_id,
        file_name,
        file_type: upload.mime,
        file_size: size as i64,
        storage_path,
        extraction_status: ExtractionStatus::Pending,
        extracted_content: None,
        summary: None,
        metadata: None,
        created_at: now,
        updated_at: now,
    };

    let inserted = core
        .open_db()
        .map_err(ActionError::from)
        .and_then(|conn| insert_offer_file(&conn, &file).map_err(ActionError::from));
    if let Err(e) = inserted {
        if let Err(cleanup) = core.store().delete(&file.storage_path).await {
            tracing::warn!(path = %file.storage_path, error = %cleanup, "Failed to remove orphaned object");
        }
        return Err(e);
    }

    tracing::info!(
        file_id = %file.id,
        offer_id = %offer_id,
        size = %format_file_size(size as u64),
        "Offer file uploaded"
    );

    // A pending row is picked up again at the next startup
    if let Err(e) = core.extraction_queue().enqueue(file.id) {
        tracing::warn!(file_id = %file.id, error = %e, "Could not queue extraction");
    }
    Ok(file)
}

/// Files of an offer context, newest first.
pub fn list_offer_files(core: &CoreState, user_id: &Uuid, offer_id: &Uuid) -> Result<Vec<OfferFile>, ActionError> {
    let conn = core.open_db()?;
    owned_offer_context(&conn, user_id, offer_id)?;
    Ok(load_offer_files(&conn, offer_id)?)
}

/// Remove the stored object, then the row.
pub async fn delete_offer_file(core: &CoreState, user_id: &Uuid, file_id: &Uuid) -> Result<(), ActionError> {
    let file = owned_file(core, user_id, file_id)?;
    core.store().delete(&file.storage_path).await?;

    let conn = core.open_db()?;
    remove_offer_file(&conn, file_id)?;
    tracing::info!(file_id = %file_id, "Offer file deleted");
    Ok(())
}

/// Signed download link, valid for two hours.
pub async fn file_download_url(core: &CoreState, user_id: &Uuid, file_id: &Uuid) -> Result<String, ActionError> {
    let file = owned_file(core, user_id, file_id)?;
    Ok(core.store().signed_url(&file.storage_path, DOWNLOAD_URL_TTL).await?)
}

fn owned_file(core: &CoreState, user_id: &Uuid, file_id: &Uuid) -> Result<OfferFile, ActionError> {
    let conn = core.open_db()?;
    let file = get_offer_file(&conn, file_id)?.ok_or_else(|| ActionError::NotFound("File".into()))?;
    owned_workspace(&conn, user_id, &file.workspace_id).map_err(|_| ActionError::NotFound("File".into()))?;
    Ok(file)
}
