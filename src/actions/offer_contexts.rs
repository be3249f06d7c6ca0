use serde::Deserialize;
use uuid::Uuid;

use super::{owned_workspace, required, ActionError};
use crate::core_state::CoreState;
use crate::db::now_timestamp;
use crate::db::repository::{
    delete_offer_context as remove_offer_context, get_offer_context as load_offer_context,
    list_offer_contexts as load_offer_contexts, list_offer_files, upsert_offer_context,
};
use crate::models::OfferContext;

/// Editable fields of an offer context. With `id` set the existing context
/// is updated in place.
#[derive(Debug, Clone, Deserialize)]
pub struct OfferContextInput {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub product_name: String,
    pub category: String,
    pub target_audience: String,
    pub main_problem: String,
    #[serde(default)]
    pub key_features: Option<Vec<String>>,
    pub price_point: String,
    pub geographic_focus: String,
    pub usp: String,
    #[serde(default)]
    pub additional_context: Option<String>,
}

pub fn save_offer_context(
    core: &CoreState,
    user_id: &Uuid,
    workspace_id: &Uuid,
    input: OfferContextInput,
) -> Result<OfferContext, ActionError> {
    let conn = core.open_db()?;
    owned_workspace(&conn, user_id, workspace_id)?;

    let now = now_timestamp();
    let (id, created_at) = match input.id {
        Some(id) => {
            let existing = load_offer_context(&conn, &id)?
                .filter(|c| c.workspace_id == *workspace_id)
                .ok_or_else(|| ActionError::NotFound("Offer context".into()))?;
            (existing.id, existing.created_at)
        }
        None => (Uuid::new_v4(), now),
    };

    let context = OfferContext {
        id,
        workspace_id: *workspace_id,
        product_name: required("Product name", &input.product_name)?,
        category: input.category.trim().to_string(),
        target_audience: input.target_audience.trim().to_string(),
        main_problem: input.main_problem.trim().to_string(),
        key_features: input
            .key_features
            .unwrap_or_default()
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect(),
        price_point: input.price_point.trim().to_string(),
        geographic_focus: input.geographic_focus.trim().to_string(),
        usp: input.usp.trim().to_string(),
        additional_context: input
            .additional_context
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
        created_at,
        updated_at: now,
    };
    upsert_offer_context(&conn, &context)?;
    tracing::info!(offer_id = %context.id, workspace_id = %workspace_id, "Offer context saved");
    Ok(context)
}

pub fn get_offer_context(core: &CoreState, user_id: &Uuid, offer_id: &Uuid) -> Result<OfferContext, ActionError> {
    let conn = core.open_db()?;
    owned_offer_context(&conn, user_id, offer_id)
}

/// Offer contexts of a workspace, newest first.
pub fn list_offer_contexts(
    core: &CoreState,
    user_id: &Uuid,
    workspace_id: &Uuid,
) -> Result<Vec<OfferContext>, ActionError> {
    let conn = core.open_db()?;
    owned_workspace(&conn, user_id, workspace_id)?;
    Ok(load_offer_contexts(&conn, workspace_id)?)
}

/// Delete an offer context together with its files and reports.
///
/// Stored objects are removed first; a failed object delete is logged and
/// does not block the row delete.
pub async fn delete_offer_context(core: &CoreState, user_id: &Uuid, offer_id: &Uuid) -> Result<(), ActionError> {
    let paths: Vec<String> = {
        let conn = core.open_db()?;
        owned_offer_context(&conn, user_id, offer_id)?;
        list_offer_files(&conn, offer_id)?
            .into_iter()
            .map(|f| f.storage_path)
            .collect()
    };

    for path in &paths {
        if let Err(e) = core.store().delete(path).await {
            tracing::warn!(path, error = %e, "Failed to delete stored object");
        }
    }

    let conn = core.open_db()?;
    if !remove_offer_context(&conn, offer_id)? {
        return Err(ActionError::NotFound("Offer context".into()));
    }
    tracing::info!(offer_id = %offer_id, files = paths.len(), "Offer context deleted");
    Ok(())
}

/// Load an offer context whose workspace belongs to `user_id`.
pub(crate) fn owned_offer_context(
    conn: &rusqlite::Connection,
    user_id: &Uuid,
    offer_id: &Uuid,
) -> Result<OfferContext, ActionError> {
    let context = load_offer_context(conn, offer_id)?
        .ok_or_else(|| ActionError::NotFound("Offer context".into()))?;
    owned_workspace(conn, user_id, &context.workspace_id)
        .map_err(|_| ActionError::NotFound("Offer context".into()))?;
    Ok(context)
}
