use uuid::Uuid;

use super::offers::get_offer;
use super::{owned_workspace, ActionError};
use crate::core_state::CoreState;
use crate::db::now_timestamp;
use crate::db::repository::{get_funnel as load_funnel, get_funnel_pages, insert_funnel_with_pages};
use crate::models::enums::FunnelStatus;
use crate::models::{Funnel, FunnelWithPages};
use crate::pipeline::funnel::{build_funnel_pages, DEFAULT_PAGE_TYPES};

/// Generate lead, sales and thank-you pages for an offer and store them as a
/// draft funnel. Nothing is written unless every page was generated.
pub async fn create_funnel_from_offer(
    core: &CoreState,
    user_id: &Uuid,
    offer_id: &Uuid,
) -> Result<Uuid, ActionError> {
    let offer = get_offer(core, user_id, offer_id)?;

    let funnel = Funnel {
        id: Uuid::new_v4(),
        workspace_id: offer.workspace_id,
        offer_id: offer.id,
        user_id: *user_id,
        name: format!("{} Funnel", offer.name),
        status: FunnelStatus::Draft,
        created_at: now_timestamp(),
    };

    let pages = build_funnel_pages(core.llm(), &offer.analysis, funnel.id, &DEFAULT_PAGE_TYPES).await?;

    let conn = core.open_db()?;
    insert_funnel_with_pages(&conn, &funnel, &pages)?;
    tracing::info!(funnel_id = %funnel.id, offer_id = %offer_id, pages = pages.len(), "Funnel created");
    Ok(funnel.id)
}

/// A funnel with its pages sorted by `order_index`.
pub fn get_funnel(core: &CoreState, user_id: &Uuid, funnel_id: &Uuid) -> Result<FunnelWithPages, ActionError> {
    let conn = core.open_db()?;
    let funnel = load_funnel(&conn, funnel_id)?.ok_or_else(|| ActionError::NotFound("Funnel".into()))?;
    owned_workspace(&conn, user_id, &funnel.workspace_id)
        .map_err(|_| ActionError::NotFound("Funnel".into()))?;

    let mut pages = get_funnel_pages(&conn, funnel_id)?;
    pages.sort_by_key(|p| p.order_index);
    Ok(FunnelWithPages { funnel, pages })
}
