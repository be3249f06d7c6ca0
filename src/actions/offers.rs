use uuid::Uuid;

use super::{owned_workspace, ActionError};
use crate::core_state::CoreState;
use crate::db::now_timestamp;
use crate::db::repository::{get_offer as load_offer, insert_offer, list_offers as load_offers};
use crate::models::enums::OfferStatus;
use crate::models::{Offer, OfferAnalysis, OfferInput};
use crate::pipeline::analyzer::{analyze_offer_or_fallback, AnalysisOutcome};

const DEFAULT_OFFER_NAME: &str = "New Offer";

/// Analyze raw offer text. Falls back to the canned analysis when the model
/// fails and fallback is enabled; the outcome says which one happened.
pub async fn analyze_offer(core: &CoreState, content: &str) -> Result<AnalysisOutcome, ActionError> {
    let outcome =
        analyze_offer_or_fallback(core.llm(), content, core.config.analysis_mock_fallback).await?;
    Ok(outcome)
}

pub fn save_offer(
    core: &CoreState,
    user_id: &Uuid,
    workspace_id: &Uuid,
    input: &OfferInput,
    analysis: OfferAnalysis,
) -> Result<Offer, ActionError> {
    let conn = core.open_db()?;
    owned_workspace(&conn, user_id, workspace_id)?;

    let offer = Offer {
        id: Uuid::new_v4(),
        workspace_id: *workspace_id,
        user_id: *user_id,
        name: analysis.first_headline().unwrap_or(DEFAULT_OFFER_NAME).to_string(),
        status: OfferStatus::Analyzed,
        input_type: input.input_type,
        input_value: input.value().to_string(),
        analysis,
        created_at: now_timestamp(),
    };
    insert_offer(&conn, &offer)?;
    tracing::info!(offer_id = %offer.id, workspace_id = %workspace_id, "Offer saved");
    Ok(offer)
}

pub fn get_offer(core: &CoreState, user_id: &Uuid, offer_id: &Uuid) -> Result<Offer, ActionError> {
    let conn = core.open_db()?;
    let offer = load_offer(&conn, offer_id)?.ok_or_else(|| ActionError::NotFound("Offer".into()))?;
    owned_workspace(&conn, user_id, &offer.workspace_id)
        .map_err(|_| ActionError::NotFound("Offer".into()))?;
    Ok(offer)
}

/// Offers of a workspace, newest first.
pub fn list_offers(core: &CoreState, user_id: &Uuid, workspace_id: &Uuid) -> Result<Vec<Offer>, ActionError> {
    let conn = core.open_db()?;
    owned_workspace(&conn, user_id, workspace_id)?;
    Ok(load_offers(&conn, workspace_id)?)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::actions::fixtures::owner;
    use crate::core_state::test_core;
    use crate::models::enums::OfferInputType;
    use crate::pipeline::analyzer::mock_analysis;
    use crate::pipeline::llm::{LlmError, MockLlmClient};

    fn text_input(text: &str) -> OfferInput {
        OfferInput {
            input_type: OfferInputType::RawText,
            text: Some(text.into()),
            url: None,
            file_content: None,
        }
    }

    #[test]
    fn saved_offer_is_named_after_first_headline() {
        let t = test_core(Arc::new(MockLlmClient::new("ok")));
        let o = owner(&t.core, "ada@example.com");
        let analysis = mock_analysis();
        let headline = analysis.copy_angles.headlines[0].clone();

        let offer = save_offer(&t.core, &o.user.id, &o.workspace.id, &text_input("My course"), analysis).unwrap();
        assert_eq!(offer.name, headline);
        assert_eq!(offer.status, OfferStatus::Analyzed);
        assert_eq!(offer.input_value, "My course");

        let loaded = get_offer(&t.core, &o.user.id, &offer.id).unwrap();
        assert_eq!(loaded.analysis, offer.analysis);
        assert_eq!(list_offers(&t.core, &o.user.id, &o.workspace.id).unwrap().len(), 1);
    }

    #[test]
    fn offer_without_headline_gets_default_name() {
        let t = test_core(Arc::new(MockLlmClient::new("ok")));
        let o = owner(&t.core, "ada@example.com");
        let mut analysis = mock_analysis();
        analysis.copy_angles.headlines.clear();

        let offer = save_offer(&t.core, &o.user.id, &o.workspace.id, &text_input("x"), analysis).unwrap();
        assert_eq!(offer.name, "New Offer");
    }

    #[test]
    fn other_users_cannot_see_offers() {
        let t = test_core(Arc::new(MockLlmClient::new("ok")));
        let ada = owner(&t.core, "ada@example.com");
        let bob = owner(&t.core, "bob@example.com");
        let offer = save_offer(&t.core, &ada.user.id, &ada.workspace.id, &text_input("x"), mock_analysis()).unwrap();

        assert!(matches!(get_offer(&t.core, &bob.user.id, &offer.id), Err(ActionError::NotFound(_))));
        assert!(matches!(
            save_offer(&t.core, &bob.user.id, &ada.workspace.id, &text_input("x"), mock_analysis()),
            Err(ActionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn analysis_falls_back_visibly() {
        let t = test_core(Arc::new(MockLlmClient::failing(LlmError::Unavailable("down".into()))));
        let outcome = analyze_offer(&t.core, "A coaching program").await.unwrap();
        assert!(outcome.fallback_reason().is_some());
        assert_eq!(outcome.analysis(), &mock_analysis());
    }

    #[tokio::test]
    async fn empty_analysis_input_rejected() {
        let t = test_core(Arc::new(MockLlmClient::new("{}")));
        assert!(matches!(analyze_offer(&t.core, "  ").await, Err(ActionError::InvalidInput(_))));
    }
}
