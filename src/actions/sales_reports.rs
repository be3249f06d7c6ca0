use std::str::FromStr;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::offer_contexts::owned_offer_context;
use super::{owned_workspace, required, ActionError};
use crate::core_state::CoreState;
use crate::db::now_timestamp;
use crate::db::repository::{
    create_report_version as snapshot_report, delete_sales_report as remove_sales_report,
    get_offer_context, get_sales_report as load_sales_report, insert_sales_report,
    list_completed_summaries, list_report_versions as load_report_versions,
    list_sales_reports as load_sales_reports, save_generated_report, update_report_content as store_report_content,
    update_report_document, update_report_status,
};
use crate::models::enums::{ReportStatus, SectionStatus};
use crate::models::{OfferContext, ReportMetadata, ReportVersion, SalesReport, SectionState};
use crate::pipeline::report::{replace_section_content, ReportSection};

/// Outcome of a full generation run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSummary {
    pub report: SalesReport,
    /// Sections that carry the error placeholder.
    pub failed_sections: Vec<ReportSection>,
}

pub fn create_sales_report(
    core: &CoreState,
    user_id: &Uuid,
    workspace_id: &Uuid,
    offer_id: &Uuid,
    title: &str,
) -> Result<SalesReport, ActionError> {
    let title = required("Title", title)?;
    let conn = core.open_db()?;
    owned_workspace(&conn, user_id, workspace_id)?;
    let context = owned_offer_context(&conn, user_id, offer_id)?;
    if context.workspace_id != *workspace_id {
        return Err(ActionError::NotFound("Offer context".into()));
    }

    let now = now_timestamp();
    let report = SalesReport {
        id: Uuid::new_v4(),
        workspace_id: *workspace_id,
        offer_id: *offer_id,
        title,
        status: ReportStatus::Draft,
        content: String::new(),
        metadata: ReportMetadata::default(),
        version: 1,
        created_at: now,
        updated_at: now,
    };
    insert_sales_report(&conn, &report)?;
    tracing::info!(report_id = %report.id, offer_id = %offer_id, "Sales report created");
    Ok(report)
}

/// Generate every section from the offer context and the summaries of its
/// completed files, then store the document, section statuses and a version
/// snapshot.
///
/// Only one generation per report runs at a time. Any failure leaves the
/// report in `draft`.
pub async fn generate_report_content(
    core: &CoreState,
    user_id: &Uuid,
    report_id: &Uuid,
) -> Result<GenerationSummary, ActionError> {
    let Some(_claim) = core.begin_generation(*report_id)? else {
        return Err(ActionError::Conflict("report generation already in progress".into()));
    };

    let (report, context, summaries) = {
        let conn = core.open_db()?;
        let report = owned_report(&conn, user_id, report_id)?;
        let context = report_context(&conn, &report)?;
        let summaries = list_completed_summaries(&conn, &report.offer_id)?;
        update_report_status(&conn, report_id, ReportStatus::Generating)?;
        (report, context, summaries)
    };

    let generated = core.report_generator().generate(&context, &summaries).await;
    let metadata = generated.metadata(&report.metadata);

    let saved = core
        .open_db()
        .map_err(ActionError::from)
        .and_then(|conn| {
            save_generated_report(&conn, report_id, &generated.content, &metadata)?;
            load_sales_report(&conn, report_id)?.ok_or_else(|| ActionError::NotFound("Sales report".into()))
        });

    match saved {
        Ok(report) => {
            let failed_sections = generated.failed_sections();
            tracing::info!(
                report_id = %report_id,
                failed = failed_sections.len(),
                "Sales report generated"
            );
            Ok(GenerationSummary {
                report,
                failed_sections,
            })
        }
        Err(e) => {
            tracing::error!(report_id = %report_id, error = %e, "Failed to store generated report");
            reset_to_draft(core, report_id);
            Err(e)
        }
    }
}

fn reset_to_draft(core: &CoreState, report_id: &Uuid) {
    let reset = core
        .open_db()
        .map_err(ActionError::from)
        .and_then(|conn| Ok(update_report_status(&conn, report_id, ReportStatus::Draft)?));
    if let Err(e) = reset {
        tracing::error!(report_id = %report_id, error = %e, "Failed to reset report status");
    }
}

/// Replace the document body. Version and status are unchanged.
pub fn update_report_content(
    core: &CoreState,
    user_id: &Uuid,
    report_id: &Uuid,
    content: &str,
) -> Result<SalesReport, ActionError> {
    let conn = core.open_db()?;
    owned_report(&conn, user_id, report_id)?;
    store_report_content(&conn, report_id, content)?;
    load_sales_report(&conn, report_id)?.ok_or_else(|| ActionError::NotFound("Sales report".into()))
}

pub fn get_sales_report(core: &CoreState, user_id: &Uuid, report_id: &Uuid) -> Result<SalesReport, ActionError> {
    let conn = core.open_db()?;
    owned_report(&conn, user_id, report_id)
}

/// Reports of a workspace, newest first.
pub fn list_sales_reports(
    core: &CoreState,
    user_id: &Uuid,
    workspace_id: &Uuid,
) -> Result<Vec<SalesReport>, ActionError> {
    let conn = core.open_db()?;
    owned_workspace(&conn, user_id, workspace_id)?;
    Ok(load_sales_reports(&conn, workspace_id)?)
}

pub fn delete_sales_report(core: &CoreState, user_id: &Uuid, report_id: &Uuid) -> Result<(), ActionError> {
    if core.is_generating(report_id) {
        return Err(ActionError::Conflict("report generation in progress".into()));
    }
    let conn = core.open_db()?;
    owned_report(&conn, user_id, report_id)?;
    remove_sales_report(&conn, report_id)?;
    tracing::info!(report_id = %report_id, "Sales report deleted");
    Ok(())
}

/// Snapshot the current content, then bump the version. Returns the new version.
pub fn create_report_version(core: &CoreState, user_id: &Uuid, report_id: &Uuid) -> Result<i64, ActionError> {
    let conn = core.open_db()?;
    owned_report(&conn, user_id, report_id)?;
    Ok(snapshot_report(&conn, report_id)?)
}

/// Version snapshots, newest first.
pub fn list_report_versions(
    core: &CoreState,
    user_id: &Uuid,
    report_id: &Uuid,
) -> Result<Vec<ReportVersion>, ActionError> {
    let conn = core.open_db()?;
    owned_report(&conn, user_id, report_id)?;
    Ok(load_report_versions(&conn, report_id)?)
}

/// Regenerate one section with optional extra instructions and splice it
/// into the stored document. Claims the report like a full generation.
pub async fn regenerate_report_section(
    core: &CoreState,
    user_id: &Uuid,
    report_id: &Uuid,
    section_key: &str,
    instructions: &str,
) -> Result<SalesReport, ActionError> {
    let section = ReportSection::from_str(section_key)?;
    // Held until the spliced document is stored so a full run cannot interleave
    let Some(_claim) = core.begin_generation(*report_id)? else {
        return Err(ActionError::Conflict("report generation in progress".into()));
    };

    let (report, context, summaries) = {
        let conn = core.open_db()?;
        let report = owned_report(&conn, user_id, report_id)?;
        let context = report_context(&conn, &report)?;
        let summaries = list_completed_summaries(&conn, &report.offer_id)?;
        (report, context, summaries)
    };

    let body = core
        .report_generator()
        .regenerate_section(section, &context, &summaries, instructions.trim())
        .await?;

    let content = replace_section_content(&report.content, section, &body).ok_or_else(|| {
        ActionError::Conflict(format!("report has no {} section, generate it first", section.as_str()))
    })?;

    let mut metadata = report.metadata.clone();
    metadata.sections.insert(
        section.as_str().to_string(),
        SectionState {
            status: SectionStatus::Complete,
            last_updated: Utc::now().to_rfc3339(),
        },
    );

    let conn = core.open_db()?;
    update_report_document(&conn, report_id, &content, &metadata)?;
    tracing::info!(report_id = %report_id, section = section.as_str(), "Report section regenerated");
    load_sales_report(&conn, report_id)?.ok_or_else(|| ActionError::NotFound("Sales report".into()))
}

/// Rewrite a section body according to the user's request. Nothing is stored.
pub async fn refine_report_section(
    core: &CoreState,
    current_content: &str,
    user_message: &str,
) -> Result<String, ActionError> {
    let current_content = required("Content", current_content)?;
    let user_message = required("Message", user_message)?;
    Ok(core
        .report_generator()
        .refine_section(&current_content, &user_message)
        .await?)
}

fn owned_report(conn: &rusqlite::Connection, user_id: &Uuid, report_id: &Uuid) -> Result<SalesReport, ActionError> {
    let report = load_sales_report(conn, report_id)?
        .ok_or_else(|| ActionError::NotFound("Sales report".into()))?;
    owned_workspace(conn, user_id, &report.workspace_id)
        .map_err(|_| ActionError::NotFound("Sales report".into()))?;
    Ok(report)
}

fn report_context(conn: &rusqlite::Connection, report: &SalesReport) -> Result<OfferContext, ActionError> {
    get_offer_context(conn, &report.offer_id)?.ok_or_else(|| ActionError::NotFound("Offer context".into()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::actions::fixtures::{offer_context, owner, Owner};
    use crate::core_state::{test_core, TestCore};
    use crate::db::repository::complete_extraction;
    use crate::models::FileMetadata;
    use crate::pipeline::llm::{LlmError, MockLlmClient};
    use crate::pipeline::report::SECTION_ERROR_PLACEHOLDER;

    fn report_for(t: &TestCore, o: &Owner) -> SalesReport {
        let ctx = offer_context(&t.core, o, "Widget");
        create_sales_report(&t.core, &o.user.id, &o.workspace.id, &ctx.id, "Launch plan").unwrap()
    }

    #[test]
    fn new_report_is_an_empty_draft() {
        let t = test_core(Arc::new(MockLlmClient::new("ok")));
        let o = owner(&t.core, "ada@example.com");
        let report = report_for(&t, &o);

        assert_eq!(report.status, ReportStatus::Draft);
        assert_eq!(report.content, "");
        assert_eq!(report.version, 1);
        assert!(report.metadata.sections.is_empty());
        assert_eq!(list_sales_reports(&t.core, &o.user.id, &o.workspace.id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn generation_stores_document_metadata_and_snapshot() {
        let llm = Arc::new(MockLlmClient::new("Section body."));
        let t = test_core(llm.clone());
        let o = owner(&t.core, "ada@example.com");
        let report = report_for(&t, &o);

        let summary = generate_report_content(&t.core, &o.user.id, &report.id).await.unwrap();

        assert_eq!(llm.call_count(), 14);
        assert!(summary.failed_sections.is_empty());
        let stored = summary.report;
        assert_eq!(stored.status, ReportStatus::Complete);
        assert!(stored.content.starts_with("# Sales Report: Widget"));
        assert_eq!(stored.metadata.sections.len(), 14);
        assert!(stored
            .metadata
            .sections
            .values()
            .all(|s| s.status == SectionStatus::Complete));

        let versions = list_report_versions(&t.core, &o.user.id, &report.id).unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].version, 1);
        assert_eq!(versions[0].content, stored.content);
        assert!(!t.core.is_generating(&report.id));
        // Serialized by default: one pause between each pair of sections
        assert_eq!(t.sleeper.waits(), vec![std::time::Duration::from_secs(15); 13]);
    }

    #[tokio::test]
    async fn completed_file_summaries_reach_the_prompt() {
        let llm = Arc::new(MockLlmClient::new("Body."));
        let t = test_core(llm.clone());
        let o = owner(&t.core, "ada@example.com");
        let report = report_for(&t, &o);

        let file = crate::actions::offer_files::upload_offer_file(
            &t.core,
            &o.user.id,
            &o.workspace.id,
            &report.offer_id,
            crate::actions::offer_files::FileUpload {
                file_name: "notes.txt".into(),
                mime: "text/plain".into(),
                bytes: b"raw".to_vec(),
            },
        )
        .await
        .unwrap();
        {
            let conn = t.core.open_db().unwrap();
            complete_extraction(&conn, &file.id, "raw", "Buyers love the templates.", &FileMetadata::default())
                .unwrap();
        }

        generate_report_content(&t.core, &o.user.id, &report.id).await.unwrap();
        let requests = llm.requests();
        assert!(requests[0].prompt.contains("### File 1\nBuyers love the templates."));
    }

    #[tokio::test]
    async fn failed_sections_stay_pending() {
        let t = test_core(Arc::new(MockLlmClient::failing(LlmError::Provider {
            status: 400,
            body: "bad request".into(),
        })));
        let o = owner(&t.core, "ada@example.com");
        let report = report_for(&t, &o);

        let summary = generate_report_content(&t.core, &o.user.id, &report.id).await.unwrap();
        assert_eq!(summary.failed_sections.len(), 14);
        assert_eq!(summary.report.status, ReportStatus::Complete);
        assert!(summary.report.content.contains(SECTION_ERROR_PLACEHOLDER));
        assert!(summary
            .report
            .metadata
            .sections
            .values()
            .all(|s| s.status == SectionStatus::Pending));
    }

    #[tokio::test]
    async fn concurrent_generation_is_rejected() {
        let t = test_core(Arc::new(MockLlmClient::new("Body.")));
        let o = owner(&t.core, "ada@example.com");
        let report = report_for(&t, &o);

        let claim = t.core.begin_generation(report.id).unwrap();
        assert!(claim.is_some());
        let err = generate_report_content(&t.core, &o.user.id, &report.id).await.unwrap_err();
        assert!(matches!(err, ActionError::Conflict(_)));
        assert!(matches!(
            delete_sales_report(&t.core, &o.user.id, &report.id),
            Err(ActionError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn foreign_user_cannot_generate() {
        let t = test_core(Arc::new(MockLlmClient::new("Body.")));
        let o = owner(&t.core, "ada@example.com");
        let report = report_for(&t, &o);
        let stranger = owner(&t.core, "bob@example.com");

        let err = generate_report_content(&t.core, &stranger.user.id, &report.id).await.unwrap_err();
        assert!(matches!(err, ActionError::NotFound(_)));
        let stored = get_sales_report(&t.core, &o.user.id, &report.id).unwrap();
        assert_eq!(stored.status, ReportStatus::Draft);
        assert!(!t.core.is_generating(&report.id));
    }

    #[test]
    fn versions_snapshot_then_increment() {
        let t = test_core(Arc::new(MockLlmClient::new("ok")));
        let o = owner(&t.core, "ada@example.com");
        let report = report_for(&t, &o);

        update_report_content(&t.core, &o.user.id, &report.id, "Draft one").unwrap();
        assert_eq!(create_report_version(&t.core, &o.user.id, &report.id).unwrap(), 2);
        update_report_content(&t.core, &o.user.id, &report.id, "Draft two").unwrap();
        assert_eq!(create_report_version(&t.core, &o.user.id, &report.id).unwrap(), 3);

        let versions = list_report_versions(&t.core, &o.user.id, &report.id).unwrap();
        let listed: Vec<(i64, &str)> = versions.iter().map(|v| (v.version, v.content.as_str())).collect();
        assert_eq!(listed, [(2, "Draft two"), (1, "Draft one")]);
        assert_eq!(get_sales_report(&t.core, &o.user.id, &report.id).unwrap().version, 3);
    }

    #[tokio::test]
    async fn regenerate_replaces_only_that_section() {
        let llm = Arc::new(MockLlmClient::from_fn(|req| {
            if req.prompt.contains("Be bolder") {
                Ok("Sharper pricing story.".into())
            } else {
                Ok("Original body.".into())
            }
        }));
        let t = test_core(llm.clone());
        let o = owner(&t.core, "ada@example.com");
        let report = report_for(&t, &o);
        generate_report_content(&t.core, &o.user.id, &report.id).await.unwrap();
        let before = get_sales_report(&t.core, &o.user.id, &report.id).unwrap();

        let updated =
            regenerate_report_section(&t.core, &o.user.id, &report.id, "pricing_strategy", "Be bolder")
                .await
                .unwrap();

        assert_eq!(llm.call_count(), 15);
        assert!(updated.content.contains("Sharper pricing story."));
        assert_eq!(
            updated.content.matches("Original body.").count(),
            before.content.matches("Original body.").count() - 1
        );
        assert!(updated.content.ends_with("---\n\n"));
        assert_eq!(updated.metadata.sections["pricing_strategy"].status, SectionStatus::Complete);
        assert_eq!(updated.version, before.version);
    }

    #[tokio::test]
    async fn regenerate_holds_the_generation_claim() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::OnceLock;

        let watched: Arc<OnceLock<(Arc<CoreState>, Uuid)>> = Arc::new(OnceLock::new());
        let claimed_during_call = Arc::new(AtomicBool::new(false));
        let llm = Arc::new(MockLlmClient::from_fn({
            let watched = watched.clone();
            let claimed_during_call = claimed_during_call.clone();
            move |_| {
                if let Some((core, id)) = watched.get() {
                    claimed_during_call.store(core.is_generating(id), Ordering::SeqCst);
                }
                Ok("Body.".into())
            }
        }));
        let t = test_core(llm);
        let o = owner(&t.core, "ada@example.com");
        let report = report_for(&t, &o);
        generate_report_content(&t.core, &o.user.id, &report.id).await.unwrap();
        assert!(watched.set((t.core.clone(), report.id)).is_ok());

        regenerate_report_section(&t.core, &o.user.id, &report.id, "positioning", "")
            .await
            .unwrap();
        assert!(claimed_during_call.load(Ordering::SeqCst));
        assert!(!t.core.is_generating(&report.id));

        let claim = t.core.begin_generation(report.id).unwrap();
        assert!(claim.is_some());
        assert!(matches!(
            regenerate_report_section(&t.core, &o.user.id, &report.id, "positioning", "").await,
            Err(ActionError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn regenerate_rejects_unknown_section_and_empty_report() {
        let t = test_core(Arc::new(MockLlmClient::new("Body.")));
        let o = owner(&t.core, "ada@example.com");
        let report = report_for(&t, &o);

        assert!(matches!(
            regenerate_report_section(&t.core, &o.user.id, &report.id, "nope", "").await,
            Err(ActionError::InvalidInput(_))
        ));
        assert!(matches!(
            regenerate_report_section(&t.core, &o.user.id, &report.id, "positioning", "").await,
            Err(ActionError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn refine_returns_rewritten_text() {
        let llm = Arc::new(MockLlmClient::new("Tighter copy."));
        let t = test_core(llm.clone());
        let refined = refine_report_section(&t.core, "Long copy.", "Make it shorter").await.unwrap();
        assert_eq!(refined, "Tighter copy.");
        assert!(llm.requests()[0].prompt.contains("Make it shorter"));

        assert!(matches!(
            refine_report_section(&t.core, "Long copy.", " ").await,
            Err(ActionError::InvalidInput(_))
        ));
    }
}
