use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;

use crate::models::enums::SectionStatus;
use crate::models::{OfferContext, ReportMetadata, SectionState};
use crate::pipeline::llm::{GenerationRequest, LlmClient, LlmError};

use super::prompt::{
    build_context_prompt, build_refine_prompt, build_regenerate_prompt, build_section_prompt,
};
use super::retry::{generate_with_retry, RetryPolicy, Sleeper, TokioSleeper};
use super::sections::ReportSection;
use super::ReportError;

pub const SECTION_ERROR_PLACEHOLDER: &str =
    "*Error generating this section. Please try regenerating.*";

/// Pause between consecutive section calls in serialized mode.
pub const DEFAULT_SECTION_DELAY: Duration = Duration::from_secs(15);

const SECTION_TEMPERATURE: f32 = 0.7;
const SECTION_MAX_TOKENS: u32 = 1500;

/// How section calls are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOut {
    /// All sections at once.
    Concurrent,
    /// One section at a time with `delay` between calls.
    Serialized { delay: Duration },
}

impl Default for FanOut {
    fn default() -> Self {
        FanOut::Serialized {
            delay: DEFAULT_SECTION_DELAY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SectionOutcome {
    pub section: ReportSection,
    /// Generated markdown, or the placeholder when generation failed.
    pub content: String,
    pub status: SectionStatus,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub content: String,
    pub sections: Vec<SectionOutcome>,
}

impl GeneratedReport {
    /// Per-section status map stored alongside the document.
    pub fn metadata(&self, base: &ReportMetadata) -> ReportMetadata {
        let now = Utc::now().to_rfc3339();
        let mut metadata = base.clone();
        for outcome in &self.sections {
            metadata.sections.insert(
                outcome.section.as_str().to_string(),
                SectionState {
                    status: outcome.status,
                    last_updated: now.clone(),
                },
            );
        }
        metadata
    }

    pub fn failed_sections(&self) -> Vec<ReportSection> {
        self.sections
            .iter()
            .filter(|o| o.status == SectionStatus::Pending)
            .map(|o| o.section)
            .collect()
    }
}

pub struct ReportGenerator {
    llm: Arc<dyn LlmClient>,
    sleeper: Arc<dyn Sleeper>,
    retry: RetryPolicy,
    fan_out: FanOut,
}

impl ReportGenerator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            sleeper: Arc::new(TokioSleeper),
            retry: RetryPolicy::default(),
            fan_out: FanOut::default(),
        }
    }

    pub fn with_fan_out(mut self, fan_out: FanOut) -> Self {
        self.fan_out = fan_out;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Generate every section and assemble the document.
    ///
    /// Never fails: sections that cannot be generated carry the placeholder
    /// and are reported as pending.
    pub async fn generate(&self, context: &OfferContext, summaries: &[String]) -> GeneratedReport {
        let context_prompt = build_context_prompt(context, summaries);

        tracing::info!(
            product = %context.product_name,
            sections = ReportSection::ALL.len(),
            summaries = summaries.len(),
            fan_out = ?self.fan_out,
            "Generating sales report"
        );

        let outcomes = match self.fan_out {
            FanOut::Concurrent => {
                join_all(
                    ReportSection::ALL
                        .iter()
                        .map(|section| self.generate_section(*section, &context_prompt)),
                )
                .await
            }
            FanOut::Serialized { delay } => {
                let mut outcomes = Vec::with_capacity(ReportSection::ALL.len());
                for (i, section) in ReportSection::ALL.iter().enumerate() {
                    if i > 0 && !delay.is_zero() {
                        self.sleeper.sleep(delay).await;
                    }
                    outcomes.push(self.generate_section(*section, &context_prompt).await);
                }
                outcomes
            }
        };

        let date = Utc::now().format("%-m/%-d/%Y").to_string();
        let content = assemble_report(&context.product_name, &date, &outcomes);

        let failed = outcomes
            .iter()
            .filter(|o| o.status == SectionStatus::Pending)
            .count();
        tracing::info!(failed_sections = failed, "Sales report generation complete");

        GeneratedReport {
            content,
            sections: outcomes,
        }
    }

    async fn generate_section(&self, section: ReportSection, context_prompt: &str) -> SectionOutcome {
        let request = GenerationRequest::new(build_section_prompt(context_prompt, section))
            .temperature(SECTION_TEMPERATURE)
            .max_output_tokens(SECTION_MAX_TOKENS);

        let result = generate_with_retry(
            &*self.llm,
            &*self.sleeper,
            &self.retry,
            &request,
            section.as_str(),
        )
        .await
        .and_then(non_blank);

        match result {
            Ok(content) => SectionOutcome {
                section,
                content,
                status: SectionStatus::Complete,
                error: None,
            },
            Err(e) => {
                tracing::warn!(
                    section = section.as_str(),
                    error = %e,
                    "Section generation failed, substituting placeholder"
                );
                SectionOutcome {
                    section,
                    content: SECTION_ERROR_PLACEHOLDER.to_string(),
                    status: SectionStatus::Pending,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Regenerate one section with extra instructions. Errors propagate.
    pub async fn regenerate_section(
        &self,
        section: ReportSection,
        context: &OfferContext,
        summaries: &[String],
        instructions: &str,
    ) -> Result<String, ReportError> {
        let context_prompt = build_context_prompt(context, summaries);
        let request =
            GenerationRequest::new(build_regenerate_prompt(&context_prompt, section, instructions))
                .temperature(SECTION_TEMPERATURE)
                .max_output_tokens(SECTION_MAX_TOKENS);

        let text = generate_with_retry(
            &*self.llm,
            &*self.sleeper,
            &self.retry,
            &request,
            section.as_str(),
        )
        .await
        .and_then(non_blank)?;
        Ok(text)
    }

    /// Rewrite a section body according to a user request.
    pub async fn refine_section(
        &self,
        current_content: &str,
        user_message: &str,
    ) -> Result<String, ReportError> {
        let request = GenerationRequest::new(build_refine_prompt(current_content, user_message))
            .temperature(SECTION_TEMPERATURE)
            .max_output_tokens(SECTION_MAX_TOKENS);

        let text = generate_with_retry(&*self.llm, &*self.sleeper, &self.retry, &request, "refine")
            .await
            .and_then(non_blank)?;
        Ok(text)
    }
}

fn non_blank(text: String) -> Result<String, LlmError> {
    if text.trim().is_empty() {
        Err(LlmError::EmptyResponse)
    } else {
        Ok(text)
    }
}

/// Render the report document. Sections appear in the order given.
pub fn assemble_report(product_name: &str, date: &str, sections: &[SectionOutcome]) -> String {
    let mut report = format!("# Sales Report: {product_name}\n\n*Generated on {date}*\n\n---\n\n");
    for outcome in sections {
        report.push_str(&outcome.section.heading());
        report.push_str("\n\n");
        report.push_str(&outcome.content);
        report.push_str("\n\n---\n\n");
    }
    report
}

/// Replace the body of `section` inside an assembled document.
///
/// Returns `None` when the document has no heading for that section.
pub fn replace_section_content(
    document: &str,
    section: ReportSection,
    new_content: &str,
) -> Option<String> {
    let heading = format!("{}\n\n", section.heading());
    let start = document.find(&heading)?;
    let body_start = start + heading.len();

    // The body runs until the next known section heading.
    let body_end = ReportSection::ALL
        .iter()
        .filter(|s| **s != section)
        .filter_map(|s| {
            let next = format!("\n{}\n", s.heading());
            document[body_start..].find(&next).map(|i| body_start + i + 1)
        })
        .min()
        .unwrap_or(document.len());

    let mut updated = String::with_capacity(document.len() + new_content.len());
    updated.push_str(&document[..body_start]);
    updated.push_str(new_content.trim());
    updated.push_str("\n\n---\n\n");
    updated.push_str(&document[body_end..]);
    Some(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::llm::MockLlmClient;
    use crate::pipeline::report::retry::RecordingSleeper;
    use async_trait::async_trait;
    use chrono::NaiveDateTime;
    use std::sync::Mutex;
    use uuid::Uuid;

    fn context() -> OfferContext {
        OfferContext {
            id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            product_name: "X".into(),
            category: "Course".into(),
            target_audience: "Solo founders".into(),
            main_problem: "Inconsistent revenue".into(),
            key_features: vec!["Weekly calls".into()],
            price_point: "$997".into(),
            geographic_focus: "Global".into(),
            usp: "Results in 30 days".into(),
            additional_context: None,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    fn section_of(request: &GenerationRequest) -> Option<ReportSection> {
        ReportSection::ALL
            .into_iter()
            .find(|s| request.prompt.contains(s.metadata().prompt))
    }

    fn concurrent(llm: Arc<dyn LlmClient>, sleeper: Arc<RecordingSleeper>) -> ReportGenerator {
        ReportGenerator::new(llm)
            .with_fan_out(FanOut::Concurrent)
            .with_sleeper(sleeper)
    }

    /// Resolves later sections first and records completion order.
    struct ReverseOrderClient {
        completed: Mutex<Vec<ReportSection>>,
    }

    #[async_trait]
    impl LlmClient for ReverseOrderClient {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
            let section = section_of(request).ok_or(LlmError::EmptyResponse)?;
            let index = ReportSection::ALL.iter().position(|s| *s == section).unwrap_or(0);
            let delay = (ReportSection::ALL.len() - index) as u64 * 5;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.completed.lock().unwrap().push(section);
            Ok(format!("Body for {}", section.as_str()))
        }

        fn model_name(&self) -> &str {
            "reverse"
        }
    }

    fn heading_positions(content: &str) -> Vec<usize> {
        ReportSection::ALL
            .iter()
            .map(|s| content.find(&s.heading()).expect("heading present"))
            .collect()
    }

    #[tokio::test]
    async fn headings_follow_declared_order_regardless_of_completion() {
        let client = Arc::new(ReverseOrderClient {
            completed: Mutex::new(Vec::new()),
        });
        let generator = concurrent(client.clone(), Arc::new(RecordingSleeper::default()));

        let report = generator.generate(&context(), &[]).await;

        let completed = client.completed.lock().unwrap().clone();
        assert_eq!(completed.len(), 14);
        assert_eq!(completed[0], ReportSection::ValuePerception);

        let positions = heading_positions(&report.content);
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        for section in ReportSection::ALL {
            assert!(report
                .content
                .contains(&format!("Body for {}", section.as_str())));
        }
    }

    #[tokio::test]
    async fn issues_one_call_per_section() {
        let llm = Arc::new(MockLlmClient::new("Section body"));
        let report = concurrent(llm.clone(), Arc::new(RecordingSleeper::default()))
            .generate(&context(), &[])
            .await;

        assert_eq!(llm.call_count(), 14);
        assert!(report.failed_sections().is_empty());
        for request in llm.requests() {
            assert_eq!(request.temperature, Some(0.7));
            assert_eq!(request.max_output_tokens, Some(1500));
            assert!(!request.json_output);
        }
    }

    #[tokio::test]
    async fn persistent_rate_limit_yields_placeholder_for_that_section_only() {
        let pricing_prompt = ReportSection::PricingStrategy.metadata().prompt;
        let llm = Arc::new(MockLlmClient::from_fn(move |req| {
            if req.prompt.contains(pricing_prompt) {
                Err(LlmError::RateLimited("quota exceeded".into()))
            } else {
                Ok("Solid content".into())
            }
        }));
        let sleeper = Arc::new(RecordingSleeper::default());

        let report = concurrent(llm.clone(), sleeper.clone())
            .generate(&context(), &[])
            .await;

        assert_eq!(llm.call_count(), 13 + 4);
        assert_eq!(sleeper.waits(), vec![Duration::from_secs(35); 3]);
        assert_eq!(report.failed_sections(), vec![ReportSection::PricingStrategy]);
        assert_eq!(report.content.matches(SECTION_ERROR_PLACEHOLDER).count(), 1);
        assert_eq!(report.content.matches("Solid content").count(), 13);

        let expected = format!(
            "{}\n\n{}\n\n---",
            ReportSection::PricingStrategy.heading(),
            SECTION_ERROR_PLACEHOLDER
        );
        assert!(report.content.contains(&expected));
    }

    #[tokio::test]
    async fn blank_response_is_treated_as_failure() {
        let llm = Arc::new(MockLlmClient::new("   "));
        let report = concurrent(llm, Arc::new(RecordingSleeper::default()))
            .generate(&context(), &[])
            .await;

        assert_eq!(report.failed_sections().len(), 14);
    }

    #[tokio::test]
    async fn serialized_mode_paces_calls() {
        let llm = Arc::new(MockLlmClient::new("Body"));
        let sleeper = Arc::new(RecordingSleeper::default());
        let generator = ReportGenerator::new(llm.clone()).with_sleeper(sleeper.clone());

        generator.generate(&context(), &[]).await;

        assert_eq!(llm.call_count(), 14);
        assert_eq!(sleeper.waits(), vec![DEFAULT_SECTION_DELAY; 13]);
    }

    #[tokio::test]
    async fn serialized_requests_are_issued_in_declared_order() {
        let llm = Arc::new(MockLlmClient::new("Body"));
        let generator = ReportGenerator::new(llm.clone())
            .with_fan_out(FanOut::Serialized {
                delay: Duration::ZERO,
            })
            .with_sleeper(Arc::new(RecordingSleeper::default()));

        generator.generate(&context(), &[]).await;

        let order: Vec<_> = llm.requests().iter().filter_map(section_of).collect();
        assert_eq!(order, ReportSection::ALL.to_vec());
    }

    #[tokio::test]
    async fn end_to_end_document_shape() {
        let llm = Arc::new(MockLlmClient::new("Insightful analysis."));
        let report = concurrent(llm, Arc::new(RecordingSleeper::default()))
            .generate(&context(), &[])
            .await;

        assert!(report.content.starts_with("# Sales Report: X\n\n*Generated on "));
        assert_eq!(report.content.matches("\n## ").count(), 14);
        let positions = heading_positions(&report.content);
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        for section in ReportSection::ALL {
            let block = format!("{}\n\nInsightful analysis.\n\n---\n\n", section.heading());
            assert!(report.content.contains(&block), "missing body for {section}");
        }
    }

    #[tokio::test]
    async fn metadata_marks_failed_sections_pending() {
        let llm = Arc::new(MockLlmClient::new("ok").with_script(vec![Err(LlmError::Provider {
            status: 500,
            body: "boom".into(),
        })]));
        let generator = ReportGenerator::new(llm)
            .with_fan_out(FanOut::Serialized {
                delay: Duration::ZERO,
            })
            .with_sleeper(Arc::new(RecordingSleeper::default()));

        let report = generator.generate(&context(), &[]).await;
        let metadata = report.metadata(&ReportMetadata::default());

        assert_eq!(metadata.sections.len(), 14);
        assert_eq!(metadata.sections["positioning"].status, SectionStatus::Pending);
        assert_eq!(metadata.sections["revenue_model"].status, SectionStatus::Complete);
    }

    #[test]
    fn assemble_report_exact_format() {
        let sections = vec![SectionOutcome {
            section: ReportSection::Positioning,
            content: "Own the category.".into(),
            status: SectionStatus::Complete,
            error: None,
        }];
        assert_eq!(
            assemble_report("Acme", "1/15/2024", &sections),
            "# Sales Report: Acme\n\n*Generated on 1/15/2024*\n\n---\n\n## 📊 Offer Positioning Analysis\n\nOwn the category.\n\n---\n\n"
        );
    }

    #[test]
    fn replaces_only_the_target_section_body() {
        let outcome = |section, content: &str| SectionOutcome {
            section,
            content: content.into(),
            status: SectionStatus::Complete,
            error: None,
        };
        let doc = assemble_report(
            "Acme",
            "1/1/2025",
            &[
                outcome(ReportSection::Positioning, "Old positioning\n\n---\n\nwith a rule"),
                outcome(ReportSection::RevenueModel, "Revenue body"),
            ],
        );

        let updated =
            replace_section_content(&doc, ReportSection::Positioning, "New positioning").unwrap();
        assert!(updated.contains("## 📊 Offer Positioning Analysis\n\nNew positioning\n\n---\n\n## 💰"));
        assert!(!updated.contains("Old positioning"));
        assert!(updated.ends_with("Revenue body\n\n---\n\n"));

        let last =
            replace_section_content(&updated, ReportSection::RevenueModel, "Fresh revenue").unwrap();
        assert!(last.ends_with("## 💰 Revenue Model Architecture\n\nFresh revenue\n\n---\n\n"));
    }

    #[test]
    fn replace_returns_none_for_missing_heading() {
        assert!(replace_section_content("# Sales Report: X\n\n", ReportSection::UseCases, "x").is_none());
    }

    #[tokio::test]
    async fn regenerate_includes_instructions_and_propagates_errors() {
        let llm = Arc::new(MockLlmClient::new("Regenerated"));
        let generator = ReportGenerator::new(llm.clone())
            .with_sleeper(Arc::new(RecordingSleeper::default()));

        let text = generator
            .regenerate_section(ReportSection::UseCases, &context(), &["Summary".into()], "Focus on agencies")
            .await
            .unwrap();
        assert_eq!(text, "Regenerated");
        let prompt = &llm.requests()[0].prompt;
        assert!(prompt.contains("Additional Instructions: Focus on agencies"));
        assert!(prompt.contains("### File 1\nSummary"));

        let failing = ReportGenerator::new(Arc::new(MockLlmClient::failing(LlmError::MissingApiKey)))
            .with_sleeper(Arc::new(RecordingSleeper::default()));
        let err = failing
            .regenerate_section(ReportSection::UseCases, &context(), &[], "x")
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Llm(LlmError::MissingApiKey)));
    }

    #[tokio::test]
    async fn refine_sends_current_content() {
        let llm = Arc::new(MockLlmClient::new("Shorter body"));
        let generator = ReportGenerator::new(llm.clone());

        let text = generator.refine_section("Long body", "Shorten it").await.unwrap();
        assert_eq!(text, "Shorter body");
        assert!(llm.requests()[0].prompt.contains("User request: Shorten it"));
    }
}
