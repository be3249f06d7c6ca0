//! Offer Analyzer: free-text offer description in, Offer Intelligence Report out.

use thiserror::Error;

use crate::models::enums::{FunnelFlow, MarketSophistication};
use crate::models::{
    BonusSuggestion, CopyAngles, FunnelHealthScore, FunnelStep, FunnelStrategy, OfferAnalysis,
    Positioning, PricingStrategy, RecommendedUpsell, RevenueModel, UpsellStructure,
};
use crate::pipeline::llm::{parse_json_response, GenerationRequest, LlmClient, LlmError};

const SYSTEM_PROMPT: &str = r#"You are the world's best direct response copywriter and offer strategist (think Alex Hormozi meets Ogilvy).
Your goal is to analyze raw offer inputs and generate a structured "Offer Intelligence Report".

You must output valid JSON matching the following schema:
{
  "score": number (0-100),
  "summary": string,
  "positioning": {
    "target_audience": string,
    "primary_pain_point": string,
    "core_benefit": string,
    "market_sophistication": string (one of: "unaware", "problem_aware", "solution_aware", "product_aware", "most_aware"),
    "messaging_angles": string[]
  },
  "revenue_model": {
    "type": string,
    "monetization_strategy": string,
    "conversion_strategy": string
  },
  "pricing_strategy": {
    "suggested_price_point": string,
    "reasoning": string,
    "psychological_hooks": string[],
    "price_gap_analysis": string
  },
  "upsell_structure": {
    "recommended_upsells": [
      { "offer_name": string, "price_point": string, "reasoning": string }
    ]
  },
  "bonus_suggestions": [
     { "name": string, "value_proposition": string }
  ],
  "funnel_strategy": {
    "recommended_flow": string (one of: "lead_magnet_sales", "direct_sales", "webinar", "application"),
    "steps": [
      { "name": string, "purpose": string, "key_elements": string[] }
    ]
  },
  "copy_angles": {
    "headlines": string[],
    "hooks": string[],
    "email_subjects": string[]
  },
  "funnel_health_score": {
    "clarity": number,
    "monetization_depth": number,
    "pricing": number,
    "overall": number
  },
  "recommendations": string[]
}

Analyze deeply. Be critical. Focus on conversion and monetization.
Return ONLY the JSON object, no markdown formatting."#;

const ANALYSIS_TEMPERATURE: f32 = 0.7;
const ANALYSIS_MAX_TOKENS: u32 = 4096;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Offer content is empty")]
    EmptyInput,

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Analysis response is not valid JSON: {0}")]
    InvalidJson(String),
}

/// Result of an analysis that may have been substituted.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    Analyzed(OfferAnalysis),
    /// The model could not produce a report; `analysis` is the canned record.
    Fallback {
        analysis: OfferAnalysis,
        reason: String,
    },
}

impl AnalysisOutcome {
    pub fn analysis(&self) -> &OfferAnalysis {
        match self {
            AnalysisOutcome::Analyzed(a) => a,
            AnalysisOutcome::Fallback { analysis, .. } => analysis,
        }
    }

    pub fn into_analysis(self) -> OfferAnalysis {
        match self {
            AnalysisOutcome::Analyzed(a) => a,
            AnalysisOutcome::Fallback { analysis, .. } => analysis,
        }
    }

    pub fn fallback_reason(&self) -> Option<&str> {
        match self {
            AnalysisOutcome::Analyzed(_) => None,
            AnalysisOutcome::Fallback { reason, .. } => Some(reason),
        }
    }
}

pub fn build_analysis_prompt(content: &str) -> String {
    format!("{SYSTEM_PROMPT}\n\nAnalyze this offer and return ONLY valid JSON:\n\n{content}")
}

pub async fn analyze_offer(
    llm: &dyn LlmClient,
    content: &str,
) -> Result<OfferAnalysis, AnalysisError> {
    if content.trim().is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    tracing::info!(model = llm.model_name(), chars = content.len(), "Analyzing offer");

    let request = GenerationRequest::new(build_analysis_prompt(content))
        .temperature(ANALYSIS_TEMPERATURE)
        .max_output_tokens(ANALYSIS_MAX_TOKENS)
        .json();

    let text = llm.generate(&request).await?;
    parse_json_response(&text).map_err(|e| match e {
        LlmError::ResponseParsing(msg) => AnalysisError::InvalidJson(msg),
        other => AnalysisError::Llm(other),
    })
}

/// Analyze, substituting [`mock_analysis`] on failure when `allow_fallback` is set.
///
/// Empty input is always an error.
pub async fn analyze_offer_or_fallback(
    llm: &dyn LlmClient,
    content: &str,
    allow_fallback: bool,
) -> Result<AnalysisOutcome, AnalysisError> {
    match analyze_offer(llm, content).await {
        Ok(analysis) => Ok(AnalysisOutcome::Analyzed(analysis)),
        Err(AnalysisError::EmptyInput) => Err(AnalysisError::EmptyInput),
        Err(e) if allow_fallback => {
            tracing::warn!(error = %e, "Offer analysis failed, returning mock analysis");
            Ok(AnalysisOutcome::Fallback {
                analysis: mock_analysis(),
                reason: e.to_string(),
            })
        }
        Err(e) => Err(e),
    }
}

/// Canned report returned when the model is unavailable.
pub fn mock_analysis() -> OfferAnalysis {
    let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    OfferAnalysis {
        score: 85.0,
        summary: "A strong coaching offer that needs better risk reversal.".into(),
        positioning: Positioning {
            target_audience: "Mid-level corporate managers burning out".into(),
            primary_pain_point: "Lack of career fulfillment and exhaustion".into(),
            core_benefit: "Reclaim 10 hours/week and double income".into(),
            market_sophistication: MarketSophistication::ProblemAware,
            messaging_angles: strings(&["Escape the rat race", "Become your own boss"]),
        },
        revenue_model: RevenueModel {
            model_type: "High Ticket Coaching".into(),
            monetization_strategy: "Upfront application fee + Backend program".into(),
            conversion_strategy: "Phone close".into(),
        },
        pricing_strategy: PricingStrategy {
            suggested_price_point: "$2,000 - $3,000".into(),
            reasoning: "High-touch coaching requires premium anchor.".into(),
            psychological_hooks: strings(&["Investment in future self", "Cost of inaction"]),
            price_gap_analysis: Some("Competitors charge $5k+".into()),
        },
        upsell_structure: UpsellStructure {
            recommended_upsells: vec![RecommendedUpsell {
                offer_name: "VIP Retreat".into(),
                price_point: "$5,000".into(),
                reasoning: "In-person immersion".into(),
            }],
        },
        bonus_suggestions: vec![BonusSuggestion {
            name: "SOP Toolkit".into(),
            value_proposition: "Save 20 hours of setup time".into(),
        }],
        funnel_strategy: FunnelStrategy {
            recommended_flow: FunnelFlow::Application,
            steps: vec![
                FunnelStep {
                    name: "VSL Landing Page".into(),
                    purpose: "Pre-frame the value and filter leads".into(),
                    key_elements: strings(&["Headline", "Social Proof", "Application CTA"]),
                },
                FunnelStep {
                    name: "Application Form".into(),
                    purpose: "Qualify leads".into(),
                    key_elements: strings(&["Income qualify", "Commitment check"]),
                },
            ],
        },
        copy_angles: CopyAngles {
            headlines: strings(&["Stop Trading Time for Money", "The Executive Exit Strategy"]),
            hooks: strings(&["Your boss hopes you never read this.", "Burnout is a choice."]),
            email_subjects: strings(&["Are you tired yet?", "Invitation inside"]),
        },
        funnel_health_score: FunnelHealthScore {
            clarity: 8.0,
            monetization_depth: 7.0,
            pricing: 9.0,
            overall: 8.0,
        },
        recommendations: strings(&["Add a stronger guarantee.", "Show more client case studies."]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::llm::MockLlmClient;

    fn analysis_json() -> String {
        let mut analysis = mock_analysis();
        analysis.score = 72.0;
        analysis.summary = "Clear promise, weak proof.".into();
        serde_json::to_string(&analysis).unwrap()
    }

    #[tokio::test]
    async fn parses_fenced_response() {
        let llm = MockLlmClient::new(&format!("```json\n{}\n```", analysis_json()));
        let analysis = analyze_offer(&llm, "Coaching for managers, $2k").await.unwrap();
        assert_eq!(analysis.score, 72.0);
        assert_eq!(analysis.summary, "Clear promise, weak proof.");
    }

    #[tokio::test]
    async fn request_asks_for_json_with_fixed_settings() {
        let llm = MockLlmClient::new(&analysis_json());
        analyze_offer(&llm, "My offer").await.unwrap();

        let request = &llm.requests()[0];
        assert!(request.json_output);
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_output_tokens, Some(4096));
        assert!(request
            .prompt
            .ends_with("\n\nAnalyze this offer and return ONLY valid JSON:\n\nMy offer"));
    }

    #[tokio::test]
    async fn empty_input_never_reaches_the_model() {
        let llm = MockLlmClient::new(&analysis_json());
        let err = analyze_offer_or_fallback(&llm, "   ", true).await.unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyInput));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn malformed_json_is_invalid_json_error() {
        let llm = MockLlmClient::new("Here is your analysis: great offer!");
        let err = analyze_offer(&llm, "offer").await.unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidJson(_)));
    }

    #[tokio::test]
    async fn partial_response_is_kept_not_replaced() {
        let mut value = serde_json::from_str::<serde_json::Value>(&analysis_json()).unwrap();
        let object = value.as_object_mut().unwrap();
        object.remove("bonus_suggestions");
        object.remove("recommendations");
        value["positioning"]["market_sophistication"] = "Problem Aware".into();
        let llm = MockLlmClient::new(&value.to_string());

        let outcome = analyze_offer_or_fallback(&llm, "offer", true).await.unwrap();
        assert!(outcome.fallback_reason().is_none());
        let analysis = outcome.into_analysis();
        assert_eq!(analysis.score, 72.0);
        assert!(analysis.bonus_suggestions.is_empty());
        assert!(analysis.recommendations.is_empty());
        assert_eq!(analysis.positioning.market_sophistication, MarketSophistication::ProblemAware);
    }

    #[tokio::test]
    async fn fallback_is_visible_in_outcome() {
        let llm = MockLlmClient::failing(LlmError::MissingApiKey);
        let outcome = analyze_offer_or_fallback(&llm, "offer", true).await.unwrap();

        assert_eq!(outcome.analysis(), &mock_analysis());
        assert!(outcome.fallback_reason().unwrap().contains("API key"));
    }

    #[tokio::test]
    async fn fallback_disabled_propagates_error() {
        let llm = MockLlmClient::failing(LlmError::Unavailable("down".into()));
        let err = analyze_offer_or_fallback(&llm, "offer", false).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Llm(LlmError::Unavailable(_))));
    }

    #[tokio::test]
    async fn success_is_not_flagged_as_fallback() {
        let llm = MockLlmClient::new(&analysis_json());
        let outcome = analyze_offer_or_fallback(&llm, "offer", true).await.unwrap();
        assert!(outcome.fallback_reason().is_none());
        assert_eq!(outcome.into_analysis().score, 72.0);
    }

    #[test]
    fn mock_analysis_matches_schema_names() {
        let value = serde_json::to_value(mock_analysis()).unwrap();
        assert_eq!(value["revenue_model"]["type"], "High Ticket Coaching");
        assert_eq!(value["positioning"]["market_sophistication"], "problem_aware");
        assert_eq!(value["funnel_strategy"]["recommended_flow"], "application");
    }
}
