//! Funnel Page Assembler: copy generation then block layout, per page type.

use futures_util::future::try_join_all;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::models::enums::FunnelPageType;
use crate::models::{FunnelPage, OfferAnalysis, PageBlock, PageSeo};
use crate::pipeline::llm::{
    parse_json_array_lenient, parse_json_response, GenerationRequest, LlmClient, LlmError,
};

/// Pages of a funnel generated from an offer, in display order.
pub const DEFAULT_PAGE_TYPES: [FunnelPageType; 3] = [
    FunnelPageType::Lead,
    FunnelPageType::Sales,
    FunnelPageType::ThankYou,
];

const DEFAULT_SEO_TITLE: &str = "Funnel Page";

#[derive(Error, Debug)]
pub enum FunnelError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

pub fn page_label(page_type: FunnelPageType) -> &'static str {
    match page_type {
        FunnelPageType::Lead => "Lead",
        FunnelPageType::Sales => "Sales",
        FunnelPageType::Upsell => "Upsell",
        FunnelPageType::ThankYou => "Thank You",
    }
}

pub fn build_copy_prompt(analysis: &OfferAnalysis, page_type: FunnelPageType) -> String {
    format!(
        r#"You are an expert funnel copywriter.
Based on the following Offer Intelligence, generate high-converting copy for a "{page_type}" page.

Offer Context:
Target Audience: {}
Pain Point: {}
Benefit: {}
Headlines: {}

Output structured JSON for the page content, including:
- headlines
- subheadlines
- body_copy
- bullet_points
- cta_text
- testimonial_placeholders (if applicable)

Return ONLY JSON."#,
        analysis.positioning.target_audience,
        analysis.positioning.primary_pain_point,
        analysis.positioning.core_benefit,
        analysis.copy_angles.headlines.join(", "),
    )
}

pub fn build_layout_prompt(page_type: FunnelPageType, copy: &Value) -> String {
    format!(
        r#"You are a conversion optimization expert and UI designer.
Map the provided copy to a high-converting page layout using the following block types:
'hero', 'features', 'pricing', 'testimonials', 'faq', 'cta'.

Page Type: {page_type}
Copy Data: {copy}

Return a JSON array of PageBlock objects. Each block must have:
- id: string (unique)
- type: string (one of the above)
- content: object matching the specific block schema.

Hero Schema: {{ heading, subheading, ctaText, ctaLink }}
Features Schema: {{ heading, features: [{{ title, description, icon }}] }}
Pricing Schema: {{ heading, plans: [{{ name, price, features, ctaText }}] }}
Testimonials Schema: {{ heading, testimonials: [{{ name, quote, role }}] }}
Video Schema: {{ videoUrl, caption }} (optional)
CTA Schema: {{ heading, subheading, ctaText }}

Return ONLY the JSON array."#
    )
}

/// Generate page copy. Unusable output degrades to `{}`; transport errors propagate.
pub async fn generate_funnel_copy(
    llm: &dyn LlmClient,
    analysis: &OfferAnalysis,
    page_type: FunnelPageType,
) -> Result<Value, FunnelError> {
    let request = GenerationRequest::new(build_copy_prompt(analysis, page_type)).json();
    let Some(text) = response_text(llm.generate(&request).await)? else {
        return Ok(Value::Object(Map::new()));
    };

    match parse_json_response::<Value>(&text) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!(page_type = page_type.as_str(), error = %e, "Unparsable funnel copy");
            Ok(Value::Object(Map::new()))
        }
    }
}

/// Map copy onto layout blocks. Unusable output degrades to no blocks.
pub async fn generate_page_layout(
    llm: &dyn LlmClient,
    page_type: FunnelPageType,
    copy: &Value,
) -> Result<Vec<PageBlock>, FunnelError> {
    let request = GenerationRequest::new(build_layout_prompt(page_type, copy)).json();
    let Some(text) = response_text(llm.generate(&request).await)? else {
        return Ok(Vec::new());
    };

    match parse_json_array_lenient::<PageBlock>(&text) {
        Some(blocks) => Ok(blocks),
        None => {
            tracing::warn!(page_type = page_type.as_str(), "Unparsable page layout");
            Ok(Vec::new())
        }
    }
}

/// An empty answer is a degraded result, not a failure.
fn response_text(result: Result<String, LlmError>) -> Result<Option<String>, FunnelError> {
    match result {
        Ok(text) => Ok(Some(text)),
        Err(LlmError::EmptyResponse) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn build_page(
    llm: &dyn LlmClient,
    analysis: &OfferAnalysis,
    funnel_id: Uuid,
    page_type: FunnelPageType,
    order_index: i64,
) -> Result<FunnelPage, FunnelError> {
    let copy_data = generate_funnel_copy(llm, analysis, page_type).await?;
    let blocks = generate_page_layout(llm, page_type, &copy_data).await?;

    Ok(FunnelPage {
        id: Uuid::new_v4(),
        funnel_id,
        name: format!("{} Page", page_label(page_type)),
        slug: page_type.as_str().to_string(),
        page_type,
        order_index,
        blocks,
        copy_data,
        seo: PageSeo {
            title: analysis
                .first_headline()
                .unwrap_or(DEFAULT_SEO_TITLE)
                .to_string(),
            description: analysis.summary.clone(),
        },
    })
}

/// Build every page of a funnel concurrently. Pages come back in `page_types` order.
pub async fn build_funnel_pages(
    llm: &dyn LlmClient,
    analysis: &OfferAnalysis,
    funnel_id: Uuid,
    page_types: &[FunnelPageType],
) -> Result<Vec<FunnelPage>, FunnelError> {
    tracing::info!(funnel_id = %funnel_id, pages = page_types.len(), "Building funnel pages");

    try_join_all(
        page_types
            .iter()
            .enumerate()
            .map(|(i, page_type)| build_page(llm, analysis, funnel_id, *page_type, i as i64)),
    )
    .await
}
