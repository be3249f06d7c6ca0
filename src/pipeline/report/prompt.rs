use crate::models::OfferContext;

use super::sections::ReportSection;

pub const REPORT_PERSONA: &str = "You are a world-class Revenue Consultant and Marketing Strategist. You provide deep, actionable insights that transform offers into high-converting revenue engines. Be specific, strategic, and data-informed. Provide your response in clear, fluent, professional English using straightforward language that is easy to comprehend without unnecessary jargon. NEVER use any emojis in your response.";

pub const REGENERATE_PERSONA: &str = "You are a world-class Revenue Consultant and Marketing Strategist. Provide your response in clear, fluent, professional English using straightforward language that is easy to comprehend without unnecessary jargon. NEVER use any emojis in your response.";

pub const REFINE_PERSONA: &str = "You are a helpful AI assistant that refines sales report sections based on user feedback. Maintain the markdown format and structure. Provide your response in clear, fluent, professional English using straightforward language that is easy to comprehend without unnecessary jargon. NEVER use any emojis in your response.";

/// Serialize the offer context and completed file summaries into the
/// markdown block shared by every section prompt.
pub fn build_context_prompt(context: &OfferContext, summaries: &[String]) -> String {
    let mut prompt = String::from("## Offer Context\n\n");
    prompt.push_str(&format!("**Product Name:** {}\n", context.product_name));
    prompt.push_str(&format!("**Category:** {}\n", context.category));
    prompt.push_str(&format!("**Target Audience:** {}\n", context.target_audience));
    prompt.push_str(&format!("**Main Problem Solved:** {}\n", context.main_problem));
    prompt.push_str(&format!("**Price Point:** {}\n", context.price_point));
    prompt.push_str(&format!("**Geographic Focus:** {}\n", context.geographic_focus));
    prompt.push_str(&format!("**Unique Selling Proposition:** {}\n\n", context.usp));

    if !context.key_features.is_empty() {
        prompt.push_str("**Key Features:**\n");
        for feature in &context.key_features {
            prompt.push_str(&format!("- {feature}\n"));
        }
        prompt.push('\n');
    }

    if let Some(extra) = context.additional_context.as_deref().filter(|s| !s.is_empty()) {
        prompt.push_str(&format!("**Additional Context:** {extra}\n\n"));
    }

    if !summaries.is_empty() {
        prompt.push_str("## Content Summaries\n\n");
        for (i, summary) in summaries.iter().enumerate() {
            prompt.push_str(&format!("### File {}\n{summary}\n\n", i + 1));
        }
    }

    prompt
}

pub fn build_section_prompt(context_prompt: &str, section: ReportSection) -> String {
    format!(
        "{REPORT_PERSONA}\n\n{context_prompt}\n\n{}\n\nProvide a comprehensive analysis in markdown format. Use bullet points, subheadings, and clear structure. Be specific and actionable.",
        section.metadata().prompt
    )
}

pub fn build_regenerate_prompt(
    context_prompt: &str,
    section: ReportSection,
    instructions: &str,
) -> String {
    format!(
        "{REGENERATE_PERSONA}\n\n{context_prompt}\n\n{}\n\nAdditional Instructions: {instructions}\n\nProvide a comprehensive analysis in markdown format.",
        section.metadata().prompt
    )
}

pub fn build_refine_prompt(current_content: &str, user_message: &str) -> String {
    format!(
        "{REFINE_PERSONA}\n\nCurrent section content:\n\n{current_content}\n\nUser request: {user_message}\n\nProvide the refined version of this section."
    )
}
