use futures_util::future::try_join_all;

use crate::pipeline::llm::{GenerationRequest, LlmClient, LlmError};

use super::chunker::chunk_text;

pub const DEFAULT_SUMMARY_CHUNK_CHARS: usize = 30_000;

const SUMMARY_INSTRUCTION: &str = "Extract key topics, main points, structure, and important details from the content. Be comprehensive but concise.";
const SUMMARY_TEMPERATURE: f32 = 0.3;
const SUMMARY_MAX_TOKENS: u32 = 1000;

/// Summarize arbitrarily long text.
///
/// Chunks are summarized concurrently; with more than one chunk the partial
/// summaries are summarized once more. Empty input returns an empty summary
/// without calling the model.
pub async fn summarize_content(
    llm: &dyn LlmClient,
    content: &str,
    max_chunk_chars: usize,
) -> Result<String, LlmError> {
    let chunks = chunk_text(content, max_chunk_chars);
    if chunks.is_empty() {
        return Ok(String::new());
    }

    tracing::debug!(chunks = chunks.len(), chars = content.len(), "Summarizing content");

    let mut summaries = try_join_all(chunks.iter().map(|chunk| summarize_chunk(llm, chunk))).await?;
    if summaries.len() == 1 {
        return Ok(summaries.remove(0));
    }

    summarize_chunk(llm, &summaries.join("\n\n")).await
}

async fn summarize_chunk(llm: &dyn LlmClient, text: &str) -> Result<String, LlmError> {
    let request = GenerationRequest::new(format!("{SUMMARY_INSTRUCTION}\n\n{text}"))
        .temperature(SUMMARY_TEMPERATURE)
        .max_output_tokens(SUMMARY_MAX_TOKENS);
    llm.generate(&request).await
}
