//! Generative-AI client layer.
//!
//! Every pipeline stage talks to the model through [`LlmClient`], built once at
//! startup and shared through `CoreState`. Tests substitute [`MockLlmClient`].

pub mod gemini;
pub mod mock;
pub mod types;
pub mod unwrap;

pub use gemini::GeminiClient;
pub use mock::MockLlmClient;
pub use types::{GenerationRequest, LlmClient};
pub use unwrap::{parse_json_array_lenient, parse_json_response, unwrap_json_fence};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("Gemini API key is not configured")]
    MissingApiKey,

    #[error("Rate limited by provider: {0}")]
    RateLimited(String),

    #[error("Provider temporarily unavailable: {0}")]
    Unavailable(String),

    #[error("Provider returned error (status {status}): {body}")]
    Provider { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Provider returned no text")]
    EmptyResponse,

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}
