//! Multi-section sales report generation.
//!
//! A report is 14 independently prompted sections rendered in a fixed order.
//! Each call goes through [`retry::generate_with_retry`]; a section that still
//! fails is replaced by [`SECTION_ERROR_PLACEHOLDER`] and never aborts the rest.

pub mod generator;
pub mod prompt;
pub mod retry;
pub mod sections;

pub use generator::{
    assemble_report, replace_section_content, FanOut, GeneratedReport, ReportGenerator,
    SectionOutcome, DEFAULT_SECTION_DELAY, SECTION_ERROR_PLACEHOLDER,
};
pub use prompt::build_context_prompt;
pub use retry::{generate_with_retry, RetryPolicy, Sleeper, TokioSleeper};
pub use sections::{ReportSection, SectionMetadata};

#[cfg(test)]
pub use retry::RecordingSleeper;

use thiserror::Error;

use crate::pipeline::llm::LlmError;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Unknown report section: {0}")]
    UnknownSection(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}
