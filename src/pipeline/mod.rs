pub mod analyzer;
pub mod extraction;
pub mod funnel;
pub mod llm;
pub mod report;
