//! File extraction: turn an uploaded offer file into text plus a summary.
//!
//! Format routing lives in [`format`], the per-format extractors in [`pdf`],
//! [`docx`] and [`transcribe`]. [`orchestrator`] drives one file through the
//! pipeline and [`worker`] runs it in the background.

pub mod chunker;
pub mod docx;
pub mod format;
pub mod orchestrator;
pub mod pdf;
pub mod summarize;
pub mod transcribe;
pub mod worker;

pub use chunker::chunk_text;
pub use docx::extract_docx_text;
pub use format::{file_extension, format_file_size, is_valid_file_type, FileCategory};
pub use orchestrator::{extract_content, process_file_extraction, ExtractedContent};
pub use pdf::{extract_pdf_text, PdfText};
pub use summarize::{summarize_content, DEFAULT_SUMMARY_CHUNK_CHARS};
pub use transcribe::{Transcriber, Transcript, WhisperClient, DEFAULT_OPENAI_BASE_URL};
pub use worker::{reconcile_stalled_work, start_extraction_worker, ExtractionQueue, ExtractionWorker, ReconcileSummary};

#[cfg(test)]
pub use transcribe::StaticTranscriber;

use thiserror::Error;
use uuid::Uuid;

use crate::core_state::CoreError;
use crate::db::DatabaseError;
use crate::pipeline::llm::LlmError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("DOCX parsing failed: {0}")]
    DocxParsing(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("OpenAI API key is not configured")]
    MissingTranscriptionKey,

    #[error("Unsupported format for extraction: {0}")]
    UnsupportedFormat(String),

    #[error("Offer file not found: {0}")]
    FileNotFound(Uuid),

    #[error("Extraction queue is closed")]
    QueueClosed,

    #[error("Extraction task failed: {0}")]
    Task(String),

    #[error("Summarization failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
