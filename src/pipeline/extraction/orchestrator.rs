use uuid::Uuid;

use super::docx::extract_docx_text;
use super::format::FileCategory;
use super::pdf::extract_pdf_text;
use super::summarize::summarize_content;
use super::transcribe::Transcriber;
use super::ExtractionError;
use crate::core_state::CoreState;
use crate::db::repository::{complete_extraction, get_offer_file, update_extraction_status};
use crate::models::enums::ExtractionStatus;
use crate::models::{FileMetadata, OfferFile};

/// Text pulled out of one file, before summarization.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedContent {
    pub text: String,
    pub metadata: FileMetadata,
}

/// Route `bytes` to the extractor for `mime`.
///
/// PDF and DOCX parsing run on the blocking pool.
pub async fn extract_content(
    transcriber: &dyn Transcriber,
    file_name: &str,
    mime: &str,
    bytes: Vec<u8>,
) -> Result<ExtractedContent, ExtractionError> {
    let category = FileCategory::from_mime(mime);
    tracing::debug!(file_name, category = category.as_str(), size = bytes.len(), "Extracting file content");

    match category {
        FileCategory::Pdf => {
            let pdf = tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
                .await
                .map_err(|e| ExtractionError::Task(e.to_string()))??;
            Ok(ExtractedContent {
                text: pdf.text,
                metadata: FileMetadata {
                    pages: Some(pdf.page_count),
                    ..FileMetadata::default()
                },
            })
        }
        FileCategory::Document => {
            let text = tokio::task::spawn_blocking(move || extract_docx_text(&bytes))
                .await
                .map_err(|e| ExtractionError::Task(e.to_string()))??;
            Ok(ExtractedContent {
                text,
                metadata: FileMetadata::default(),
            })
        }
        FileCategory::Text => Ok(ExtractedContent {
            text: String::from_utf8_lossy(&bytes).into_owned(),
            metadata: FileMetadata::default(),
        }),
        FileCategory::Video | FileCategory::Audio => {
            let transcript = transcriber.transcribe(bytes, file_name, mime).await?;
            let duration = transcript.duration_secs();
            Ok(ExtractedContent {
                text: transcript.text,
                metadata: FileMetadata {
                    duration,
                    transcript_segments: Some(transcript.segments),
                    ..FileMetadata::default()
                },
            })
        }
        FileCategory::Other => Err(ExtractionError::UnsupportedFormat(mime.to_string())),
    }
}

/// Run one uploaded file through extraction and summarization.
///
/// Status moves `pending → processing → complete`, or to `failed` on any
/// error after the file was claimed. Completed files are skipped.
pub async fn process_file_extraction(core: &CoreState, file_id: Uuid) -> Result<(), ExtractionError> {
    let file = {
        let conn = core.open_db()?;
        let file = get_offer_file(&conn, &file_id)?.ok_or(ExtractionError::FileNotFound(file_id))?;
        if file.extraction_status == ExtractionStatus::Complete {
            tracing::debug!(file_id = %file_id, "File already extracted, skipping");
            return Ok(());
        }
        update_extraction_status(&conn, &file_id, ExtractionStatus::Processing)?;
        file
    };

    tracing::info!(
        file_id = %file_id,
        file_type = %file.file_type,
        size = file.file_size,
        "Starting file extraction"
    );

    match extract_and_summarize(core, &file).await {
        Ok((content, summary)) => {
            let conn = core.open_db()?;
            complete_extraction(&conn, &file_id, &content.text, &summary, &content.metadata)?;
            tracing::info!(
                file_id = %file_id,
                chars = content.text.chars().count(),
                "File extraction complete"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(file_id = %file_id, error = %e, "File extraction failed");
            let conn = core.open_db()?;
            update_extraction_status(&conn, &file_id, ExtractionStatus::Failed)?;
            Err(e)
        }
    }
}

async fn extract_and_summarize(
    core: &CoreState,
    file: &OfferFile,
) -> Result<(ExtractedContent, String), ExtractionError> {
    let bytes = core.store().download(&file.storage_path).await?;
    let content = extract_content(core.transcriber(), &file.file_name, &file.file_type, bytes).await?;
    let summary = summarize_content(core.llm(), &content.text, core.config.summary_chunk_chars).await?;
    Ok((content, summary))
}
