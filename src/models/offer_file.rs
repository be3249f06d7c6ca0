use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ExtractionStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferFile {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub offer_id: Uuid,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub storage_path: String,
    pub extraction_status: ExtractionStatus,
    pub extracted_content: Option<String>,
    pub summary: Option<String>,
    pub metadata: Option<FileMetadata>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// Seconds, for audio and video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_segments: Option<Vec<TranscriptSegment>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}
