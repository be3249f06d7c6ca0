use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{ReportStatus, SectionStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReport {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub offer_id: Uuid,
    pub title: String,
    pub status: ReportStatus,
    /// Markdown document.
    pub content: String,
    pub metadata: ReportMetadata,
    pub version: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    #[serde(default)]
    pub sections: BTreeMap<String, SectionState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionState {
    pub status: SectionStatus,
    /// RFC 3339.
    pub last_updated: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportVersion {
    pub id: Uuid,
    pub report_id: Uuid,
    pub version: i64,
    pub content: String,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_uses_camel_case_keys() {
        let mut metadata = ReportMetadata::default();
        metadata.sections.insert(
            "positioning".into(),
            SectionState {
                status: SectionStatus::Complete,
                last_updated: "2024-01-15T10:00:00Z".into(),
            },
        );
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["sections"]["positioning"]["lastUpdated"], "2024-01-15T10:00:00Z");
        assert_eq!(json["sections"]["positioning"]["status"], "complete");
        assert!(json.get("targetRegion").is_none());
    }

    #[test]
    fn empty_metadata_parses() {
        let metadata: ReportMetadata = serde_json::from_str(r#"{"sections":{}}"#).unwrap();
        assert!(metadata.sections.is_empty());
    }
}
