use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::analysis::OfferAnalysis;
use super::enums::{OfferInputType, OfferStatus};

/// An analyzed offer as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub status: OfferStatus,
    pub input_type: OfferInputType,
    pub input_value: String,
    pub analysis: OfferAnalysis,
    pub created_at: NaiveDateTime,
}

/// Raw offer input as submitted by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferInput {
    #[serde(rename = "type")]
    pub input_type: OfferInputType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_content: Option<String>,
}

impl OfferInput {
    /// First non-empty of text, url, file content.
    pub fn value(&self) -> &str {
        [&self.text, &self.url, &self.file_content]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|v| !v.is_empty())
            .unwrap_or("")
    }
}
