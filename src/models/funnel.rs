use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{BlockType, FunnelPageType, FunnelStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Funnel {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub offer_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub status: FunnelStatus,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunnelPage {
    pub id: Uuid,
    pub funnel_id: Uuid,
    pub name: String,
    pub slug: String,
    pub page_type: FunnelPageType,
    pub order_index: i64,
    pub blocks: Vec<PageBlock>,
    pub copy_data: serde_json::Value,
    pub seo: PageSeo,
}

/// One layout block. `content` shape depends on `block_type` and is not validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub content: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSeo {
    pub title: String,
    pub description: String,
}

/// A funnel with its pages sorted by `order_index`.
#[derive(Debug, Clone, Serialize)]
pub struct FunnelWithPages {
    #[serde(flatten)]
    pub funnel: Funnel,
    pub pages: Vec<FunnelPage>,
}
