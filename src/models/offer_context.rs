use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product facts a sales report is generated from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferContext {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub product_name: String,
    pub category: String,
    pub target_audience: String,
    pub main_problem: String,
    pub key_features: Vec<String>,
    pub price_point: String,
    pub geographic_focus: String,
    pub usp: String,
    pub additional_context: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
