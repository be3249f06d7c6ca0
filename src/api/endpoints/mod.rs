//! API endpoint handlers.
//!
//! Each module maps one resource onto the shared business operations in
//! `crate::actions`.

pub mod analyze;
pub mod funnels;
pub mod health;
pub mod offer_contexts;
pub mod offer_files;
pub mod offers;
pub mod sales_reports;
pub mod users;
pub mod workspaces;

use uuid::Uuid;

use crate::api::error::ApiError;

/// Parse a path identifier, naming the entity in the error.
pub(crate) fn parse_id(entity: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|e| ApiError::BadRequest(format!("Invalid {entity} ID: {e}")))
}
