//! Business operations shared by every transport.
//!
//! Each action opens its own connection from `CoreState`, checks that the
//! entities it touches belong to the calling user and returns an
//! [`ActionError`] the API layer maps to a status code.

pub mod funnels;
pub mod offer_contexts;
pub mod offer_files;
pub mod offers;
pub mod sales_reports;
pub mod users;
pub mod workspaces;

use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::core_state::CoreError;
use crate::db::repository::get_workspace;
use crate::db::DatabaseError;
use crate::models::Workspace;
use crate::pipeline::analyzer::AnalysisError;
use crate::pipeline::extraction::ExtractionError;
use crate::pipeline::funnel::FunnelError;
use crate::pipeline::llm::LlmError;
use crate::pipeline::report::ReportError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload exceeds {limit_bytes} bytes")]
    PayloadTooLarge { limit_bytes: usize },

    #[error("Upstream service failed: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DatabaseError> for ActionError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, .. } => ActionError::NotFound(entity_type),
            other => ActionError::Internal(other.to_string()),
        }
    }
}

impl From<CoreError> for ActionError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Database(e) => e.into(),
            other => ActionError::Internal(other.to_string()),
        }
    }
}

impl From<StorageError> for ActionError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => ActionError::NotFound("Stored object".into()),
            StorageError::AlreadyExists(path) => ActionError::Conflict(format!("object {path} already exists")),
            StorageError::Http(_) | StorageError::Provider { .. } => ActionError::Upstream(err.to_string()),
            other => ActionError::Internal(other.to_string()),
        }
    }
}

impl From<LlmError> for ActionError {
    fn from(err: LlmError) -> Self {
        ActionError::Upstream(err.to_string())
    }
}

impl From<AnalysisError> for ActionError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::EmptyInput => ActionError::InvalidInput("Content is required".into()),
            other => ActionError::Upstream(other.to_string()),
        }
    }
}

impl From<FunnelError> for ActionError {
    fn from(err: FunnelError) -> Self {
        ActionError::Upstream(err.to_string())
    }
}

impl From<ReportError> for ActionError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::UnknownSection(key) => ActionError::InvalidInput(format!("unknown section: {key}")),
            ReportError::Llm(e) => e.into(),
        }
    }
}

impl From<ExtractionError> for ActionError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::Storage(e) => e.into(),
            ExtractionError::Database(e) => e.into(),
            ExtractionError::Core(e) => e.into(),
            other => ActionError::Internal(other.to_string()),
        }
    }
}

/// Load a workspace owned by `user_id`. Other users' workspaces are not found.
pub(crate) fn owned_workspace(
    conn: &Connection,
    user_id: &Uuid,
    workspace_id: &Uuid,
) -> Result<Workspace, ActionError> {
    get_workspace(conn, workspace_id)?
        .filter(|ws| ws.user_id == *user_id)
        .ok_or_else(|| ActionError::NotFound("Workspace".into()))
}

/// Trimmed value of a required text field.
pub(crate) fn required(field: &str, value: &str) -> Result<String, ActionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ActionError::InvalidInput(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_not_found_maps_to_not_found() {
        let err: ActionError = DatabaseError::NotFound {
            entity_type: "SalesReport".into(),
            id: "x".into(),
        }
        .into();
        assert!(matches!(err, ActionError::NotFound(ref e) if e == "SalesReport"));
        assert_eq!(err.to_string(), "SalesReport not found");
    }

    #[test]
    fn empty_analysis_input_is_invalid() {
        let err: ActionError = AnalysisError::EmptyInput.into();
        assert!(matches!(err, ActionError::InvalidInput(_)));
    }

    #[test]
    fn llm_failures_are_upstream() {
        let err: ActionError = ReportError::Llm(LlmError::RateLimited("quota".into())).into();
        assert!(matches!(err, ActionError::Upstream(_)));
        let err: ActionError = ReportError::UnknownSection("nope".into()).into();
        assert!(matches!(err, ActionError::InvalidInput(_)));
    }

    #[test]
    fn required_trims() {
        assert_eq!(required("Name", "  Acme ").unwrap(), "Acme");
        assert!(matches!(required("Name", "   "), Err(ActionError::InvalidInput(_))));
    }
}
