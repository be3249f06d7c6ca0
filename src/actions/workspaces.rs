use uuid::Uuid;

use super::{owned_workspace, required, ActionError};
use crate::core_state::CoreState;
use crate::db::now_timestamp;
use crate::db::repository::{insert_workspace, list_workspaces_for_user};
use crate::models::Workspace;

pub fn create_workspace(core: &CoreState, user_id: &Uuid, name: &str) -> Result<Workspace, ActionError> {
    let workspace = Workspace {
        id: Uuid::new_v4(),
        user_id: *user_id,
        name: required("Name", name)?,
        created_at: now_timestamp(),
    };
    let conn = core.open_db()?;
    insert_workspace(&conn, &workspace)?;
    tracing::info!(workspace_id = %workspace.id, user_id = %user_id, "Workspace created");
    Ok(workspace)
}

/// Workspaces of `user_id`, newest first.
pub fn list_workspaces(core: &CoreState, user_id: &Uuid) -> Result<Vec<Workspace>, ActionError> {
    let conn = core.open_db()?;
    Ok(list_workspaces_for_user(&conn, user_id)?)
}

pub fn get_workspace(core: &CoreState, user_id: &Uuid, workspace_id: &Uuid) -> Result<Workspace, ActionError> {
    let conn = core.open_db()?;
    owned_workspace(&conn, user_id, workspace_id)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::actions::users::register_user;
    use crate::core_state::test_core;
    use crate::pipeline::llm::MockLlmClient;

    #[test]
    fn workspaces_are_private_and_newest_first() {
        let t = test_core(Arc::new(MockLlmClient::new("ok")));
        let ada = register_user(&t.core, "ada@example.com", "Ada").unwrap().user;
        let bob = register_user(&t.core, "bob@example.com", "Bob").unwrap().user;

        let first = create_workspace(&t.core, &ada.id, "First").unwrap();
        let second = create_workspace(&t.core, &ada.id, "Second").unwrap();
        create_workspace(&t.core, &bob.id, "Bob's").unwrap();

        let names: Vec<String> = list_workspaces(&t.core, &ada.id)
            .unwrap()
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, ["Second", "First"]);

        assert_eq!(get_workspace(&t.core, &ada.id, &second.id).unwrap().id, second.id);
        assert!(matches!(
            get_workspace(&t.core, &bob.id, &first.id),
            Err(ActionError::NotFound(_))
        ));
    }

    #[test]
    fn blank_name_rejected() {
        let t = test_core(Arc::new(MockLlmClient::new("ok")));
        let ada = register_user(&t.core, "ada@example.com", "Ada").unwrap().user;
        assert!(matches!(
            create_workspace(&t.core, &ada.id, " "),
            Err(ActionError::InvalidInput(_))
        ));
    }
}
