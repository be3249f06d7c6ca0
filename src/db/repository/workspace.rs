use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::{format_timestamp, parse_timestamp, parse_uuid, DatabaseError};
use crate::models::Workspace;

pub fn insert_workspace(conn: &Connection, workspace: &Workspace) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO workspaces (id, user_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            workspace.id.to_string(),
            workspace.user_id.to_string(),
            workspace.name,
            format_timestamp(&workspace.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_workspace(conn: &Connection, id: &Uuid) -> Result<Option<Workspace>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, user_id, name, created_at FROM workspaces WHERE id = ?1",
        params![id.to_string()],
        workspace_row_from_rusqlite,
    );

    match result {
        Ok(row) => Ok(Some(workspace_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Workspaces owned by a user, newest first.
pub fn list_workspaces_for_user(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<Workspace>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, created_at FROM workspaces
         WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
    )?;
    let rows = stmt.query_map(params![user_id.to_string()], workspace_row_from_rusqlite)?;

    let mut workspaces = Vec::new();
    for row in rows {
        workspaces.push(workspace_from_row(row?)?);
    }
    Ok(workspaces)
}

type WorkspaceRow = (String, String, String, String);

fn workspace_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<WorkspaceRow, rusqlite::Error> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn workspace_from_row(row: WorkspaceRow) -> Result<Workspace, DatabaseError> {
    let (id, user_id, name, created_at) = row;
    Ok(Workspace {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        name,
        created_at: parse_timestamp(&created_at),
    })
}
