use rusqlite::{params, Connection, ErrorCode};
use uuid::Uuid;

use crate::db::{format_timestamp, parse_timestamp, parse_uuid, DatabaseError};
use crate::models::User;

pub fn insert_user(
    conn: &Connection,
    user: &User,
    token_hash: &[u8; 32],
) -> Result<(), DatabaseError> {
    let result = conn.execute(
        "INSERT INTO users (id, email, name, token_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.id.to_string(),
            user.email,
            user.name,
            token_hash.as_slice(),
            format_timestamp(&user.created_at),
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            Err(DatabaseError::ConstraintViolation(format!(
                "user with email {} already exists",
                user.email
            )))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    query_one_user(
        conn,
        "SELECT id, email, name, created_at FROM users WHERE id = ?1",
        params![id.to_string()],
    )
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    query_one_user(
        conn,
        "SELECT id, email, name, created_at FROM users WHERE email = ?1",
        params![email],
    )
}

/// Look up the owner of a bearer token by its SHA-256 hash.
pub fn get_user_by_token_hash(
    conn: &Connection,
    token_hash: &[u8; 32],
) -> Result<Option<User>, DatabaseError> {
    query_one_user(
        conn,
        "SELECT id, email, name, created_at FROM users WHERE token_hash = ?1",
        params![token_hash.as_slice()],
    )
}

fn query_one_user(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Option<User>, DatabaseError> {
    let result = conn.query_row(sql, params, |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    });

    match result {
        Ok((id, email, name, created_at)) => Ok(Some(User {
            id: parse_uuid(&id)?,
            email,
            name,
            created_at: parse_timestamp(&created_at),
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
