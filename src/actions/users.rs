use serde::Serialize;
use uuid::Uuid;

use super::{required, ActionError};
use crate::api::types::{generate_token, hash_token};
use crate::core_state::CoreState;
use crate::db::repository::{get_user_by_email, get_user_by_token_hash, insert_user};
use crate::db::{now_timestamp, DatabaseError};
use crate::models::User;

/// A new account and its bearer token. The token is shown exactly once.
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredUser {
    pub user: User,
    pub token: String,
}

pub fn register_user(core: &CoreState, email: &str, name: &str) -> Result<RegisteredUser, ActionError> {
    let email = required("Email", email)?.to_lowercase();
    if !email.contains('@') {
        return Err(ActionError::InvalidInput("Email is not valid".into()));
    }
    let name = required("Name", name)?;

    let conn = core.open_db()?;
    if get_user_by_email(&conn, &email)?.is_some() {
        return Err(ActionError::Conflict(format!("user with email {email} already exists")));
    }

    let user = User {
        id: Uuid::new_v4(),
        email,
        name,
        created_at: now_timestamp(),
    };
    let token = generate_token();
    insert_user(&conn, &user, &hash_token(&token)).map_err(|e| match e {
        DatabaseError::ConstraintViolation(msg) => ActionError::Conflict(msg),
        other => other.into(),
    })?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok(RegisteredUser { user, token })
}

/// Resolve a bearer token to its owner.
pub fn authenticate(core: &CoreState, token: &str) -> Result<Option<User>, ActionError> {
    if token.is_empty() {
        return Ok(None);
    }
    let conn = core.open_db()?;
    Ok(get_user_by_token_hash(&conn, &hash_token(token))?)
}
