//! Account registration.
//!
//! `POST /api/users` is the only unauthenticated write: it creates a user
//! and returns the bearer token every other endpoint requires.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::actions::users::{register_user, RegisteredUser};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
}

/// `POST /api/users`: register and receive a token (shown once).
pub async fn register(
    State(ctx): State<ApiContext>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisteredUser>), ApiError> {
    let registered = register_user(&ctx.core, &body.email, &body.name)?;
    Ok((StatusCode::CREATED, Json(registered)))
}
