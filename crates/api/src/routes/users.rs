//! User routes

use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Deserialize;

use memberly_shared::{PublicUser, UserUpdate};

use crate::{
    auth::{hash_password, AuthUser},
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// List all users (billing fields included, password hashes never)
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<PublicUser>>> {
    let users = state.users.read_all().await?;
    Ok(Json(users))
}

/// Partial update of the authenticated user's profile.
///
/// Billing fields are not updatable here — subscription state only moves
/// through verified webhook events, never direct client input.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(req): Json<UpdateMeRequest>,
) -> ApiResult<Json<PublicUser>> {
    if let Some(name) = &req.name {
        if name.trim().is_empty() || name.len() > 100 {
            return Err(ApiError::Validation(
                "Name must be between 1 and 100 characters".to_string(),
            ));
        }
    }
    if let Some(email) = &req.email {
        if !super::auth::is_valid_email(email) {
            return Err(ApiError::Validation("Invalid email address".to_string()));
        }
    }
    if let Some(password) = &req.password {
        if password.len() < 8 || password.len() > 128 {
            return Err(ApiError::Validation(
                "Password must be between 8 and 128 characters".to_string(),
            ));
        }
    }

    let password_hash = match req.password {
        Some(password) => Some(hash_password(&password).map_err(|_| ApiError::Internal)?),
        None => None,
    };

    let updated = state
        .users
        .update(
            auth_user.user_id,
            UserUpdate {
                name: req.name.map(|n| n.trim().to_string()),
                email: req.email,
                password_hash,
            },
        )
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(updated))
}
