//! Authentication routes

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use memberly_shared::{NewUser, PublicUser};

use crate::{
    auth::{hash_password, verify_password, AuthUser, TokenType},
    error::{ApiError, ApiResult},
    state::AppState,
};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<PublicUser>)> {
    if req.name.trim().is_empty() || req.name.len() > 100 {
        return Err(ApiError::Validation(
            "Name must be between 1 and 100 characters".to_string(),
        ));
    }
    if !is_valid_email(&req.email) {
        return Err(ApiError::Validation("Invalid email format".to_string()));
    }
    if req.password.len() < 8 || req.password.len() > 128 {
        return Err(ApiError::Validation(
            "Password must be between 8 and 128 characters".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password).map_err(|_| ApiError::Internal)?;

    let user = state
        .users
        .create(NewUser {
            name: req.name.trim().to_string(),
            email: req.email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            memberly_shared::StoreError::Conflict(_) => ApiError::EmailAlreadyExists,
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok((StatusCode::CREATED, Json(user.into_public())))
}

/// Log in with email and password, returning a token pair
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let valid = verify_password(&req.password, &user.password_hash)
        .map_err(|_| ApiError::InvalidCredentials)?;
    if !valid {
        return Err(ApiError::InvalidCredentials);
    }

    let (access_token, refresh_token) = state
        .jwt_manager
        .generate_token_pair(user.id, &user.email)
        .map_err(|_| ApiError::Internal)?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_manager.access_token_expiry_minutes() * 60,
    }))
}

/// Exchange a refresh token for a new token pair
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let claims = state
        .jwt_manager
        .validate_token(&req.refresh_token, TokenType::Refresh)
        .map_err(|_| ApiError::InvalidToken)?;

    // The user may have been removed since the token was issued
    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or(ApiError::InvalidToken)?;

    let (access_token, refresh_token) = state
        .jwt_manager
        .generate_token_pair(user.id, &user.email)
        .map_err(|_| ApiError::Internal)?;

    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_manager.access_token_expiry_minutes() * 60,
    }))
}

/// Return the authenticated user's profile
pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Json<PublicUser>> {
    let user = state
        .users
        .find_by_id(auth_user.user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(user.into_public()))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@example.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("a@.com"));
    }
}
