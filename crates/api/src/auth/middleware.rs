//! Request authentication middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::jwt::{JwtManager, TokenType};
use crate::error::ApiError;

/// The authenticated caller, inserted as a request extension by
/// `require_auth`
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

/// Require a valid Bearer access token.
///
/// Applied with `middleware::from_fn_with_state`; handlers behind it can
/// extract `Extension<AuthUser>`.
pub async fn require_auth(
    State(jwt_manager): State<JwtManager>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let claims = jwt_manager
        .validate_token(token, TokenType::Access)
        .map_err(|_| ApiError::InvalidToken)?;

    req.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        email: claims.email,
    });

    Ok(next.run(req).await)
}
