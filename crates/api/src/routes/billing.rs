//! Billing routes for Stripe integration

use axum::{
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;

use crate::{auth::AuthUser, error::ApiError, state::AppState};

/// Response from creating a checkout session
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: Option<String>,
}

/// Create a checkout session for the authenticated user
pub async fn create_checkout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    let user = state
        .users
        .find_by_id(auth_user.user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let customer = state.billing.customers.get_or_create(&user).await?;

    let session = state
        .billing
        .checkout
        .create_subscription_checkout(user.id, customer.id.as_str())
        .await?;

    Ok((StatusCode::CREATED, Json(CheckoutResponse { url: session.url })))
}

/// Response from creating a billing portal session
#[derive(Debug, Serialize)]
pub struct PortalResponse {
    pub url: String,
}

/// Create a billing portal session for the authenticated user.
///
/// Requires an existing Stripe customer: a user who never completed a
/// checkout has no subscription to manage.
pub async fn create_portal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<(StatusCode, Json<PortalResponse>), ApiError> {
    let user = state
        .users
        .find_by_id(auth_user.user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let customer_id = user.stripe_customer_id.as_deref().ok_or_else(|| {
        ApiError::BadRequest("No billing account; complete a checkout first".to_string())
    })?;

    let session = state
        .billing
        .portal
        .create_portal_session(customer_id)
        .await?;

    Ok((StatusCode::CREATED, Json(PortalResponse { url: session.url })))
}

/// Handle Stripe webhook events.
///
/// The body parameter is the raw request body: signature verification is
/// defined over the exact bytes Stripe sent, so this route must never go
/// through a JSON extractor.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Stripe webhook missing signature header");
            ApiError::BadRequest("Missing Stripe signature".to_string())
        })?;

    let event = state
        .billing
        .webhooks
        .verify_event(&body, signature)
        .map_err(|e| {
            tracing::warn!(error = ?e, "Stripe webhook signature verification failed");
            ApiError::from(e)
        })?;

    tracing::info!(
        event_type = %event.event_type,
        event_id = %event.id,
        "Stripe webhook event verified"
    );

    let event_id = event.id.clone();
    let event_type = event.event_type.clone();
    state.billing.webhooks.handle_event(event).await.map_err(|e| {
        tracing::error!(
            event_type = %event_type,
            event_id = %event_id,
            error = %e,
            "Stripe webhook handling failed"
        );
        ApiError::from(e)
    })?;

    Ok(Json(serde_json::json!({ "received": true })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use uuid::Uuid;

    use memberly_billing::{StripeClient, StripeConfig};
    use memberly_shared::{MemoryUserStore, User};

    use crate::config::{Config, StoreBackend};

    fn test_state(store: Arc<MemoryUserStore>) -> AppState {
        let config = Config {
            bind_address: "127.0.0.1:0".to_string(),
            store_backend: StoreBackend::Memory,
            database_url: None,
            database_max_connections: 1,
            jwt_secret: "test-jwt-secret-must-be-at-least-32-characters-long".to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        };
        let stripe = StripeClient::new(StripeConfig {
            secret_key: "sk_test_dummy".to_string(),
            webhook_secret: "whsec_test".to_string(),
            price_monthly: "price_dummy".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
        });
        AppState::new(config, store, stripe, None)
    }

    fn seed_user(store: &MemoryUserStore, customer_id: Option<&str>) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "hash".to_string(),
            stripe_customer_id: customer_id.map(ToString::to_string),
            stripe_subscription_id: None,
            subscription_status: None,
        };
        store.insert(user.clone());
        user
    }

    #[tokio::test]
    async fn portal_requires_an_existing_customer() {
        let store = Arc::new(MemoryUserStore::new());
        let user = seed_user(&store, None);
        let state = test_state(store);

        let err = create_portal(
            State(state),
            Extension(AuthUser {
                user_id: user.id,
                email: user.email,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn portal_for_unknown_user_is_not_found() {
        let store = Arc::new(MemoryUserStore::new());
        let state = test_state(store);

        let err = create_portal(
            State(state),
            Extension(AuthUser {
                user_id: Uuid::new_v4(),
                email: "ghost@example.com".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }
}
