//! API routes

pub mod auth;
pub mod billing;
pub mod health;
pub mod users;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Public API routes (no auth required) - under /api/v1
    let public_api_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        // Stripe webhook: public, authenticated by signature. The handler
        // takes the raw body (String, not Json) because the signature is
        // computed over the exact bytes Stripe sent.
        .route("/billing/webhook", post(billing::webhook));

    // Protected API routes (Bearer access token required) - under /api/v1
    let protected_api_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/users", get(users::list_users))
        .route("/users/me", patch(users::update_me))
        .route("/billing/checkout", post(billing::create_checkout))
        .route("/billing/portal", post(billing::create_portal))
        .route_layer(middleware::from_fn_with_state(
            state.jwt_manager.clone(),
            crate::auth::require_auth,
        ));

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", public_api_routes.merge(protected_api_routes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
