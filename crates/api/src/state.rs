//! Shared application state

use std::sync::Arc;

use sqlx::PgPool;

use memberly_billing::{
    CheckoutService, CustomerService, PortalService, StripeClient, WebhookHandler,
};
use memberly_shared::UserStore;

use crate::auth::JwtManager;
use crate::config::Config;

/// Billing services bundled for the routes that need them
#[derive(Clone)]
pub struct BillingState {
    pub customers: CustomerService,
    pub checkout: CheckoutService,
    pub portal: PortalService,
    pub webhooks: Arc<WebhookHandler>,
}

impl BillingState {
    pub fn new(stripe: StripeClient, users: Arc<dyn UserStore>) -> Self {
        let webhook_secret = stripe.config().webhook_secret.clone();
        Self {
            customers: CustomerService::new(stripe.clone()),
            checkout: CheckoutService::new(stripe.clone()),
            portal: PortalService::new(stripe),
            webhooks: Arc::new(WebhookHandler::new(users, webhook_secret)),
        }
    }
}

/// Application state shared across all request handlers.
///
/// Constructed once in `main` and cloned per request; the store is an
/// injected trait object, so nothing here is a lazily-initialized global.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserStore>,
    pub jwt_manager: JwtManager,
    pub billing: BillingState,
    /// Present only with the Postgres backend; used by health checks
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        stripe: StripeClient,
        pool: Option<PgPool>,
    ) -> Self {
        let jwt_manager = JwtManager::new(
            &config.jwt_secret,
            config.access_token_expiry_minutes,
            config.refresh_token_expiry_days,
        );
        let billing = BillingState::new(stripe, users.clone());
        Self {
            config: Arc::new(config),
            users,
            jwt_manager,
            billing,
            pool,
        }
    }
}
