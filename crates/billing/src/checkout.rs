//! Stripe Checkout sessions

use stripe::{
    CheckoutSession, CheckoutSessionMode, CreateCheckoutSession, CreateCheckoutSessionLineItems,
    CustomerId,
};
use uuid::Uuid;

use crate::client::StripeClient;
use crate::error::{BillingError, BillingResult};

/// Checkout service for creating Stripe checkout sessions
#[derive(Clone)]
pub struct CheckoutService {
    stripe: StripeClient,
}

impl CheckoutService {
    pub fn new(stripe: StripeClient) -> Self {
        Self { stripe }
    }

    /// Create a subscription checkout session for a user.
    ///
    /// `client_reference_id` carries our user id through the hosted flow;
    /// the checkout.session.completed webhook uses it to find the user
    /// again, so it must be set here or the reconciliation breaks.
    pub async fn create_subscription_checkout(
        &self,
        user_id: Uuid,
        customer_id: &str,
    ) -> BillingResult<CheckoutSession> {
        let customer_id = customer_id
            .parse::<CustomerId>()
            .map_err(|e| BillingError::StripeApi(format!("invalid customer id: {}", e)))?;

        let base_url = &self.stripe.config().frontend_url;
        let success_url = format!("{}/success", base_url);
        let cancel_url = format!("{}/canceled", base_url);
        let user_ref = user_id.to_string();

        let params = CreateCheckoutSession {
            customer: Some(customer_id),
            client_reference_id: Some(&user_ref),
            mode: Some(CheckoutSessionMode::Subscription),
            line_items: Some(vec![CreateCheckoutSessionLineItems {
                price: Some(self.stripe.config().price_monthly.clone()),
                quantity: Some(1),
                ..Default::default()
            }]),
            success_url: Some(&success_url),
            cancel_url: Some(&cancel_url),
            ..Default::default()
        };

        let session = CheckoutSession::create(self.stripe.inner(), params).await?;

        tracing::info!(
            user_id = %user_id,
            session_id = %session.id,
            "Created checkout session"
        );

        Ok(session)
    }
}
