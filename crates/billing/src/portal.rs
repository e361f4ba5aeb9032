//! Stripe billing portal sessions

use stripe::{BillingPortalSession, CreateBillingPortalSession, CustomerId};

use crate::client::StripeClient;
use crate::error::{BillingError, BillingResult};

/// Portal service for the hosted subscription-management UI
#[derive(Clone)]
pub struct PortalService {
    stripe: StripeClient,
}

impl PortalService {
    pub fn new(stripe: StripeClient) -> Self {
        Self { stripe }
    }

    /// Create a portal session for an existing Stripe customer.
    ///
    /// Only callable for users that already carry a customer id; a user
    /// who never checked out has nothing to manage in the portal.
    pub async fn create_portal_session(
        &self,
        customer_id: &str,
    ) -> BillingResult<BillingPortalSession> {
        let customer_id = customer_id
            .parse::<CustomerId>()
            .map_err(|e| BillingError::StripeApi(format!("invalid customer id: {}", e)))?;

        let return_url = format!("{}/account", self.stripe.config().frontend_url);

        let mut params = CreateBillingPortalSession::new(customer_id.clone());
        params.return_url = Some(&return_url);

        let session = BillingPortalSession::create(self.stripe.inner(), params).await?;

        tracing::info!(
            customer_id = %customer_id,
            session_id = %session.id,
            "Created billing portal session"
        );

        Ok(session)
    }
}
