//! Stripe customer management

use std::collections::HashMap;

use stripe::{CreateCustomer, Customer, CustomerId, ListCustomers};

use memberly_shared::User;

use crate::client::StripeClient;
use crate::error::{BillingError, BillingResult};

/// Customer service for managing Stripe customers
#[derive(Clone)]
pub struct CustomerService {
    stripe: StripeClient,
}

impl CustomerService {
    pub fn new(stripe: StripeClient) -> Self {
        Self { stripe }
    }

    /// Resolve the Stripe customer for a user, creating one if needed.
    ///
    /// The store is not written here: the customer id only lands on the
    /// user record when the checkout.session.completed webhook confirms
    /// it, so an abandoned checkout leaves no half-linked state.
    pub async fn get_or_create(&self, user: &User) -> BillingResult<Customer> {
        if let Some(customer_id) = &user.stripe_customer_id {
            let customer_id = customer_id
                .parse::<CustomerId>()
                .map_err(|e| BillingError::StripeApi(format!("invalid customer id: {}", e)))?;
            let customer = Customer::retrieve(self.stripe.inner(), &customer_id, &[]).await?;
            return Ok(customer);
        }

        // The user may already exist in Stripe from an earlier checkout
        // that never completed
        let mut params = ListCustomers::new();
        params.email = Some(&user.email);
        let existing = Customer::list(self.stripe.inner(), &params).await?;
        if let Some(customer) = existing.data.into_iter().next() {
            return Ok(customer);
        }

        self.create(user).await
    }

    /// Create a new Stripe customer for a user
    async fn create(&self, user: &User) -> BillingResult<Customer> {
        let mut metadata = HashMap::new();
        metadata.insert("user_id".to_string(), user.id.to_string());

        let params = CreateCustomer {
            email: Some(&user.email),
            name: Some(&user.name),
            metadata: Some(metadata),
            ..Default::default()
        };

        let customer = Customer::create(self.stripe.inner(), params).await?;

        tracing::info!(
            user_id = %user.id,
            customer_id = %customer.id,
            "Created Stripe customer"
        );

        Ok(customer)
    }
}
