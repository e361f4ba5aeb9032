//! User store abstraction
//!
//! A single capability set over the relational user table, with a Postgres
//! implementation for production and an in-memory implementation for tests
//! and local development. The store is constructed once at process start
//! and injected everywhere as `Arc<dyn UserStore>` — there is no global.

mod memory;
mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::types::{NewUser, PublicUser, SubscriptionStatus, User};

/// Partial update of a user's profile fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

/// Partial update of a user's billing fields. `None` leaves a field untouched.
///
/// Billing fields are only ever written by webhook reconciliation; note
/// there is no way to clear `stripe_customer_id` — the link to the billing
/// provider is durable across cancellations.
#[derive(Debug, Clone, Default)]
pub struct BillingFields {
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub subscription_status: Option<SubscriptionStatus>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user, assigning an id. Fails with `Conflict` when the
    /// email is already registered.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    async fn read_all(&self) -> Result<Vec<PublicUser>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Customer-centric lookup used by subscription webhooks: the provider
    /// identifies users by its own customer id, not ours.
    async fn find_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Update profile fields; returns `None` when the user does not exist.
    async fn update(&self, id: Uuid, update: UserUpdate)
        -> Result<Option<PublicUser>, StoreError>;

    /// Update billing fields for an existing user. Writing the same values
    /// twice is a no-op effect-wise, which keeps webhook handlers safe to
    /// re-run on redelivery.
    async fn update_billing_fields(
        &self,
        id: Uuid,
        fields: BillingFields,
    ) -> Result<(), StoreError>;
}
