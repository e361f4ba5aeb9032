//! Memberly Billing
//!
//! Stripe integration: customer and checkout-session creation, and the
//! webhook flow that reconciles provider-reported subscription state into
//! local user records.

pub mod checkout;
pub mod client;
pub mod customer;
pub mod error;
pub mod events;
pub mod portal;
pub mod webhooks;

pub use checkout::CheckoutService;
pub use client::{StripeClient, StripeConfig};
pub use customer::CustomerService;
pub use portal::PortalService;
pub use error::{BillingError, BillingResult};
pub use events::{EventKind, WebhookEvent};
pub use webhooks::WebhookHandler;
