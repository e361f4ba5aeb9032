//! Billing error types

use memberly_shared::StoreError;
use thiserror::Error;

/// Billing-specific errors
///
/// Webhook handling distinguishes the one non-retryable failure
/// (`SignatureInvalid`, the provider will just resend the same bad
/// signature) from everything else, which surfaces as a 5xx so the
/// provider's redelivery takes another pass.
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("webhook signature verification failed")]
    SignatureInvalid,

    #[error("malformed webhook event: {0}")]
    MalformedEvent(String),

    #[error("no user for webhook event: {0}")]
    UserNotFound(String),

    #[error("customer id mismatch: {0}")]
    PermissionDenied(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("Stripe API error: {0}")]
    StripeApi(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<stripe::StripeError> for BillingError {
    fn from(err: stripe::StripeError) -> Self {
        BillingError::StripeApi(err.to_string())
    }
}

pub type BillingResult<T> = Result<T, BillingError>;
