//! Stripe webhook handling
//!
//! Verifies event signatures over the raw request body, dispatches by
//! event type, and reconciles provider-reported subscription state into
//! the user store. Handlers are idempotent — Stripe redelivers events
//! until it sees a 2xx, so every write must be safe to repeat.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use memberly_shared::{BillingFields, SubscriptionStatus, UserStore};

use crate::error::{BillingError, BillingResult};
use crate::events::{CheckoutSessionObject, EventKind, SubscriptionObject, WebhookEvent};

type HmacSha256 = Hmac<Sha256>;

/// Accept events up to this many seconds away from the signature timestamp
const SIGNATURE_TOLERANCE_SECS: u64 = 300;

/// Checkout session completion sentinel; other statuses are in-progress
/// or expired sessions and carry nothing to reconcile
const SESSION_COMPLETE: &str = "complete";

/// Webhook handler for Stripe events
pub struct WebhookHandler {
    users: Arc<dyn UserStore>,
    webhook_secret: String,
}

impl WebhookHandler {
    pub fn new(users: Arc<dyn UserStore>, webhook_secret: impl Into<String>) -> Self {
        Self {
            users,
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Verify and parse a Stripe webhook event.
    ///
    /// `payload` must be the exact raw bytes received — the signature is
    /// defined over the literal payload, so anything re-serialized
    /// upstream would fail here.
    pub fn verify_event(&self, payload: &str, signature: &str) -> BillingResult<WebhookEvent> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|_| BillingError::SignatureInvalid)?
            .as_secs() as i64;
        self.verify_event_at(payload, signature, now)
    }

    /// Signature check with an explicit clock, split out for tests
    fn verify_event_at(
        &self,
        payload: &str,
        signature: &str,
        now: i64,
    ) -> BillingResult<WebhookEvent> {
        // Signature header format: t=timestamp,v1=signature[,v0=...]
        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<&str> = None;

        for part in signature.split(',') {
            if let Some((key, value)) = part.split_once('=') {
                match key {
                    "t" => timestamp = value.parse().ok(),
                    "v1" => v1_signature = Some(value),
                    _ => {}
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            tracing::warn!("missing timestamp in signature header");
            BillingError::SignatureInvalid
        })?;
        let v1_signature = v1_signature.ok_or_else(|| {
            tracing::warn!("missing v1 signature in signature header");
            BillingError::SignatureInvalid
        })?;

        // The timestamp is attacker-controlled; abs_diff cannot overflow
        // the way a signed subtraction on an extreme value would
        if now.abs_diff(timestamp) > SIGNATURE_TOLERANCE_SECS {
            tracing::warn!(
                timestamp = timestamp,
                now = now,
                "webhook signature timestamp outside tolerance"
            );
            return Err(BillingError::SignatureInvalid);
        }

        // The secret's "whsec_" prefix is not part of the key material
        let secret_key = self
            .webhook_secret
            .strip_prefix("whsec_")
            .unwrap_or(&self.webhook_secret);
        let signed_payload = format!("{}.{}", timestamp, payload);

        let claimed = hex::decode(v1_signature).map_err(|_| {
            tracing::warn!("webhook signature is not valid hex");
            BillingError::SignatureInvalid
        })?;

        let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
            .map_err(|_| BillingError::SignatureInvalid)?;
        mac.update(signed_payload.as_bytes());
        // verify_slice compares in constant time
        mac.verify_slice(&claimed).map_err(|_| {
            tracing::warn!("webhook signature mismatch");
            BillingError::SignatureInvalid
        })?;

        WebhookEvent::from_payload(payload).map_err(|e| {
            // A signed-but-unparseable body shouldn't happen; treat it as
            // a rejected request, not a handler failure
            tracing::error!(error = %e, "verified webhook payload failed to parse");
            BillingError::SignatureInvalid
        })
    }

    /// Dispatch a verified event to its reconciliation handler.
    ///
    /// Unknown event types are acknowledged without error — an
    /// unacknowledged event gets redelivered indefinitely, and there is
    /// nothing to reconcile for types we don't handle.
    pub async fn handle_event(&self, event: WebhookEvent) -> BillingResult<()> {
        match event.kind() {
            EventKind::CheckoutCompleted => self.handle_checkout_completed(&event).await,
            EventKind::SubscriptionChanged => self.handle_subscription_changed(&event).await,
            EventKind::SubscriptionDeleted => self.handle_subscription_deleted(&event).await,
            EventKind::Unhandled => {
                tracing::info!(
                    event_type = %event.event_type,
                    event_id = %event.id,
                    "unhandled Stripe event type - no handler configured"
                );
                Ok(())
            }
        }
    }

    /// checkout.session.completed → link the user to their Stripe ids.
    ///
    /// Deliberately does not touch `subscription_status`: the status is
    /// established by the subscription.created/updated event, so checkout
    /// and subscription events can arrive in either order.
    async fn handle_checkout_completed(&self, event: &WebhookEvent) -> BillingResult<()> {
        let session = CheckoutSessionObject::from_event(event)?;

        if session.status.as_deref() != Some(SESSION_COMPLETE) {
            tracing::info!(
                event_id = %event.id,
                status = ?session.status,
                "checkout session not complete, nothing to reconcile"
            );
            return Ok(());
        }

        // All three identifiers are set by our own checkout creation; a
        // missing one is an integration bug, not a transient condition
        let (Some(user_ref), Some(customer_id), Some(subscription_id)) = (
            session.client_reference_id.as_deref(),
            session.customer.as_deref(),
            session.subscription.as_deref(),
        ) else {
            tracing::error!(
                event_id = %event.id,
                payload = %event.data.object,
                "checkout session missing user reference, customer or subscription"
            );
            return Err(BillingError::MalformedEvent(format!(
                "checkout.session.completed {} missing identifiers",
                event.id
            )));
        };

        let user_id = Uuid::parse_str(user_ref).map_err(|_| {
            BillingError::MalformedEvent(format!(
                "client_reference_id is not a user id: {}",
                user_ref
            ))
        })?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| BillingError::UserNotFound(format!("user {} from checkout", user_id)))?;

        self.users
            .update_billing_fields(
                user.id,
                BillingFields {
                    stripe_customer_id: Some(customer_id.to_string()),
                    stripe_subscription_id: Some(subscription_id.to_string()),
                    subscription_status: None,
                },
            )
            .await?;

        tracing::info!(
            user_id = %user.id,
            customer_id = customer_id,
            subscription_id = subscription_id,
            "checkout completed, billing identifiers linked"
        );

        Ok(())
    }

    /// customer.subscription.created/updated → mirror the provider status.
    ///
    /// Last processed write wins; there is no sequence-number ordering, so
    /// out-of-order deliveries for the same user can overwrite each other.
    async fn handle_subscription_changed(&self, event: &WebhookEvent) -> BillingResult<()> {
        let subscription = SubscriptionObject::from_event(event)?;

        let (Some(subscription_id), Some(customer_id), Some(raw_status)) = (
            subscription.id.as_deref(),
            subscription.customer.as_deref(),
            subscription.status.as_deref(),
        ) else {
            tracing::error!(
                event_id = %event.id,
                payload = %event.data.object,
                "subscription event missing id, customer or status"
            );
            return Err(BillingError::MalformedEvent(format!(
                "{} {} missing identifiers",
                event.event_type, event.id
            )));
        };

        let status = SubscriptionStatus::from_provider(raw_status).ok_or_else(|| {
            BillingError::MalformedEvent(format!("unknown subscription status: {}", raw_status))
        })?;

        // Subscription events are customer-centric: the provider knows our
        // user only through the customer id set at checkout
        let user = self
            .users
            .find_by_stripe_customer_id(customer_id)
            .await?
            .ok_or_else(|| {
                BillingError::UserNotFound(format!("no user for customer {}", customer_id))
            })?;

        self.users
            .update_billing_fields(
                user.id,
                BillingFields {
                    stripe_customer_id: Some(customer_id.to_string()),
                    stripe_subscription_id: Some(subscription_id.to_string()),
                    subscription_status: Some(status),
                },
            )
            .await?;

        tracing::info!(
            user_id = %user.id,
            subscription_id = subscription_id,
            status = %status,
            "subscription state reconciled"
        );

        Ok(())
    }

    /// customer.subscription.deleted → mark the user canceled.
    ///
    /// The customer id is never cleared: it is the durable link back to
    /// the provider, and a canceled user may resubscribe through a new
    /// checkout.
    async fn handle_subscription_deleted(&self, event: &WebhookEvent) -> BillingResult<()> {
        let subscription = SubscriptionObject::from_event(event)?;

        let Some(customer_id) = subscription.customer.as_deref() else {
            tracing::error!(
                event_id = %event.id,
                payload = %event.data.object,
                "subscription deleted event missing customer"
            );
            return Err(BillingError::MalformedEvent(format!(
                "customer.subscription.deleted {} missing customer",
                event.id
            )));
        };

        let user = self
            .users
            .find_by_stripe_customer_id(customer_id)
            .await?
            .ok_or_else(|| {
                BillingError::UserNotFound(format!("no user for customer {}", customer_id))
            })?;

        // Guard against cross-account confusion: the resolved user must
        // actually hold the customer id the event names
        if user.stripe_customer_id.as_deref() != Some(customer_id) {
            tracing::error!(
                user_id = %user.id,
                event_customer = customer_id,
                stored_customer = ?user.stripe_customer_id,
                "cancellation event customer does not match user record"
            );
            return Err(BillingError::PermissionDenied(format!(
                "event customer {} does not match user {}",
                customer_id, user.id
            )));
        }

        self.users
            .update_billing_fields(
                user.id,
                BillingFields {
                    stripe_customer_id: None,
                    stripe_subscription_id: None,
                    subscription_status: Some(SubscriptionStatus::Canceled),
                },
            )
            .await?;

        tracing::info!(
            user_id = %user.id,
            customer_id = customer_id,
            "subscription canceled"
        );

        Ok(())
    }
}
