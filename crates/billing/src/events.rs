//! Webhook event model
//!
//! Stripe event envelopes are deserialized from the exact raw payload the
//! signature was verified over. Only the fields the reconciliation
//! handlers consume are typed; the rest of the object stays as raw JSON
//! so unknown event shapes never fail parsing.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{BillingError, BillingResult};

/// A verified webhook event envelope
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: Value,
}

impl WebhookEvent {
    pub fn from_payload(payload: &str) -> BillingResult<Self> {
        serde_json::from_str(payload)
            .map_err(|e| BillingError::MalformedEvent(format!("invalid event JSON: {}", e)))
    }

    pub fn kind(&self) -> EventKind {
        EventKind::of(&self.event_type)
    }
}

/// Dispatch target for an event type. Pure lookup by type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// `checkout.session.completed`
    CheckoutCompleted,
    /// `customer.subscription.created` / `customer.subscription.updated`
    SubscriptionChanged,
    /// `customer.subscription.deleted`
    SubscriptionDeleted,
    /// Anything else: acknowledged, never an error
    Unhandled,
}

impl EventKind {
    pub fn of(event_type: &str) -> Self {
        match event_type {
            "checkout.session.completed" => Self::CheckoutCompleted,
            "customer.subscription.created" | "customer.subscription.updated" => {
                Self::SubscriptionChanged
            }
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            _ => Self::Unhandled,
        }
    }
}

/// Accepts either a bare id string or an expanded object with an `id`
/// field — Stripe serializes expandable references both ways.
fn expandable_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(id)) => Some(id),
        Some(Value::Object(obj)) => obj
            .get("id")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        _ => None,
    })
}

/// The slice of a checkout session object the checkout handler needs
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    /// Application user id, captured at session creation time
    pub client_reference_id: Option<String>,
    #[serde(default, deserialize_with = "expandable_id")]
    pub customer: Option<String>,
    #[serde(default, deserialize_with = "expandable_id")]
    pub subscription: Option<String>,
    pub status: Option<String>,
}

impl CheckoutSessionObject {
    pub fn from_event(event: &WebhookEvent) -> BillingResult<Self> {
        serde_json::from_value(event.data.object.clone()).map_err(|e| {
            BillingError::MalformedEvent(format!("invalid checkout session object: {}", e))
        })
    }
}

/// The slice of a subscription object the subscription handlers need
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: Option<String>,
    #[serde(default, deserialize_with = "expandable_id")]
    pub customer: Option<String>,
    pub status: Option<String>,
}

impl SubscriptionObject {
    pub fn from_event(event: &WebhookEvent) -> BillingResult<Self> {
        serde_json::from_value(event.data.object.clone()).map_err(|e| {
            BillingError::MalformedEvent(format!("invalid subscription object: {}", e))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_known_types() {
        assert_eq!(
            EventKind::of("checkout.session.completed"),
            EventKind::CheckoutCompleted
        );
        assert_eq!(
            EventKind::of("customer.subscription.created"),
            EventKind::SubscriptionChanged
        );
        assert_eq!(
            EventKind::of("customer.subscription.updated"),
            EventKind::SubscriptionChanged
        );
        assert_eq!(
            EventKind::of("customer.subscription.deleted"),
            EventKind::SubscriptionDeleted
        );
        assert_eq!(EventKind::of("payment_intent.created"), EventKind::Unhandled);
    }

    #[test]
    fn expandable_customer_accepts_string_or_object() {
        let from_string: SubscriptionObject = serde_json::from_value(serde_json::json!({
            "id": "sub_1",
            "customer": "cus_1",
            "status": "active"
        }))
        .unwrap();
        assert_eq!(from_string.customer.as_deref(), Some("cus_1"));

        let from_object: SubscriptionObject = serde_json::from_value(serde_json::json!({
            "id": "sub_1",
            "customer": {"id": "cus_1", "email": "a@example.com"},
            "status": "active"
        }))
        .unwrap();
        assert_eq!(from_object.customer.as_deref(), Some("cus_1"));
    }

    #[test]
    fn envelope_parses_with_unknown_object_shape() {
        let event = WebhookEvent::from_payload(
            r#"{
                "id": "evt_1",
                "type": "payment_intent.created",
                "created": 1,
                "data": {"object": {"anything": true}}
            }"#,
        )
        .unwrap();
        assert_eq!(event.kind(), EventKind::Unhandled);
    }
}
