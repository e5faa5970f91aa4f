//! Billing webhook event types.
//!
//! The upstream provider's object model is treated as an opaque signed
//! payload; only the fields the reconciler acts on are captured here.

use serde::{Deserialize, Serialize};

/// An inbound billing event (simplified).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillingEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g. "customer.subscription.updated").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (unix seconds).
    pub created: i64,

    /// Event-specific data.
    pub data: BillingEventData,

    /// Whether this is a live mode event (vs test mode).
    #[serde(default)]
    pub livemode: bool,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillingEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,
}

impl BillingEvent {
    /// Parsed form of the event type string.
    pub fn parsed_type(&self) -> BillingEventType {
        BillingEventType::parse(&self.event_type)
    }

    /// Attempts to deserialize the data object as the specified type.
    pub fn deserialize_object<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.object.clone())
    }
}

/// The reconciler's event allow-list.
///
/// Everything outside the three subscription lifecycle events is
/// acknowledged without effect: the sender's event catalog grows without
/// this list being updated in lockstep, so unknown types are never errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEventType {
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    Unknown(String),
}

impl BillingEventType {
    /// Parse event type from its wire string.
    pub fn parse(s: &str) -> Self {
        match s {
            "customer.subscription.created" => Self::SubscriptionCreated,
            "customer.subscription.updated" => Self::SubscriptionUpdated,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Is this an event the reconciler acts on?
    pub fn is_relevant(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

/// The subscription object embedded in a relevant event.
///
/// Every field is optional at the parse stage; presence is enforced by the
/// reconciler's validation step so that a missing field maps to 422 rather
/// than a deserialization error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionEventObject {
    /// External subscription id (the natural idempotency key).
    pub id: Option<String>,

    /// External billing customer id.
    pub customer: Option<String>,

    /// Sender's status string.
    pub status: Option<String>,

    /// End of the current billing period, unix seconds.
    pub current_period_end: Option<i64>,

    #[serde(default)]
    pub cancel_at_period_end: bool,

    /// End of the trial, unix seconds.
    pub trial_end: Option<i64>,

    #[serde(default)]
    pub metadata: EventMetadata,
}

/// Free-form metadata attached by our own checkout flow.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventMetadata {
    pub tier: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_allow_listed_types() {
        assert_eq!(
            BillingEventType::parse("customer.subscription.created"),
            BillingEventType::SubscriptionCreated
        );
        assert_eq!(
            BillingEventType::parse("customer.subscription.updated"),
            BillingEventType::SubscriptionUpdated
        );
        assert_eq!(
            BillingEventType::parse("customer.subscription.deleted"),
            BillingEventType::SubscriptionDeleted
        );
    }

    #[test]
    fn unknown_type_is_not_relevant() {
        let parsed = BillingEventType::parse("invoice.payment_succeeded");
        assert_eq!(
            parsed,
            BillingEventType::Unknown("invoice.payment_succeeded".to_string())
        );
        assert!(!parsed.is_relevant());
    }

    #[test]
    fn event_parses_minimal_payload() {
        let json = serde_json::json!({
            "id": "evt_1",
            "type": "customer.subscription.updated",
            "created": 1_700_000_000,
            "data": { "object": { "id": "sub_1", "customer": "cus_1" } }
        });
        let event: BillingEvent = serde_json::from_value(json).unwrap();
        assert!(!event.livemode);

        let object: SubscriptionEventObject = event.deserialize_object().unwrap();
        assert_eq!(object.id.as_deref(), Some("sub_1"));
        assert_eq!(object.customer.as_deref(), Some("cus_1"));
        assert!(object.status.is_none());
        assert!(!object.cancel_at_period_end);
    }

    #[test]
    fn object_metadata_tier_is_optional() {
        let json = serde_json::json!({
            "id": "sub_1",
            "metadata": { "tier": "pro" }
        });
        let object: SubscriptionEventObject = serde_json::from_value(json).unwrap();
        assert_eq!(object.metadata.tier.as_deref(), Some("pro"));
    }
}
