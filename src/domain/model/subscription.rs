//! Subscription entity.
//!
//! Created and updated exclusively by the webhook reconciler; read by the
//! rest of the application. `stripe_subscription_id` is the natural
//! idempotency key: at most one record exists per external subscription id,
//! and repeated reconciliation events upsert, never duplicate.

use serde::{Deserialize, Serialize};

/// Paid tier of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Basic,
    Pro,
    Enterprise,
}

impl Tier {
    /// Parse a tier from its stored string form. Unknown values fall back
    /// to `Free` rather than failing the event that carried them.
    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "basic" => Tier::Basic,
            "pro" => Tier::Pro,
            "enterprise" => Tier::Enterprise,
            _ => Tier::Free,
        }
    }
}

/// Lifecycle status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    PastDue,
    Trialing,
}

impl SubscriptionStatus {
    /// Map the sender's status string into our four-state lifecycle.
    ///
    /// The sender's status vocabulary is wider than ours; payment-trouble
    /// states collapse to `PastDue` and terminal states to `Canceled`.
    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "active" => SubscriptionStatus::Active,
            "trialing" => SubscriptionStatus::Trialing,
            "past_due" | "unpaid" | "incomplete" => SubscriptionStatus::PastDue,
            _ => SubscriptionStatus::Canceled,
        }
    }
}

/// A stored subscription row/document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub tier: Tier,
    pub status: SubscriptionStatus,
    /// End of the current billing period, unix milliseconds.
    pub current_period_end: i64,
    pub cancel_at_period_end: bool,
    /// End of the trial, unix milliseconds. Persisted as an explicit null
    /// when absent, never omitted.
    pub trial_end: Option<i64>,
    pub stripe_customer_id: String,
    pub stripe_subscription_id: String,
}

/// The reconciler's write shape: everything except the server-assigned `id`.
///
/// Upserts key on `stripe_subscription_id`; delivering the same record twice
/// converges to a single stored subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub user_id: String,
    pub tier: Tier,
    pub status: SubscriptionStatus,
    pub current_period_end: i64,
    pub cancel_at_period_end: bool,
    pub trial_end: Option<i64>,
    pub stripe_customer_id: String,
    pub stripe_subscription_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_parses_known_values() {
        assert_eq!(Tier::parse_lossy("pro"), Tier::Pro);
        assert_eq!(Tier::parse_lossy("enterprise"), Tier::Enterprise);
    }

    #[test]
    fn tier_falls_back_to_free() {
        assert_eq!(Tier::parse_lossy("platinum"), Tier::Free);
    }

    #[test]
    fn status_collapses_payment_trouble_to_past_due() {
        assert_eq!(
            SubscriptionStatus::parse_lossy("unpaid"),
            SubscriptionStatus::PastDue
        );
        assert_eq!(
            SubscriptionStatus::parse_lossy("incomplete"),
            SubscriptionStatus::PastDue
        );
    }

    #[test]
    fn status_collapses_terminal_to_canceled() {
        assert_eq!(
            SubscriptionStatus::parse_lossy("incomplete_expired"),
            SubscriptionStatus::Canceled
        );
    }

    #[test]
    fn trial_end_serializes_as_explicit_null() {
        let record = SubscriptionRecord {
            user_id: "u1".to_string(),
            tier: Tier::Pro,
            status: SubscriptionStatus::Active,
            current_period_end: 1_700_000_000_000,
            cancel_at_period_end: false,
            trial_end: None,
            stripe_customer_id: "cus_1".to_string(),
            stripe_subscription_id: "sub_1".to_string(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("trial_end").unwrap().is_null());
    }
}
