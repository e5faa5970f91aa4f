//! Billing webhook reconciliation.
//!
//! One delivery walks the pipeline: verify signature, filter by event type,
//! resolve the billing customer to a profile, validate the payload, then
//! upsert the subscription under a bounded retry. Each gate maps to one
//! HTTP status (see [`WebhookError::status_code`]); only the upsert and the
//! profile lookup are allowed to hand the delivery back to the sender's
//! retry machinery.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::billing::{
    run_with_retry, RetryPolicy, SubscriptionEventObject, WebhookError, WebhookVerifier,
};
use crate::domain::model::{SubscriptionRecord, SubscriptionStatus, Tier};
use crate::ports::{ProfileStore, SubscriptionStore};

/// What the pipeline did with a delivery. Both variants acknowledge with
/// HTTP 200; the sender must never redeliver either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A subscription was written.
    Processed { stripe_subscription_id: String },
    /// The event type is outside the allow-list; nothing was written.
    Ignored { event_type: String },
}

pub struct ReconcileWebhookHandler {
    verifier: WebhookVerifier,
    profiles: Arc<dyn ProfileStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    retry: RetryPolicy,
}

impl ReconcileWebhookHandler {
    pub fn new(
        webhook_secret: impl Into<String>,
        profiles: Arc<dyn ProfileStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            verifier: WebhookVerifier::new(webhook_secret),
            profiles,
            subscriptions,
            retry,
        }
    }

    /// Runs one delivery through the pipeline.
    ///
    /// `payload` is the raw request body, byte for byte as received; the
    /// signature covers it, so it must not have been re-serialized.
    pub async fn handle(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<Outcome, WebhookError> {
        // Logged before verification: presence only, never the value.
        debug!(
            signature_present = signature_header.is_some(),
            payload_bytes = payload.len(),
            "billing webhook received"
        );
        let header = signature_header.ok_or(WebhookError::MissingSignature)?;
        let event = self.verifier.verify_and_parse(payload, header)?;

        if !event.parsed_type().is_relevant() {
            info!(
                event_id = %event.id,
                event_type = %event.event_type,
                "billing event outside allow-list, acknowledging without effect"
            );
            return Ok(Outcome::Ignored {
                event_type: event.event_type,
            });
        }

        let object: SubscriptionEventObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        let customer_id = object
            .customer
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(WebhookError::MissingField("customer"))?;

        let profile = self
            .profiles
            .get_by_stripe_customer_id(customer_id)
            .await
            .map_err(WebhookError::Lookup)?;
        let Some(profile) = profile else {
            warn!(
                event_id = %event.id,
                customer_id = %customer_id,
                subscription_id = ?object.id,
                "no profile owns this billing customer"
            );
            return Err(WebhookError::UnknownCustomer(customer_id.to_string()));
        };

        let fallback_tier = self.current_tier(&object).await?;
        let record = build_subscription_record(&profile.id, &object, fallback_tier)?;

        let stripe_subscription_id = record.stripe_subscription_id.clone();
        let subscriptions = self.subscriptions.clone();
        let stored = run_with_retry(&self.retry, "subscription_upsert", move || {
            let subscriptions = subscriptions.clone();
            let record = record.clone();
            async move { subscriptions.upsert(record).await }
        })
        .await
        .map_err(|source| WebhookError::Persistence {
            attempts: self.retry.max_attempts,
            source,
        })?;

        info!(
            event_id = %event.id,
            event_type = %event.event_type,
            subscription_id = %stored.id,
            status = ?stored.status,
            "billing event reconciled"
        );
        Ok(Outcome::Processed {
            stripe_subscription_id,
        })
    }

    /// Tier of the already-stored subscription, if any. Used when the event
    /// carries no `metadata.tier`.
    async fn current_tier(
        &self,
        object: &SubscriptionEventObject,
    ) -> Result<Tier, WebhookError> {
        if object.metadata.tier.is_some() {
            // The mapping function will take the metadata tier; skip the read.
            return Ok(Tier::Free);
        }
        let Some(subscription_id) = object.id.as_deref() else {
            return Ok(Tier::Free);
        };
        let existing = self
            .subscriptions
            .get_by_stripe_subscription_id(subscription_id)
            .await
            .map_err(WebhookError::Lookup)?;
        Ok(existing.map(|s| s.tier).unwrap_or(Tier::Free))
    }
}

/// Pure mapping from a validated event object to the write shape.
///
/// Seconds become milliseconds here and nowhere else; an absent `trial_end`
/// stays `None` and persists as an explicit null.
pub fn build_subscription_record(
    user_id: &str,
    object: &SubscriptionEventObject,
    fallback_tier: Tier,
) -> Result<SubscriptionRecord, WebhookError> {
    let subscription_id = object
        .id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(WebhookError::MissingField("id"))?;
    let customer_id = object
        .customer
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(WebhookError::MissingField("customer"))?;
    let status = object
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(WebhookError::MissingField("status"))?;
    let current_period_end = object
        .current_period_end
        .ok_or(WebhookError::MissingField("current_period_end"))?;
    if user_id.is_empty() {
        return Err(WebhookError::MissingField("user_id"));
    }

    let tier = object
        .metadata
        .tier
        .as_deref()
        .map(Tier::parse_lossy)
        .unwrap_or(fallback_tier);

    Ok(SubscriptionRecord {
        user_id: user_id.to_string(),
        tier,
        status: SubscriptionStatus::parse_lossy(status),
        current_period_end: current_period_end.saturating_mul(1000),
        cancel_at_period_end: object.cancel_at_period_end,
        trial_end: object.trial_end.map(|secs| secs.saturating_mul(1000)),
        stripe_customer_id: customer_id.to_string(),
        stripe_subscription_id: subscription_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use crate::domain::billing::compute_test_signature;
    use crate::domain::foundation::{StoreError, StoreResult};
    use crate::domain::model::{
        NewProfile, Profile, ProfileUpdate, Role, Subscription, SubscriptionRecord,
    };

    const TEST_SECRET: &str = "whsec_reconciler_test";

    // ══════════════════════════════════════════════════════════════
    // Mocks
    // ══════════════════════════════════════════════════════════════

    struct MockProfileStore {
        by_customer: Option<Profile>,
        fail_lookup: bool,
    }

    impl MockProfileStore {
        fn with_profile(customer_id: &str) -> Self {
            Self {
                by_customer: Some(test_profile(customer_id)),
                fail_lookup: false,
            }
        }

        fn empty() -> Self {
            Self {
                by_customer: None,
                fail_lookup: false,
            }
        }
    }

    fn test_profile(customer_id: &str) -> Profile {
        Profile {
            id: "user-1".to_string(),
            full_name: "Test Builder".to_string(),
            role: Role::Builder,
            email: "builder@example.com".to_string(),
            avatar_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            stripe_customer_id: Some(customer_id.to_string()),
        }
    }

    #[async_trait]
    impl ProfileStore for MockProfileStore {
        async fn get_all(&self) -> StoreResult<Vec<Profile>> {
            Ok(self.by_customer.clone().into_iter().collect())
        }
        async fn get_by_id(&self, _id: &str) -> StoreResult<Option<Profile>> {
            Ok(self.by_customer.clone())
        }
        async fn get_by_stripe_customer_id(
            &self,
            customer_id: &str,
        ) -> StoreResult<Option<Profile>> {
            if self.fail_lookup {
                return Err(StoreError::Connection("lookup down".to_string()));
            }
            Ok(self
                .by_customer
                .clone()
                .filter(|p| p.stripe_customer_id.as_deref() == Some(customer_id)))
        }
        async fn create(&self, _input: NewProfile) -> StoreResult<Profile> {
            unimplemented!("not exercised")
        }
        async fn update(
            &self,
            _id: &str,
            _update: ProfileUpdate,
        ) -> StoreResult<Option<Profile>> {
            unimplemented!("not exercised")
        }
        async fn delete(&self, _id: &str) -> StoreResult<()> {
            unimplemented!("not exercised")
        }
    }

    /// Counts upserts and fails the first `fail_first` of them.
    struct MockSubscriptionStore {
        upsert_calls: AtomicU32,
        fail_first: u32,
        stored: Mutex<Vec<SubscriptionRecord>>,
        existing_tier: Option<Tier>,
    }

    impl MockSubscriptionStore {
        fn reliable() -> Self {
            Self::failing_first(0)
        }

        fn failing_first(fail_first: u32) -> Self {
            Self {
                upsert_calls: AtomicU32::new(0),
                fail_first,
                stored: Mutex::new(Vec::new()),
                existing_tier: None,
            }
        }

        fn upsert_count(&self) -> u32 {
            self.upsert_calls.load(Ordering::SeqCst)
        }

        fn last_record(&self) -> SubscriptionRecord {
            self.stored.lock().unwrap().last().unwrap().clone()
        }
    }

    fn stored_subscription(record: &SubscriptionRecord) -> Subscription {
        Subscription {
            id: "stored-1".to_string(),
            user_id: record.user_id.clone(),
            tier: record.tier,
            status: record.status,
            current_period_end: record.current_period_end,
            cancel_at_period_end: record.cancel_at_period_end,
            trial_end: record.trial_end,
            stripe_customer_id: record.stripe_customer_id.clone(),
            stripe_subscription_id: record.stripe_subscription_id.clone(),
        }
    }

    #[async_trait]
    impl SubscriptionStore for MockSubscriptionStore {
        async fn get_all(&self) -> StoreResult<Vec<Subscription>> {
            Ok(Vec::new())
        }
        async fn get_by_id(&self, _id: &str) -> StoreResult<Option<Subscription>> {
            Ok(None)
        }
        async fn get_by_user_id(&self, _user_id: &str) -> StoreResult<Option<Subscription>> {
            Ok(None)
        }
        async fn get_by_stripe_subscription_id(
            &self,
            stripe_subscription_id: &str,
        ) -> StoreResult<Option<Subscription>> {
            Ok(self.existing_tier.map(|tier| {
                let record = SubscriptionRecord {
                    user_id: "user-1".to_string(),
                    tier,
                    status: SubscriptionStatus::Active,
                    current_period_end: 0,
                    cancel_at_period_end: false,
                    trial_end: None,
                    stripe_customer_id: "cus_1".to_string(),
                    stripe_subscription_id: stripe_subscription_id.to_string(),
                };
                stored_subscription(&record)
            }))
        }
        async fn upsert(&self, record: SubscriptionRecord) -> StoreResult<Subscription> {
            let call = self.upsert_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.fail_first {
                return Err(StoreError::Connection(format!("write failed (call {call})")));
            }
            let stored = stored_subscription(&record);
            self.stored.lock().unwrap().push(record);
            Ok(stored)
        }
        async fn delete(&self, _id: &str) -> StoreResult<()> {
            unimplemented!("not exercised")
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Fixtures
    // ══════════════════════════════════════════════════════════════

    fn handler(
        profiles: MockProfileStore,
        subscriptions: Arc<MockSubscriptionStore>,
    ) -> ReconcileWebhookHandler {
        ReconcileWebhookHandler::new(
            TEST_SECRET,
            Arc::new(profiles),
            subscriptions,
            RetryPolicy::immediate(3),
        )
    }

    fn subscription_event(event_type: &str, object: serde_json::Value) -> String {
        serde_json::json!({
            "id": "evt_1",
            "type": event_type,
            "created": Utc::now().timestamp(),
            "data": { "object": object },
            "livemode": false,
        })
        .to_string()
    }

    fn signed_header(payload: &str) -> String {
        let timestamp = Utc::now().timestamp();
        let signature = compute_test_signature(TEST_SECRET, timestamp, payload);
        format!("t={timestamp},v1={signature}")
    }

    fn full_object() -> serde_json::Value {
        serde_json::json!({
            "id": "sub_123",
            "customer": "cus_123",
            "status": "active",
            "current_period_end": 1_700_000_000,
            "cancel_at_period_end": false,
            "trial_end": null,
            "metadata": { "tier": "pro" },
        })
    }

    async fn run(
        handler: &ReconcileWebhookHandler,
        payload: &str,
        header: Option<&str>,
    ) -> Result<Outcome, WebhookError> {
        handler.handle(payload.as_bytes(), header).await
    }

    // ══════════════════════════════════════════════════════════════
    // Signature Gate
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn missing_signature_is_rejected_before_any_read() {
        let subscriptions = Arc::new(MockSubscriptionStore::reliable());
        let handler = handler(MockProfileStore::with_profile("cus_123"), subscriptions.clone());
        let payload = subscription_event("customer.subscription.updated", full_object());

        let result = run(&handler, &payload, None).await;

        assert!(matches!(result, Err(WebhookError::MissingSignature)));
        assert_eq!(subscriptions.upsert_count(), 0);
    }

    #[tokio::test]
    async fn bad_signature_is_rejected() {
        let subscriptions = Arc::new(MockSubscriptionStore::reliable());
        let handler = handler(MockProfileStore::with_profile("cus_123"), subscriptions.clone());
        let payload = subscription_event("customer.subscription.updated", full_object());
        let header = format!("t={},v1={}", Utc::now().timestamp(), "0".repeat(64));

        let result = run(&handler, &payload, Some(&header)).await;

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
        assert_eq!(subscriptions.upsert_count(), 0);
    }

    // ══════════════════════════════════════════════════════════════
    // Event Filter
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn unknown_event_type_is_acknowledged_without_writes() {
        let subscriptions = Arc::new(MockSubscriptionStore::reliable());
        let handler = handler(MockProfileStore::with_profile("cus_123"), subscriptions.clone());
        let payload = subscription_event("invoice.payment_succeeded", full_object());

        let outcome = run(&handler, &payload, Some(&signed_header(&payload)))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Ignored {
                event_type: "invoice.payment_succeeded".to_string()
            }
        );
        assert_eq!(subscriptions.upsert_count(), 0);
    }

    // ══════════════════════════════════════════════════════════════
    // User Resolution
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn unknown_customer_is_a_permanent_failure() {
        let subscriptions = Arc::new(MockSubscriptionStore::reliable());
        let handler = handler(MockProfileStore::empty(), subscriptions.clone());
        let payload = subscription_event("customer.subscription.created", full_object());

        let result = run(&handler, &payload, Some(&signed_header(&payload))).await;

        match result {
            Err(WebhookError::UnknownCustomer(customer)) => assert_eq!(customer, "cus_123"),
            other => panic!("expected UnknownCustomer, got {other:?}"),
        }
        assert_eq!(subscriptions.upsert_count(), 0);
    }

    #[tokio::test]
    async fn failed_profile_lookup_is_retryable() {
        let subscriptions = Arc::new(MockSubscriptionStore::reliable());
        let profiles = MockProfileStore {
            by_customer: None,
            fail_lookup: true,
        };
        let handler = handler(profiles, subscriptions.clone());
        let payload = subscription_event("customer.subscription.created", full_object());

        let result = run(&handler, &payload, Some(&signed_header(&payload))).await;

        match result {
            Err(err @ WebhookError::Lookup(_)) => assert!(err.is_retryable()),
            other => panic!("expected Lookup, got {other:?}"),
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Validation Gate
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn missing_status_fails_validation() {
        let subscriptions = Arc::new(MockSubscriptionStore::reliable());
        let handler = handler(MockProfileStore::with_profile("cus_123"), subscriptions.clone());
        let mut object = full_object();
        object.as_object_mut().unwrap().remove("status");
        let payload = subscription_event("customer.subscription.updated", object);

        let result = run(&handler, &payload, Some(&signed_header(&payload))).await;

        assert!(matches!(result, Err(WebhookError::MissingField("status"))));
        assert_eq!(subscriptions.upsert_count(), 0);
    }

    #[tokio::test]
    async fn missing_period_end_fails_validation() {
        let subscriptions = Arc::new(MockSubscriptionStore::reliable());
        let handler = handler(MockProfileStore::with_profile("cus_123"), subscriptions.clone());
        let mut object = full_object();
        object.as_object_mut().unwrap().remove("current_period_end");
        let payload = subscription_event("customer.subscription.updated", object);

        let result = run(&handler, &payload, Some(&signed_header(&payload))).await;

        assert!(matches!(
            result,
            Err(WebhookError::MissingField("current_period_end"))
        ));
    }

    #[tokio::test]
    async fn missing_customer_fails_before_lookup() {
        let subscriptions = Arc::new(MockSubscriptionStore::reliable());
        let handler = handler(MockProfileStore::with_profile("cus_123"), subscriptions.clone());
        let mut object = full_object();
        object.as_object_mut().unwrap().remove("customer");
        let payload = subscription_event("customer.subscription.updated", object);

        let result = run(&handler, &payload, Some(&signed_header(&payload))).await;

        assert!(matches!(result, Err(WebhookError::MissingField("customer"))));
    }

    // ══════════════════════════════════════════════════════════════
    // Upsert and Retry
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn successful_event_upserts_once() {
        let subscriptions = Arc::new(MockSubscriptionStore::reliable());
        let handler = handler(MockProfileStore::with_profile("cus_123"), subscriptions.clone());
        let payload = subscription_event("customer.subscription.created", full_object());

        let outcome = run(&handler, &payload, Some(&signed_header(&payload)))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Processed {
                stripe_subscription_id: "sub_123".to_string()
            }
        );
        assert_eq!(subscriptions.upsert_count(), 1);

        let record = subscriptions.last_record();
        assert_eq!(record.user_id, "user-1");
        assert_eq!(record.tier, Tier::Pro);
        assert_eq!(record.status, SubscriptionStatus::Active);
        assert_eq!(record.current_period_end, 1_700_000_000_000);
        assert_eq!(record.trial_end, None);
    }

    #[tokio::test]
    async fn transient_failure_then_success_takes_two_attempts() {
        let subscriptions = Arc::new(MockSubscriptionStore::failing_first(1));
        let handler = handler(MockProfileStore::with_profile("cus_123"), subscriptions.clone());
        let payload = subscription_event("customer.subscription.updated", full_object());

        let outcome = run(&handler, &payload, Some(&signed_header(&payload))).await;

        assert!(outcome.is_ok());
        assert_eq!(subscriptions.upsert_count(), 2);
    }

    #[tokio::test]
    async fn persistent_failure_stops_after_three_attempts() {
        let subscriptions = Arc::new(MockSubscriptionStore::failing_first(u32::MAX));
        let handler = handler(MockProfileStore::with_profile("cus_123"), subscriptions.clone());
        let payload = subscription_event("customer.subscription.deleted", full_object());

        let result = run(&handler, &payload, Some(&signed_header(&payload))).await;

        match result {
            Err(WebhookError::Persistence { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected Persistence, got {other:?}"),
        }
        assert_eq!(subscriptions.upsert_count(), 3);
    }

    #[tokio::test]
    async fn redelivery_converges_through_the_same_upsert_key() {
        let subscriptions = Arc::new(MockSubscriptionStore::reliable());
        let handler = handler(MockProfileStore::with_profile("cus_123"), subscriptions.clone());
        let payload = subscription_event("customer.subscription.updated", full_object());
        let header = signed_header(&payload);

        run(&handler, &payload, Some(&header)).await.unwrap();
        run(&handler, &payload, Some(&header)).await.unwrap();

        assert_eq!(subscriptions.upsert_count(), 2);
        let first = subscriptions.stored.lock().unwrap()[0].clone();
        let second = subscriptions.last_record();
        assert_eq!(first, second);
        assert_eq!(first.stripe_subscription_id, "sub_123");
    }

    // ══════════════════════════════════════════════════════════════
    // Tier Derivation
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn tier_falls_back_to_existing_subscription() {
        let mut store = MockSubscriptionStore::reliable();
        store.existing_tier = Some(Tier::Enterprise);
        let subscriptions = Arc::new(store);
        let handler = handler(MockProfileStore::with_profile("cus_123"), subscriptions.clone());
        let mut object = full_object();
        object.as_object_mut().unwrap().remove("metadata");
        let payload = subscription_event("customer.subscription.updated", object);

        run(&handler, &payload, Some(&signed_header(&payload)))
            .await
            .unwrap();

        assert_eq!(subscriptions.last_record().tier, Tier::Enterprise);
    }

    #[tokio::test]
    async fn tier_defaults_to_free_without_metadata_or_history() {
        let subscriptions = Arc::new(MockSubscriptionStore::reliable());
        let handler = handler(MockProfileStore::with_profile("cus_123"), subscriptions.clone());
        let mut object = full_object();
        object.as_object_mut().unwrap().remove("metadata");
        let payload = subscription_event("customer.subscription.created", object);

        run(&handler, &payload, Some(&signed_header(&payload)))
            .await
            .unwrap();

        assert_eq!(subscriptions.last_record().tier, Tier::Free);
    }

    // ══════════════════════════════════════════════════════════════
    // Mapping Function
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn trial_end_converts_to_milliseconds() {
        let object: SubscriptionEventObject = serde_json::from_value(serde_json::json!({
            "id": "sub_1",
            "customer": "cus_1",
            "status": "trialing",
            "current_period_end": 1_700_000_000,
            "trial_end": 1_699_000_000,
        }))
        .unwrap();

        let record = build_subscription_record("user-1", &object, Tier::Free).unwrap();

        assert_eq!(record.trial_end, Some(1_699_000_000_000));
        assert_eq!(record.status, SubscriptionStatus::Trialing);
    }

    proptest! {
        /// Period timestamps always scale by exactly 1000 and trial absence
        /// is preserved, for any well-formed object.
        #[test]
        fn mapping_scales_seconds_to_millis(
            period_end in 0i64..4_000_000_000,
            trial_end in proptest::option::of(0i64..4_000_000_000),
            cancel in any::<bool>(),
        ) {
            let object = SubscriptionEventObject {
                id: Some("sub_p".to_string()),
                customer: Some("cus_p".to_string()),
                status: Some("active".to_string()),
                current_period_end: Some(period_end),
                cancel_at_period_end: cancel,
                trial_end,
                metadata: Default::default(),
            };

            let record = build_subscription_record("user-p", &object, Tier::Basic).unwrap();

            prop_assert_eq!(record.current_period_end, period_end * 1000);
            prop_assert_eq!(record.trial_end, trial_end.map(|t| t * 1000));
            prop_assert_eq!(record.cancel_at_period_end, cancel);
            prop_assert_eq!(record.tier, Tier::Basic);
        }
    }
}
