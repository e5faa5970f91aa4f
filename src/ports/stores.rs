//! Per-entity store traits.
//!
//! Every operation returns [`StoreResult`]; lookups that can miss return
//! `Ok(None)`. `delete` of a record that does not exist is the one write
//! that errors, with [`StoreError::Missing`], so callers can distinguish
//! "gone" from "never was" uniformly across providers.
//!
//! [`StoreError::Missing`]: crate::domain::foundation::StoreError::Missing

use async_trait::async_trait;

use crate::domain::foundation::StoreResult;
use crate::domain::model::{
    AgentUpdate, AiAgent, Message, NewAgent, NewMessage, NewProfile, NewProject, NewReview,
    Profile, ProfileUpdate, Project, ProjectUpdate, Review, ReviewUpdate, Subscription,
    SubscriptionRecord,
};

use super::change_feed::ChangeFeed;

/// Profile persistence.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_all(&self) -> StoreResult<Vec<Profile>>;

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Profile>>;

    /// Looks up the profile owning a billing customer id. This is the
    /// reconciler's user-resolution step.
    async fn get_by_stripe_customer_id(&self, customer_id: &str)
        -> StoreResult<Option<Profile>>;

    /// Creates a profile. `input.id` is the identity provider's user id.
    async fn create(&self, input: NewProfile) -> StoreResult<Profile>;

    /// Applies a partial update. `Ok(None)` when no profile matches `id`.
    async fn update(&self, id: &str, update: ProfileUpdate) -> StoreResult<Option<Profile>>;

    async fn delete(&self, id: &str) -> StoreResult<()>;
}

/// Subscription persistence.
///
/// Subscriptions are written by the webhook reconciler; everything else
/// reads. `stripe_subscription_id` is the natural key for `upsert`.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn get_all(&self) -> StoreResult<Vec<Subscription>>;

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Subscription>>;

    async fn get_by_user_id(&self, user_id: &str) -> StoreResult<Option<Subscription>>;

    async fn get_by_stripe_subscription_id(
        &self,
        stripe_subscription_id: &str,
    ) -> StoreResult<Option<Subscription>>;

    /// Insert-or-update keyed on `stripe_subscription_id`. Delivering the
    /// same record twice converges to one stored subscription.
    async fn upsert(&self, record: SubscriptionRecord) -> StoreResult<Subscription>;

    async fn delete(&self, id: &str) -> StoreResult<()>;
}

/// Agent listing persistence.
#[async_trait]
pub trait AgentStore: Send + Sync {
    async fn get_all(&self) -> StoreResult<Vec<AiAgent>>;

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<AiAgent>>;

    async fn get_by_builder_id(&self, builder_id: &str) -> StoreResult<Vec<AiAgent>>;

    /// Public listing: approved agents only, filtered at the store.
    async fn list_approved(&self) -> StoreResult<Vec<AiAgent>>;

    async fn create(&self, input: NewAgent) -> StoreResult<AiAgent>;

    async fn update(&self, id: &str, update: AgentUpdate) -> StoreResult<Option<AiAgent>>;

    async fn delete(&self, id: &str) -> StoreResult<()>;
}

/// Project persistence.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn get_all(&self) -> StoreResult<Vec<Project>>;

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Project>>;

    async fn get_by_recruiter_id(&self, recruiter_id: &str) -> StoreResult<Vec<Project>>;

    async fn create(&self, input: NewProject) -> StoreResult<Project>;

    async fn update(&self, id: &str, update: ProjectUpdate) -> StoreResult<Option<Project>>;

    async fn delete(&self, id: &str) -> StoreResult<()>;
}

/// Direct message persistence plus the live feed.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn get_all(&self) -> StoreResult<Vec<Message>>;

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Message>>;

    /// Full conversation between two users, both directions, oldest first.
    async fn get_by_users(&self, user_a: &str, user_b: &str) -> StoreResult<Vec<Message>>;

    async fn create(&self, input: NewMessage) -> StoreResult<Message>;

    /// Flips the read flag. `Ok(None)` when no message matches `id`.
    async fn mark_read(&self, id: &str) -> StoreResult<Option<Message>>;

    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Opens a feed of messages addressed to `user_id`. Providers without
    /// push capability return a feed that never yields.
    async fn subscribe_to_user(&self, user_id: &str) -> StoreResult<ChangeFeed>;
}

/// Review persistence.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn get_all(&self) -> StoreResult<Vec<Review>>;

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Review>>;

    async fn get_by_agent_id(&self, agent_id: &str) -> StoreResult<Vec<Review>>;

    async fn create(&self, input: NewReview) -> StoreResult<Review>;

    async fn update(&self, id: &str, update: ReviewUpdate) -> StoreResult<Option<Review>>;

    async fn delete(&self, id: &str) -> StoreResult<()>;
}
