//! Relational implementations of the entity store ports.
//!
//! Every store shares one [`RestClient`]. Query construction and row
//! mapping are the only logic here; anything testable without a network
//! lives in `rows.rs`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::config::RelationalStoreConfig;
use crate::domain::foundation::{StoreError, StoreResult};
use crate::domain::model::{
    AgentUpdate, AiAgent, Message, NewAgent, NewMessage, NewProfile, NewProject, NewReview,
    Profile, ProfileUpdate, Project, ProjectUpdate, Review, ReviewUpdate, Subscription,
    SubscriptionRecord,
};
use crate::ports::{
    AgentStore, AuthGateway, ChangeFeed, DataProvider, MessageStore, ProfileStore, ProjectStore,
    ReviewStore, SubscriptionStore,
};

use super::auth::RelationalAuthGateway;
use super::client::RestClient;
use super::{feed, rows};

fn select_all() -> (&'static str, String) {
    ("select", "*".to_string())
}

/// PostgREST equality filter: `column=eq.value`.
fn eq<'a>(column: &'a str, value: &str) -> (&'a str, String) {
    (column, format!("eq.{value}"))
}

/// The relational provider: one REST client, seven port implementations.
pub struct RelationalProvider {
    auth: Arc<RelationalAuthGateway>,
    profiles: Arc<RelationalProfileStore>,
    subscriptions: Arc<RelationalSubscriptionStore>,
    agents: Arc<RelationalAgentStore>,
    projects: Arc<RelationalProjectStore>,
    messages: Arc<RelationalMessageStore>,
    reviews: Arc<RelationalReviewStore>,
}

impl RelationalProvider {
    pub fn new(config: &RelationalStoreConfig) -> Self {
        let client = Arc::new(RestClient::new(config));
        Self {
            auth: Arc::new(RelationalAuthGateway::new(client.clone())),
            profiles: Arc::new(RelationalProfileStore {
                client: client.clone(),
            }),
            subscriptions: Arc::new(RelationalSubscriptionStore {
                client: client.clone(),
            }),
            agents: Arc::new(RelationalAgentStore {
                client: client.clone(),
            }),
            projects: Arc::new(RelationalProjectStore {
                client: client.clone(),
            }),
            messages: Arc::new(RelationalMessageStore {
                client: client.clone(),
            }),
            reviews: Arc::new(RelationalReviewStore { client }),
        }
    }
}

impl DataProvider for RelationalProvider {
    fn auth(&self) -> Arc<dyn AuthGateway> {
        self.auth.clone()
    }
    fn profiles(&self) -> Arc<dyn ProfileStore> {
        self.profiles.clone()
    }
    fn subscriptions(&self) -> Arc<dyn SubscriptionStore> {
        self.subscriptions.clone()
    }
    fn agents(&self) -> Arc<dyn AgentStore> {
        self.agents.clone()
    }
    fn projects(&self) -> Arc<dyn ProjectStore> {
        self.projects.clone()
    }
    fn messages(&self) -> Arc<dyn MessageStore> {
        self.messages.clone()
    }
    fn reviews(&self) -> Arc<dyn ReviewStore> {
        self.reviews.clone()
    }
}

// ══════════════════════════════════════════════════════════════
// Profiles
// ══════════════════════════════════════════════════════════════

struct RelationalProfileStore {
    client: Arc<RestClient>,
}

#[async_trait]
impl ProfileStore for RelationalProfileStore {
    async fn get_all(&self) -> StoreResult<Vec<Profile>> {
        let rows: Vec<rows::ProfileRow> = self
            .client
            .select("profiles", &[select_all(), ("order", "created_at.desc".to_string())])
            .await?;
        Ok(rows.into_iter().map(rows::ProfileRow::into_profile).collect())
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Profile>> {
        let row: Option<rows::ProfileRow> = self
            .client
            .select_one("profiles", &[select_all(), eq("id", id)])
            .await?;
        Ok(row.map(rows::ProfileRow::into_profile))
    }

    async fn get_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> StoreResult<Option<Profile>> {
        let row: Option<rows::ProfileRow> = self
            .client
            .select_one(
                "profiles",
                &[select_all(), eq("stripe_customer_id", customer_id)],
            )
            .await?;
        Ok(row.map(rows::ProfileRow::into_profile))
    }

    async fn create(&self, input: NewProfile) -> StoreResult<Profile> {
        let row: rows::ProfileRow = self
            .client
            .insert("profiles", &rows::new_profile_row(&input))
            .await?;
        Ok(row.into_profile())
    }

    async fn update(&self, id: &str, update: ProfileUpdate) -> StoreResult<Option<Profile>> {
        let row: Option<rows::ProfileRow> = self
            .client
            .update(
                "profiles",
                &[eq("id", id)],
                &rows::profile_patch(&update, Utc::now()),
            )
            .await?;
        Ok(row.map(rows::ProfileRow::into_profile))
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let deleted: Vec<rows::ProfileRow> =
            self.client.delete("profiles", &[eq("id", id)]).await?;
        if deleted.is_empty() {
            return Err(StoreError::Missing(format!("profiles: {id}")));
        }
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Subscriptions
// ══════════════════════════════════════════════════════════════

struct RelationalSubscriptionStore {
    client: Arc<RestClient>,
}

#[async_trait]
impl SubscriptionStore for RelationalSubscriptionStore {
    async fn get_all(&self) -> StoreResult<Vec<Subscription>> {
        let rows: Vec<rows::SubscriptionRow> =
            self.client.select("subscriptions", &[select_all()]).await?;
        Ok(rows
            .into_iter()
            .map(rows::SubscriptionRow::into_subscription)
            .collect())
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Subscription>> {
        let row: Option<rows::SubscriptionRow> = self
            .client
            .select_one("subscriptions", &[select_all(), eq("id", id)])
            .await?;
        Ok(row.map(rows::SubscriptionRow::into_subscription))
    }

    async fn get_by_user_id(&self, user_id: &str) -> StoreResult<Option<Subscription>> {
        let row: Option<rows::SubscriptionRow> = self
            .client
            .select_one("subscriptions", &[select_all(), eq("user_id", user_id)])
            .await?;
        Ok(row.map(rows::SubscriptionRow::into_subscription))
    }

    async fn get_by_stripe_subscription_id(
        &self,
        stripe_subscription_id: &str,
    ) -> StoreResult<Option<Subscription>> {
        let row: Option<rows::SubscriptionRow> = self
            .client
            .select_one(
                "subscriptions",
                &[
                    select_all(),
                    eq("stripe_subscription_id", stripe_subscription_id),
                ],
            )
            .await?;
        Ok(row.map(rows::SubscriptionRow::into_subscription))
    }

    async fn upsert(&self, record: SubscriptionRecord) -> StoreResult<Subscription> {
        let row: rows::SubscriptionRow = self
            .client
            .upsert("subscriptions", "stripe_subscription_id", &record)
            .await?;
        Ok(row.into_subscription())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let deleted: Vec<rows::SubscriptionRow> =
            self.client.delete("subscriptions", &[eq("id", id)]).await?;
        if deleted.is_empty() {
            return Err(StoreError::Missing(format!("subscriptions: {id}")));
        }
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Agents
// ══════════════════════════════════════════════════════════════

struct RelationalAgentStore {
    client: Arc<RestClient>,
}

#[async_trait]
impl AgentStore for RelationalAgentStore {
    async fn get_all(&self) -> StoreResult<Vec<AiAgent>> {
        let rows: Vec<rows::AgentRow> = self
            .client
            .select("ai_agents", &[select_all(), ("order", "created_at.desc".to_string())])
            .await?;
        Ok(rows.into_iter().map(rows::AgentRow::into_agent).collect())
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<AiAgent>> {
        let row: Option<rows::AgentRow> = self
            .client
            .select_one("ai_agents", &[select_all(), eq("id", id)])
            .await?;
        Ok(row.map(rows::AgentRow::into_agent))
    }

    async fn get_by_builder_id(&self, builder_id: &str) -> StoreResult<Vec<AiAgent>> {
        let rows: Vec<rows::AgentRow> = self
            .client
            .select("ai_agents", &[select_all(), eq("builder_id", builder_id)])
            .await?;
        Ok(rows.into_iter().map(rows::AgentRow::into_agent).collect())
    }

    async fn list_approved(&self) -> StoreResult<Vec<AiAgent>> {
        let rows: Vec<rows::AgentRow> = self
            .client
            .select("ai_agents", &[select_all(), eq("status", "approved")])
            .await?;
        Ok(rows.into_iter().map(rows::AgentRow::into_agent).collect())
    }

    async fn create(&self, input: NewAgent) -> StoreResult<AiAgent> {
        let row: rows::AgentRow = self
            .client
            .insert("ai_agents", &rows::new_agent_row(&input))
            .await?;
        Ok(row.into_agent())
    }

    async fn update(&self, id: &str, update: AgentUpdate) -> StoreResult<Option<AiAgent>> {
        let row: Option<rows::AgentRow> = self
            .client
            .update(
                "ai_agents",
                &[eq("id", id)],
                &rows::agent_patch(&update, Utc::now()),
            )
            .await?;
        Ok(row.map(rows::AgentRow::into_agent))
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let deleted: Vec<rows::AgentRow> =
            self.client.delete("ai_agents", &[eq("id", id)]).await?;
        if deleted.is_empty() {
            return Err(StoreError::Missing(format!("ai_agents: {id}")));
        }
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Projects
// ══════════════════════════════════════════════════════════════

struct RelationalProjectStore {
    client: Arc<RestClient>,
}

#[async_trait]
impl ProjectStore for RelationalProjectStore {
    async fn get_all(&self) -> StoreResult<Vec<Project>> {
        let rows: Vec<rows::ProjectRow> = self
            .client
            .select("projects", &[select_all(), ("order", "created_at.desc".to_string())])
            .await?;
        Ok(rows.into_iter().map(rows::ProjectRow::into_project).collect())
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Project>> {
        let row: Option<rows::ProjectRow> = self
            .client
            .select_one("projects", &[select_all(), eq("id", id)])
            .await?;
        Ok(row.map(rows::ProjectRow::into_project))
    }

    async fn get_by_recruiter_id(&self, recruiter_id: &str) -> StoreResult<Vec<Project>> {
        let rows: Vec<rows::ProjectRow> = self
            .client
            .select("projects", &[select_all(), eq("recruiter_id", recruiter_id)])
            .await?;
        Ok(rows.into_iter().map(rows::ProjectRow::into_project).collect())
    }

    async fn create(&self, input: NewProject) -> StoreResult<Project> {
        let row: rows::ProjectRow = self
            .client
            .insert("projects", &rows::new_project_row(&input))
            .await?;
        Ok(row.into_project())
    }

    async fn update(&self, id: &str, update: ProjectUpdate) -> StoreResult<Option<Project>> {
        let row: Option<rows::ProjectRow> = self
            .client
            .update(
                "projects",
                &[eq("id", id)],
                &rows::project_patch(&update, Utc::now()),
            )
            .await?;
        Ok(row.map(rows::ProjectRow::into_project))
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let deleted: Vec<rows::ProjectRow> =
            self.client.delete("projects", &[eq("id", id)]).await?;
        if deleted.is_empty() {
            return Err(StoreError::Missing(format!("projects: {id}")));
        }
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Messages
// ══════════════════════════════════════════════════════════════

struct RelationalMessageStore {
    client: Arc<RestClient>,
}

#[async_trait]
impl MessageStore for RelationalMessageStore {
    async fn get_all(&self) -> StoreResult<Vec<Message>> {
        let rows: Vec<rows::MessageRow> = self
            .client
            .select("messages", &[select_all(), ("order", "created_at.asc".to_string())])
            .await?;
        Ok(rows.into_iter().map(rows::MessageRow::into_message).collect())
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Message>> {
        let row: Option<rows::MessageRow> = self
            .client
            .select_one("messages", &[select_all(), eq("id", id)])
            .await?;
        Ok(row.map(rows::MessageRow::into_message))
    }

    async fn get_by_users(&self, user_a: &str, user_b: &str) -> StoreResult<Vec<Message>> {
        let both_directions = format!(
            "(and(sender_id.eq.{user_a},recipient_id.eq.{user_b}),and(sender_id.eq.{user_b},recipient_id.eq.{user_a}))"
        );
        let rows: Vec<rows::MessageRow> = self
            .client
            .select(
                "messages",
                &[
                    select_all(),
                    ("or", both_directions),
                    ("order", "created_at.asc".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(rows::MessageRow::into_message).collect())
    }

    async fn create(&self, input: NewMessage) -> StoreResult<Message> {
        let row: rows::MessageRow = self
            .client
            .insert("messages", &rows::new_message_row(&input))
            .await?;
        Ok(row.into_message())
    }

    async fn mark_read(&self, id: &str) -> StoreResult<Option<Message>> {
        let row: Option<rows::MessageRow> = self
            .client
            .update(
                "messages",
                &[eq("id", id)],
                &serde_json::json!({ "read": true }),
            )
            .await?;
        Ok(row.map(rows::MessageRow::into_message))
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let deleted: Vec<rows::MessageRow> =
            self.client.delete("messages", &[eq("id", id)]).await?;
        if deleted.is_empty() {
            return Err(StoreError::Missing(format!("messages: {id}")));
        }
        Ok(())
    }

    async fn subscribe_to_user(&self, user_id: &str) -> StoreResult<ChangeFeed> {
        Ok(feed::subscribe(self.client.clone(), user_id.to_string()))
    }
}

// ══════════════════════════════════════════════════════════════
// Reviews
// ══════════════════════════════════════════════════════════════

struct RelationalReviewStore {
    client: Arc<RestClient>,
}

#[async_trait]
impl ReviewStore for RelationalReviewStore {
    async fn get_all(&self) -> StoreResult<Vec<Review>> {
        let rows: Vec<rows::ReviewRow> = self
            .client
            .select("reviews", &[select_all(), ("order", "created_at.desc".to_string())])
            .await?;
        Ok(rows.into_iter().map(rows::ReviewRow::into_review).collect())
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Review>> {
        let row: Option<rows::ReviewRow> = self
            .client
            .select_one("reviews", &[select_all(), eq("id", id)])
            .await?;
        Ok(row.map(rows::ReviewRow::into_review))
    }

    async fn get_by_agent_id(&self, agent_id: &str) -> StoreResult<Vec<Review>> {
        let rows: Vec<rows::ReviewRow> = self
            .client
            .select("reviews", &[select_all(), eq("agent_id", agent_id)])
            .await?;
        Ok(rows.into_iter().map(rows::ReviewRow::into_review).collect())
    }

    async fn create(&self, input: NewReview) -> StoreResult<Review> {
        let row: rows::ReviewRow = self
            .client
            .insert("reviews", &rows::new_review_row(&input))
            .await?;
        Ok(row.into_review())
    }

    async fn update(&self, id: &str, update: ReviewUpdate) -> StoreResult<Option<Review>> {
        let row: Option<rows::ReviewRow> = self
            .client
            .update("reviews", &[eq("id", id)], &rows::review_patch(&update))
            .await?;
        Ok(row.map(rows::ReviewRow::into_review))
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let deleted: Vec<rows::ReviewRow> =
            self.client.delete("reviews", &[eq("id", id)]).await?;
        if deleted.is_empty() {
            return Err(StoreError::Missing(format!("reviews: {id}")));
        }
        Ok(())
    }
}
