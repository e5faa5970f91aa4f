//! Document implementations of the entity store ports.
//!
//! CRUD is literal driver usage: `find_one` for lookups,
//! `find_one_and_update` returning the post-update document, `delete_one`
//! checked against its deleted count. Connecting pings the server so a bad
//! deployment fails at startup, not at first use.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Client, Collection, Database};
use tokio::sync::mpsc;

use crate::config::DocumentStoreConfig;
use crate::domain::auth::TokenService;
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

use super::auth::DocumentAuthGateway;
use super::docs;

use secrecy::ExposeSecret;

/// Normalizes a driver error into the store error taxonomy.
pub(super) fn normalize(err: mongodb::error::Error) -> StoreError {
    use mongodb::error::{ErrorKind, WriteFailure};
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == 11000 => {
            StoreError::Constraint(write.message.clone())
        }
        ErrorKind::Authentication { message, .. } => StoreError::Auth(message.clone()),
        _ => StoreError::connection(err),
    }
}

fn after_update() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

/// The document provider over the native driver.
pub struct DocumentProvider {
    auth: Arc<DocumentAuthGateway>,
    profiles: Arc<DocumentProfileStore>,
    subscriptions: Arc<DocumentSubscriptionStore>,
    agents: Arc<DocumentAgentStore>,
    projects: Arc<DocumentProjectStore>,
    messages: Arc<DocumentMessageStore>,
    reviews: Arc<DocumentReviewStore>,
}

impl DocumentProvider {
    /// Connects and pings. Any connectivity or credential problem surfaces
    /// here, before the provider is handed to the application.
    pub async fn connect(
        config: &DocumentStoreConfig,
        tokens: Arc<TokenService>,
    ) -> StoreResult<Self> {
        let client = Client::with_uri_str(config.uri.expose_secret())
            .await
            .map_err(normalize)?;
        let db = client.database(&config.database);
        db.run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(normalize)?;
        Ok(Self::from_database(db, tokens))
    }

    fn from_database(db: Database, tokens: Arc<TokenService>) -> Self {
        let profiles: Collection<docs::ProfileDoc> = db.collection("profiles");
        Self {
            auth: Arc::new(DocumentAuthGateway::new(
                db.collection("auth_users"),
                profiles.clone(),
                tokens,
            )),
            profiles: Arc::new(DocumentProfileStore {
                collection: profiles,
            }),
            subscriptions: Arc::new(DocumentSubscriptionStore {
                collection: db.collection("subscriptions"),
            }),
            agents: Arc::new(DocumentAgentStore {
                collection: db.collection("ai_agents"),
            }),
            projects: Arc::new(DocumentProjectStore {
                collection: db.collection("projects"),
            }),
            messages: Arc::new(DocumentMessageStore {
                collection: db.collection("messages"),
            }),
            reviews: Arc::new(DocumentReviewStore {
                collection: db.collection("reviews"),
            }),
        }
    }
}

impl DataProvider for DocumentProvider {
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

struct DocumentProfileStore {
    collection: Collection<docs::ProfileDoc>,
}

#[async_trait]
impl ProfileStore for DocumentProfileStore {
    async fn get_all(&self) -> StoreResult<Vec<Profile>> {
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        let found: Vec<docs::ProfileDoc> = self
            .collection
            .find(None, options)
            .await
            .map_err(normalize)?
            .try_collect()
            .await
            .map_err(normalize)?;
        Ok(found.into_iter().map(docs::ProfileDoc::into_profile).collect())
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Profile>> {
        let Some(oid) = docs::parse_object_id(id) else {
            return Ok(None);
        };
        let found = self
            .collection
            .find_one(doc! { "_id": oid }, None)
            .await
            .map_err(normalize)?;
        Ok(found.map(docs::ProfileDoc::into_profile))
    }

    async fn get_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> StoreResult<Option<Profile>> {
        let found = self
            .collection
            .find_one(doc! { "stripe_customer_id": customer_id }, None)
            .await
            .map_err(normalize)?;
        Ok(found.map(docs::ProfileDoc::into_profile))
    }

    async fn create(&self, input: NewProfile) -> StoreResult<Profile> {
        // Profile _id is the identity provider's user id; one that does not
        // parse cannot belong to any auth user.
        let oid = docs::parse_object_id(&input.id).ok_or_else(|| {
            StoreError::Malformed(format!("profile id is not an object id: {}", input.id))
        })?;
        let document = docs::ProfileDoc::from_new(&input, oid, Utc::now());
        self.collection
            .insert_one(&document, None)
            .await
            .map_err(normalize)?;
        Ok(document.into_profile())
    }

    async fn update(&self, id: &str, update: ProfileUpdate) -> StoreResult<Option<Profile>> {
        let Some(oid) = docs::parse_object_id(id) else {
            return Ok(None);
        };
        let found = self
            .collection
            .find_one_and_update(
                doc! { "_id": oid },
                docs::profile_set(&update, Utc::now()),
                after_update(),
            )
            .await
            .map_err(normalize)?;
        Ok(found.map(docs::ProfileDoc::into_profile))
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let oid = docs::parse_object_id(id)
            .ok_or_else(|| StoreError::Missing(format!("profiles: {id}")))?;
        let result = self
            .collection
            .delete_one(doc! { "_id": oid }, None)
            .await
            .map_err(normalize)?;
        if result.deleted_count == 0 {
            return Err(StoreError::Missing(format!("profiles: {id}")));
        }
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Subscriptions
// ══════════════════════════════════════════════════════════════

struct DocumentSubscriptionStore {
    collection: Collection<docs::SubscriptionDoc>,
}

#[async_trait]
impl SubscriptionStore for DocumentSubscriptionStore {
    async fn get_all(&self) -> StoreResult<Vec<Subscription>> {
        let found: Vec<docs::SubscriptionDoc> = self
            .collection
            .find(None, None)
            .await
            .map_err(normalize)?
            .try_collect()
            .await
            .map_err(normalize)?;
        Ok(found
            .into_iter()
            .map(docs::SubscriptionDoc::into_subscription)
            .collect())
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Subscription>> {
        let Some(oid) = docs::parse_object_id(id) else {
            return Ok(None);
        };
        let found = self
            .collection
            .find_one(doc! { "_id": oid }, None)
            .await
            .map_err(normalize)?;
        Ok(found.map(docs::SubscriptionDoc::into_subscription))
    }

    async fn get_by_user_id(&self, user_id: &str) -> StoreResult<Option<Subscription>> {
        let found = self
            .collection
            .find_one(doc! { "user_id": user_id }, None)
            .await
            .map_err(normalize)?;
        Ok(found.map(docs::SubscriptionDoc::into_subscription))
    }

    async fn get_by_stripe_subscription_id(
        &self,
        stripe_subscription_id: &str,
    ) -> StoreResult<Option<Subscription>> {
        let found = self
            .collection
            .find_one(
                doc! { "stripe_subscription_id": stripe_subscription_id },
                None,
            )
            .await
            .map_err(normalize)?;
        Ok(found.map(docs::SubscriptionDoc::into_subscription))
    }

    async fn upsert(&self, record: SubscriptionRecord) -> StoreResult<Subscription> {
        let fields =
            mongodb::bson::to_document(&record).map_err(StoreError::malformed)?;
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let stored = self
            .collection
            .find_one_and_update(
                doc! { "stripe_subscription_id": &record.stripe_subscription_id },
                doc! { "$set": fields },
                options,
            )
            .await
            .map_err(normalize)?
            .ok_or_else(|| {
                // Upsert with After always yields a document.
                StoreError::Connection("upsert returned no document".to_string())
            })?;
        Ok(stored.into_subscription())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let oid = docs::parse_object_id(id)
            .ok_or_else(|| StoreError::Missing(format!("subscriptions: {id}")))?;
        let result = self
            .collection
            .delete_one(doc! { "_id": oid }, None)
            .await
            .map_err(normalize)?;
        if result.deleted_count == 0 {
            return Err(StoreError::Missing(format!("subscriptions: {id}")));
        }
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Agents
// ══════════════════════════════════════════════════════════════

struct DocumentAgentStore {
    collection: Collection<docs::AgentDoc>,
}

#[async_trait]
impl AgentStore for DocumentAgentStore {
    async fn get_all(&self) -> StoreResult<Vec<AiAgent>> {
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        let found: Vec<docs::AgentDoc> = self
            .collection
            .find(None, options)
            .await
            .map_err(normalize)?
            .try_collect()
            .await
            .map_err(normalize)?;
        Ok(found.into_iter().map(docs::AgentDoc::into_agent).collect())
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<AiAgent>> {
        let Some(oid) = docs::parse_object_id(id) else {
            return Ok(None);
        };
        let found = self
            .collection
            .find_one(doc! { "_id": oid }, None)
            .await
            .map_err(normalize)?;
        Ok(found.map(docs::AgentDoc::into_agent))
    }

    async fn get_by_builder_id(&self, builder_id: &str) -> StoreResult<Vec<AiAgent>> {
        let found: Vec<docs::AgentDoc> = self
            .collection
            .find(doc! { "builder_id": builder_id }, None)
            .await
            .map_err(normalize)?
            .try_collect()
            .await
            .map_err(normalize)?;
        Ok(found.into_iter().map(docs::AgentDoc::into_agent).collect())
    }

    async fn list_approved(&self) -> StoreResult<Vec<AiAgent>> {
        let found: Vec<docs::AgentDoc> = self
            .collection
            .find(doc! { "status": "approved" }, None)
            .await
            .map_err(normalize)?
            .try_collect()
            .await
            .map_err(normalize)?;
        Ok(found.into_iter().map(docs::AgentDoc::into_agent).collect())
    }

    async fn create(&self, input: NewAgent) -> StoreResult<AiAgent> {
        let document = docs::AgentDoc::from_new(&input, Utc::now());
        self.collection
            .insert_one(&document, None)
            .await
            .map_err(normalize)?;
        Ok(document.into_agent())
    }

    async fn update(&self, id: &str, update: AgentUpdate) -> StoreResult<Option<AiAgent>> {
        let Some(oid) = docs::parse_object_id(id) else {
            return Ok(None);
        };
        let found = self
            .collection
            .find_one_and_update(
                doc! { "_id": oid },
                docs::agent_set(&update, Utc::now()),
                after_update(),
            )
            .await
            .map_err(normalize)?;
        Ok(found.map(docs::AgentDoc::into_agent))
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let oid = docs::parse_object_id(id)
            .ok_or_else(|| StoreError::Missing(format!("ai_agents: {id}")))?;
        let result = self
            .collection
            .delete_one(doc! { "_id": oid }, None)
            .await
            .map_err(normalize)?;
        if result.deleted_count == 0 {
            return Err(StoreError::Missing(format!("ai_agents: {id}")));
        }
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Projects
// ══════════════════════════════════════════════════════════════

struct DocumentProjectStore {
    collection: Collection<docs::ProjectDoc>,
}

#[async_trait]
impl ProjectStore for DocumentProjectStore {
    async fn get_all(&self) -> StoreResult<Vec<Project>> {
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        let found: Vec<docs::ProjectDoc> = self
            .collection
            .find(None, options)
            .await
            .map_err(normalize)?
            .try_collect()
            .await
            .map_err(normalize)?;
        Ok(found.into_iter().map(docs::ProjectDoc::into_project).collect())
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Project>> {
        let Some(oid) = docs::parse_object_id(id) else {
            return Ok(None);
        };
        let found = self
            .collection
            .find_one(doc! { "_id": oid }, None)
            .await
            .map_err(normalize)?;
        Ok(found.map(docs::ProjectDoc::into_project))
    }

    async fn get_by_recruiter_id(&self, recruiter_id: &str) -> StoreResult<Vec<Project>> {
        let found: Vec<docs::ProjectDoc> = self
            .collection
            .find(doc! { "recruiter_id": recruiter_id }, None)
            .await
            .map_err(normalize)?
            .try_collect()
            .await
            .map_err(normalize)?;
        Ok(found.into_iter().map(docs::ProjectDoc::into_project).collect())
    }

    async fn create(&self, input: NewProject) -> StoreResult<Project> {
        let document = docs::ProjectDoc::from_new(&input, Utc::now());
        self.collection
            .insert_one(&document, None)
            .await
            .map_err(normalize)?;
        Ok(document.into_project())
    }

    async fn update(&self, id: &str, update: ProjectUpdate) -> StoreResult<Option<Project>> {
        let Some(oid) = docs::parse_object_id(id) else {
            return Ok(None);
        };
        let found = self
            .collection
            .find_one_and_update(
                doc! { "_id": oid },
                docs::project_set(&update, Utc::now()),
                after_update(),
            )
            .await
            .map_err(normalize)?;
        Ok(found.map(docs::ProjectDoc::into_project))
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let oid = docs::parse_object_id(id)
            .ok_or_else(|| StoreError::Missing(format!("projects: {id}")))?;
        let result = self
            .collection
            .delete_one(doc! { "_id": oid }, None)
            .await
            .map_err(normalize)?;
        if result.deleted_count == 0 {
            return Err(StoreError::Missing(format!("projects: {id}")));
        }
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Messages
// ══════════════════════════════════════════════════════════════

struct DocumentMessageStore {
    collection: Collection<docs::MessageDoc>,
}

#[async_trait]
impl MessageStore for DocumentMessageStore {
    async fn get_all(&self) -> StoreResult<Vec<Message>> {
        let options = FindOptions::builder().sort(doc! { "created_at": 1 }).build();
        let found: Vec<docs::MessageDoc> = self
            .collection
            .find(None, options)
            .await
            .map_err(normalize)?
            .try_collect()
            .await
            .map_err(normalize)?;
        Ok(found.into_iter().map(docs::MessageDoc::into_message).collect())
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Message>> {
        let Some(oid) = docs::parse_object_id(id) else {
            return Ok(None);
        };
        let found = self
            .collection
            .find_one(doc! { "_id": oid }, None)
            .await
            .map_err(normalize)?;
        Ok(found.map(docs::MessageDoc::into_message))
    }

    async fn get_by_users(&self, user_a: &str, user_b: &str) -> StoreResult<Vec<Message>> {
        let filter = doc! {
            "$or": [
                { "sender_id": user_a, "recipient_id": user_b },
                { "sender_id": user_b, "recipient_id": user_a },
            ]
        };
        let options = FindOptions::builder().sort(doc! { "created_at": 1 }).build();
        let found: Vec<docs::MessageDoc> = self
            .collection
            .find(filter, options)
            .await
            .map_err(normalize)?
            .try_collect()
            .await
            .map_err(normalize)?;
        Ok(found.into_iter().map(docs::MessageDoc::into_message).collect())
    }

    async fn create(&self, input: NewMessage) -> StoreResult<Message> {
        let document = docs::MessageDoc::from_new(&input, Utc::now());
        self.collection
            .insert_one(&document, None)
            .await
            .map_err(normalize)?;
        Ok(document.into_message())
    }

    async fn mark_read(&self, id: &str) -> StoreResult<Option<Message>> {
        let Some(oid) = docs::parse_object_id(id) else {
            return Ok(None);
        };
        let found = self
            .collection
            .find_one_and_update(
                doc! { "_id": oid },
                doc! { "$set": { "read": true } },
                after_update(),
            )
            .await
            .map_err(normalize)?;
        Ok(found.map(docs::MessageDoc::into_message))
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let oid = docs::parse_object_id(id)
            .ok_or_else(|| StoreError::Missing(format!("messages: {id}")))?;
        let result = self
            .collection
            .delete_one(doc! { "_id": oid }, None)
            .await
            .map_err(normalize)?;
        if result.deleted_count == 0 {
            return Err(StoreError::Missing(format!("messages: {id}")));
        }
        Ok(())
    }

    async fn subscribe_to_user(&self, _user_id: &str) -> StoreResult<ChangeFeed> {
        // No push channel in this provider. The feed stays open and silent
        // until unsubscribed; deployments needing live delivery attach a
        // change stream outside this core.
        let (tx, rx) = mpsc::channel(1);
        let listener = tokio::spawn(async move {
            let _keep_open = tx;
            std::future::pending::<()>().await;
        });
        Ok(ChangeFeed::new(rx, Some(listener)))
    }
}

// ══════════════════════════════════════════════════════════════
// Reviews
// ══════════════════════════════════════════════════════════════

struct DocumentReviewStore {
    collection: Collection<docs::ReviewDoc>,
}

#[async_trait]
impl ReviewStore for DocumentReviewStore {
    async fn get_all(&self) -> StoreResult<Vec<Review>> {
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        let found: Vec<docs::ReviewDoc> = self
            .collection
            .find(None, options)
            .await
            .map_err(normalize)?
            .try_collect()
            .await
            .map_err(normalize)?;
        Ok(found.into_iter().map(docs::ReviewDoc::into_review).collect())
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Review>> {
        let Some(oid) = docs::parse_object_id(id) else {
            return Ok(None);
        };
        let found = self
            .collection
            .find_one(doc! { "_id": oid }, None)
            .await
            .map_err(normalize)?;
        Ok(found.map(docs::ReviewDoc::into_review))
    }

    async fn get_by_agent_id(&self, agent_id: &str) -> StoreResult<Vec<Review>> {
        let found: Vec<docs::ReviewDoc> = self
            .collection
            .find(doc! { "agent_id": agent_id }, None)
            .await
            .map_err(normalize)?
            .try_collect()
            .await
            .map_err(normalize)?;
        Ok(found.into_iter().map(docs::ReviewDoc::into_review).collect())
    }

    async fn create(&self, input: NewReview) -> StoreResult<Review> {
        let document = docs::ReviewDoc::from_new(&input, Utc::now());
        self.collection
            .insert_one(&document, None)
            .await
            .map_err(normalize)?;
        Ok(document.into_review())
    }

    async fn update(&self, id: &str, update: ReviewUpdate) -> StoreResult<Option<Review>> {
        let Some(oid) = docs::parse_object_id(id) else {
            return Ok(None);
        };
        let set = docs::review_set(&update).map_err(normalize)?;
        let found = self
            .collection
            .find_one_and_update(doc! { "_id": oid }, set, after_update())
            .await
            .map_err(normalize)?;
        Ok(found.map(docs::ReviewDoc::into_review))
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let oid = docs::parse_object_id(id)
            .ok_or_else(|| StoreError::Missing(format!("reviews: {id}")))?;
        let result = self
            .collection
            .delete_one(doc! { "_id": oid }, None)
            .await
            .map_err(normalize)?;
        if result.deleted_count == 0 {
            return Err(StoreError::Missing(format!("reviews: {id}")));
        }
        Ok(())
    }
}
