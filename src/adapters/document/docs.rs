//! Document shapes and pure mapping functions for the document provider.
//!
//! Public ids are always the hex form of the internal `_id`; [`ObjectId`]
//! never crosses the port boundary. An unparseable id on lookup means the
//! record cannot exist, so those conversions surface as `Ok(None)` at the
//! store, not as errors.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};

use crate::domain::model::{
    AgentStatus, AgentUpdate, AiAgent, Message, NewAgent, NewMessage, NewProfile, NewProject,
    NewReview, Profile, ProfileUpdate, Project, ProjectStatus, ProjectUpdate, Review,
    ReviewResponse, ReviewUpdate, Role, Subscription, SubscriptionStatus, Tier,
};

/// Parses a public id back into the internal form, `None` when it was never
/// one of ours.
pub fn parse_object_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

// ══════════════════════════════════════════════════════════════
// Profiles
// ══════════════════════════════════════════════════════════════

/// Profile `_id` is the identity provider's user id, which in a document
/// deployment is itself an object id hex string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub full_name: String,
    pub role: Role,
    pub email: String,
    pub avatar_url: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    pub stripe_customer_id: Option<String>,
}

impl ProfileDoc {
    pub fn from_new(input: &NewProfile, id: ObjectId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            full_name: input.full_name.clone(),
            role: input.role,
            email: input.email.clone(),
            avatar_url: input.avatar_url.clone(),
            created_at: now,
            updated_at: now,
            stripe_customer_id: None,
        }
    }

    pub fn into_profile(self) -> Profile {
        Profile {
            id: self.id.to_hex(),
            full_name: self.full_name,
            role: self.role,
            email: self.email,
            avatar_url: self.avatar_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
            stripe_customer_id: self.stripe_customer_id,
        }
    }
}

pub fn profile_set(update: &ProfileUpdate, now: DateTime<Utc>) -> Document {
    let mut set = Document::new();
    if let Some(full_name) = &update.full_name {
        set.insert("full_name", full_name);
    }
    if let Some(avatar_url) = &update.avatar_url {
        set.insert("avatar_url", avatar_url);
    }
    if let Some(customer_id) = &update.stripe_customer_id {
        set.insert("stripe_customer_id", customer_id);
    }
    set.insert("updated_at", mongodb::bson::DateTime::from_chrono(now));
    doc! { "$set": set }
}

// ══════════════════════════════════════════════════════════════
// Subscriptions
// ══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: String,
    pub tier: String,
    pub status: String,
    pub current_period_end: i64,
    pub cancel_at_period_end: bool,
    pub trial_end: Option<i64>,
    pub stripe_customer_id: String,
    pub stripe_subscription_id: String,
}

impl SubscriptionDoc {
    pub fn into_subscription(self) -> Subscription {
        Subscription {
            id: self.id.to_hex(),
            user_id: self.user_id,
            tier: Tier::parse_lossy(&self.tier),
            status: SubscriptionStatus::parse_lossy(&self.status),
            current_period_end: self.current_period_end,
            cancel_at_period_end: self.cancel_at_period_end,
            trial_end: self.trial_end,
            stripe_customer_id: self.stripe_customer_id,
            stripe_subscription_id: self.stripe_subscription_id,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Agents
// ══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub builder_id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price_per_task: f64,
    pub status: AgentStatus,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl AgentDoc {
    pub fn from_new(input: &NewAgent, now: DateTime<Utc>) -> Self {
        Self {
            id: ObjectId::new(),
            builder_id: input.builder_id.clone(),
            name: input.name.clone(),
            description: input.description.clone(),
            category: input.category.clone(),
            price_per_task: input.price_per_task,
            status: AgentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_agent(self) -> AiAgent {
        AiAgent {
            id: self.id.to_hex(),
            builder_id: self.builder_id,
            name: self.name,
            description: self.description,
            category: self.category,
            price_per_task: self.price_per_task,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

pub fn agent_set(update: &AgentUpdate, now: DateTime<Utc>) -> Document {
    let mut set = Document::new();
    if let Some(name) = &update.name {
        set.insert("name", name);
    }
    if let Some(description) = &update.description {
        set.insert("description", description);
    }
    if let Some(category) = &update.category {
        set.insert("category", category);
    }
    if let Some(price) = update.price_per_task {
        set.insert("price_per_task", price);
    }
    if let Some(status) = update.status {
        set.insert("status", status_str(status));
    }
    set.insert("updated_at", mongodb::bson::DateTime::from_chrono(now));
    doc! { "$set": set }
}

fn status_str(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Pending => "pending",
        AgentStatus::Approved => "approved",
        AgentStatus::Rejected => "rejected",
    }
}

// ══════════════════════════════════════════════════════════════
// Projects
// ══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub recruiter_id: String,
    pub title: String,
    pub description: String,
    pub budget: f64,
    pub status: ProjectStatus,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl ProjectDoc {
    pub fn from_new(input: &NewProject, now: DateTime<Utc>) -> Self {
        Self {
            id: ObjectId::new(),
            recruiter_id: input.recruiter_id.clone(),
            title: input.title.clone(),
            description: input.description.clone(),
            budget: input.budget,
            status: ProjectStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_project(self) -> Project {
        Project {
            id: self.id.to_hex(),
            recruiter_id: self.recruiter_id,
            title: self.title,
            description: self.description,
            budget: self.budget,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

pub fn project_set(update: &ProjectUpdate, now: DateTime<Utc>) -> Document {
    let mut set = Document::new();
    if let Some(title) = &update.title {
        set.insert("title", title);
    }
    if let Some(description) = &update.description {
        set.insert("description", description);
    }
    if let Some(budget) = update.budget {
        set.insert("budget", budget);
    }
    if let Some(status) = update.status {
        let as_str = match status {
            ProjectStatus::Open => "open",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        };
        set.insert("status", as_str);
    }
    set.insert("updated_at", mongodb::bson::DateTime::from_chrono(now));
    doc! { "$set": set }
}

// ══════════════════════════════════════════════════════════════
// Messages
// ══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub sender_id: String,
    pub recipient_id: String,
    pub body: String,
    pub read: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl MessageDoc {
    pub fn from_new(input: &NewMessage, now: DateTime<Utc>) -> Self {
        Self {
            id: ObjectId::new(),
            sender_id: input.sender_id.clone(),
            recipient_id: input.recipient_id.clone(),
            body: input.body.clone(),
            read: false,
            created_at: now,
        }
    }

    pub fn into_message(self) -> Message {
        Message {
            id: self.id.to_hex(),
            sender_id: self.sender_id,
            recipient_id: self.recipient_id,
            body: self.body,
            read: self.read,
            created_at: self.created_at,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Reviews
// ══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResponseDoc {
    pub body: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub responded_at: DateTime<Utc>,
}

impl ReviewResponseDoc {
    pub fn from_domain(response: &ReviewResponse) -> Self {
        Self {
            body: response.body.clone(),
            responded_at: response.responded_at,
        }
    }

    pub fn into_domain(self) -> ReviewResponse {
        ReviewResponse {
            body: self.body,
            responded_at: self.responded_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub agent_id: String,
    pub reviewer_id: String,
    pub rating: u8,
    pub comment: String,
    #[serde(default)]
    pub response: Option<ReviewResponseDoc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl ReviewDoc {
    pub fn from_new(input: &NewReview, now: DateTime<Utc>) -> Self {
        Self {
            id: ObjectId::new(),
            agent_id: input.agent_id.clone(),
            reviewer_id: input.reviewer_id.clone(),
            rating: input.rating,
            comment: input.comment.clone(),
            response: None,
            created_at: now,
        }
    }

    pub fn into_review(self) -> Review {
        Review {
            id: self.id.to_hex(),
            agent_id: self.agent_id,
            reviewer_id: self.reviewer_id,
            rating: self.rating,
            comment: self.comment,
            response: self.response.map(ReviewResponseDoc::into_domain),
            created_at: self.created_at,
        }
    }
}

pub fn review_set(update: &ReviewUpdate) -> mongodb::error::Result<Document> {
    let mut set = Document::new();
    if let Some(rating) = update.rating {
        set.insert("rating", rating as i32);
    }
    if let Some(comment) = &update.comment {
        set.insert("comment", comment);
    }
    if let Some(response) = &update.response {
        let doc = mongodb::bson::to_document(&ReviewResponseDoc::from_domain(response))
            .map_err(mongodb::error::Error::from)?;
        set.insert("response", doc);
    }
    Ok(doc! { "$set": set })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn garbage_public_id_does_not_parse() {
        assert!(parse_object_id("not-an-object-id").is_none());
        assert!(parse_object_id("").is_none());
    }

    #[test]
    fn object_id_round_trips_through_hex() {
        let id = ObjectId::new();
        assert_eq!(parse_object_id(&id.to_hex()), Some(id));
    }

    #[test]
    fn new_agent_doc_pins_pending_status() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let doc = AgentDoc::from_new(
            &NewAgent {
                builder_id: "b1".to_string(),
                name: "Summarizer".to_string(),
                description: "Summarizes".to_string(),
                category: "nlp".to_string(),
                price_per_task: 0.5,
            },
            now,
        );
        assert_eq!(doc.status, AgentStatus::Pending);
        assert_eq!(doc.created_at, doc.updated_at);
    }

    #[test]
    fn profile_doc_exposes_hex_id() {
        let id = ObjectId::new();
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let doc = ProfileDoc::from_new(
            &NewProfile {
                id: id.to_hex(),
                full_name: "A".to_string(),
                role: Role::Builder,
                email: "a@example.com".to_string(),
                avatar_url: None,
            },
            id,
            now,
        );
        assert_eq!(doc.into_profile().id, id.to_hex());
    }

    #[test]
    fn profile_set_skips_absent_fields() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let update = profile_set(
            &ProfileUpdate {
                stripe_customer_id: Some("cus_9".to_string()),
                ..Default::default()
            },
            now,
        );
        let set = update.get_document("$set").unwrap();
        assert!(set.contains_key("stripe_customer_id"));
        assert!(!set.contains_key("full_name"));
        assert!(set.contains_key("updated_at"));
    }
}
