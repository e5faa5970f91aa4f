//! Row shapes and pure mapping functions for the relational provider.
//!
//! Rows mirror the store's snake_case columns; every conversion to and from
//! a domain type is a pure function here so it can be tested without a
//! network. Tolerant parsing (lossy tier/status, legacy review response
//! field names) lives on the read path only; the write path always emits
//! the canonical shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::model::{
    AgentStatus, AgentUpdate, AiAgent, Message, NewAgent, NewMessage, NewProfile, NewProject,
    NewReview, Profile, ProfileUpdate, Project, ProjectStatus, ProjectUpdate, Review,
    ReviewResponse, ReviewUpdate, Role, Subscription, SubscriptionStatus, Tier,
};

// ══════════════════════════════════════════════════════════════
// Profiles
// ══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    pub full_name: String,
    pub role: Role,
    pub email: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub stripe_customer_id: Option<String>,
}

impl ProfileRow {
    pub fn into_profile(self) -> Profile {
        Profile {
            id: self.id,
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

/// Insert payload for a new profile. Timestamps are column defaults.
pub fn new_profile_row(input: &NewProfile) -> Value {
    json!({
        "id": input.id,
        "full_name": input.full_name,
        "role": input.role,
        "email": input.email,
        "avatar_url": input.avatar_url,
    })
}

/// Patch payload for a profile update; absent fields are left untouched.
pub fn profile_patch(update: &ProfileUpdate, now: DateTime<Utc>) -> Value {
    let mut patch = serde_json::Map::new();
    if let Some(full_name) = &update.full_name {
        patch.insert("full_name".to_string(), json!(full_name));
    }
    if let Some(avatar_url) = &update.avatar_url {
        patch.insert("avatar_url".to_string(), json!(avatar_url));
    }
    if let Some(customer_id) = &update.stripe_customer_id {
        patch.insert("stripe_customer_id".to_string(), json!(customer_id));
    }
    patch.insert("updated_at".to_string(), json!(now));
    Value::Object(patch)
}

// ══════════════════════════════════════════════════════════════
// Subscriptions
// ══════════════════════════════════════════════════════════════

/// Tier and status come back as plain strings and are parsed lossily, so a
/// row written by a newer deployment never fails to decode here.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionRow {
    pub id: String,
    pub user_id: String,
    pub tier: String,
    pub status: String,
    pub current_period_end: i64,
    pub cancel_at_period_end: bool,
    pub trial_end: Option<i64>,
    pub stripe_customer_id: String,
    pub stripe_subscription_id: String,
}

impl SubscriptionRow {
    pub fn into_subscription(self) -> Subscription {
        Subscription {
            id: self.id,
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

#[derive(Debug, Clone, Deserialize)]
pub struct AgentRow {
    pub id: String,
    pub builder_id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price_per_task: f64,
    pub status: AgentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgentRow {
    pub fn into_agent(self) -> AiAgent {
        AiAgent {
            id: self.id,
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

/// Insert payload for a new agent; moderation starts at `pending`.
pub fn new_agent_row(input: &NewAgent) -> Value {
    json!({
        "builder_id": input.builder_id,
        "name": input.name,
        "description": input.description,
        "category": input.category,
        "price_per_task": input.price_per_task,
        "status": AgentStatus::Pending,
    })
}

pub fn agent_patch(update: &AgentUpdate, now: DateTime<Utc>) -> Value {
    let mut patch = serde_json::Map::new();
    if let Some(name) = &update.name {
        patch.insert("name".to_string(), json!(name));
    }
    if let Some(description) = &update.description {
        patch.insert("description".to_string(), json!(description));
    }
    if let Some(category) = &update.category {
        patch.insert("category".to_string(), json!(category));
    }
    if let Some(price) = update.price_per_task {
        patch.insert("price_per_task".to_string(), json!(price));
    }
    if let Some(status) = update.status {
        patch.insert("status".to_string(), json!(status));
    }
    patch.insert("updated_at".to_string(), json!(now));
    Value::Object(patch)
}

// ══════════════════════════════════════════════════════════════
// Projects
// ══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRow {
    pub id: String,
    pub recruiter_id: String,
    pub title: String,
    pub description: String,
    pub budget: f64,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectRow {
    pub fn into_project(self) -> Project {
        Project {
            id: self.id,
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

pub fn new_project_row(input: &NewProject) -> Value {
    json!({
        "recruiter_id": input.recruiter_id,
        "title": input.title,
        "description": input.description,
        "budget": input.budget,
        "status": ProjectStatus::Open,
    })
}

pub fn project_patch(update: &ProjectUpdate, now: DateTime<Utc>) -> Value {
    let mut patch = serde_json::Map::new();
    if let Some(title) = &update.title {
        patch.insert("title".to_string(), json!(title));
    }
    if let Some(description) = &update.description {
        patch.insert("description".to_string(), json!(description));
    }
    if let Some(budget) = update.budget {
        patch.insert("budget".to_string(), json!(budget));
    }
    if let Some(status) = update.status {
        patch.insert("status".to_string(), json!(status));
    }
    patch.insert("updated_at".to_string(), json!(now));
    Value::Object(patch)
}

// ══════════════════════════════════════════════════════════════
// Messages
// ══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct MessageRow {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub body: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl MessageRow {
    pub fn into_message(self) -> Message {
        Message {
            id: self.id,
            sender_id: self.sender_id,
            recipient_id: self.recipient_id,
            body: self.body,
            read: self.read,
            created_at: self.created_at,
        }
    }
}

pub fn new_message_row(input: &NewMessage) -> Value {
    json!({
        "sender_id": input.sender_id,
        "recipient_id": input.recipient_id,
        "body": input.body,
        "read": false,
    })
}

// ══════════════════════════════════════════════════════════════
// Reviews
// ══════════════════════════════════════════════════════════════

/// Embedded response object as stored. Legacy rows carry `text` and
/// `created_at` where current rows carry `body` and `responded_at`; both
/// spellings decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawReviewResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Normalizes a stored response object, current or legacy spelling. A
/// response with no body (or no timestamp under either name) is treated as
/// absent rather than failing the whole row.
pub fn normalize_review_response(raw: RawReviewResponse) -> Option<ReviewResponse> {
    let body = raw.body.or(raw.text)?;
    let responded_at = raw.responded_at.or(raw.created_at)?;
    Some(ReviewResponse { body, responded_at })
}

/// Canonical write shape for a response object.
pub fn review_response_row(response: &ReviewResponse) -> Value {
    json!({
        "body": response.body,
        "responded_at": response.responded_at,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRow {
    pub id: String,
    pub agent_id: String,
    pub reviewer_id: String,
    pub rating: u8,
    pub comment: String,
    #[serde(default)]
    pub response: Option<RawReviewResponse>,
    pub created_at: DateTime<Utc>,
}

impl ReviewRow {
    pub fn into_review(self) -> Review {
        Review {
            id: self.id,
            agent_id: self.agent_id,
            reviewer_id: self.reviewer_id,
            rating: self.rating,
            comment: self.comment,
            response: self.response.and_then(normalize_review_response),
            created_at: self.created_at,
        }
    }
}

pub fn new_review_row(input: &NewReview) -> Value {
    json!({
        "agent_id": input.agent_id,
        "reviewer_id": input.reviewer_id,
        "rating": input.rating,
        "comment": input.comment,
        "response": Value::Null,
    })
}

pub fn review_patch(update: &ReviewUpdate) -> Value {
    let mut patch = serde_json::Map::new();
    if let Some(rating) = update.rating {
        patch.insert("rating".to_string(), json!(rating));
    }
    if let Some(comment) = &update.comment {
        patch.insert("comment".to_string(), json!(comment));
    }
    if let Some(response) = &update.response {
        patch.insert("response".to_string(), review_response_row(response));
    }
    Value::Object(patch)
}
