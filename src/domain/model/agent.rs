//! AI agent listing entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Moderation status of a listed agent. Only `Approved` agents appear in
/// public listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Pending,
    Approved,
    Rejected,
}

/// An agent listed on the marketplace by a builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiAgent {
    pub id: String,
    /// Owning builder; only the owner (or an admin) may mutate.
    pub builder_id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price_per_task: f64,
    pub status: AgentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for agent creation. New agents start out `Pending`.
#[derive(Debug, Clone)]
pub struct NewAgent {
    pub builder_id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price_per_task: f64,
}

/// Partial update for an agent. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct AgentUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price_per_task: Option<f64>,
    pub status: Option<AgentStatus>,
}
