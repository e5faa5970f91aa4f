//! Review entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A builder's reply attached to a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub body: String,
    pub responded_at: DateTime<Utc>,
}

/// A review left on an agent by a recruiter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub agent_id: String,
    pub reviewer_id: String,
    /// 1 through 5.
    pub rating: u8,
    pub comment: String,
    pub response: Option<ReviewResponse>,
    pub created_at: DateTime<Utc>,
}

/// Input for review creation.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub agent_id: String,
    pub reviewer_id: String,
    pub rating: u8,
    pub comment: String,
}

/// Partial update for a review. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ReviewUpdate {
    pub rating: Option<u8>,
    pub comment: Option<String>,
    pub response: Option<ReviewResponse>,
}
