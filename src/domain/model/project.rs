//! Project entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a posted project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

/// A project posted by a recruiter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    /// Owning recruiter; only the owner (or an admin) may mutate.
    pub recruiter_id: String,
    pub title: String,
    pub description: String,
    pub budget: f64,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for project creation. New projects start out `Open`.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub recruiter_id: String,
    pub title: String,
    pub description: String,
    pub budget: f64,
}

/// Partial update for a project. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub budget: Option<f64>,
    pub status: Option<ProjectStatus>,
}
