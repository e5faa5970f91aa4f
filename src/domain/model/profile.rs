//! Profile entity.
//!
//! A profile's `id` is always the identity provider's user id. Profiles are
//! never created with a server-generated id when an auth user exists; the
//! auth gateways enforce this at sign-up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marketplace role attached to a profile (and to access tokens).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Builder,
    Recruiter,
    Admin,
}

impl Role {
    /// Stable string form, matching what the stores persist.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Builder => "builder",
            Role::Recruiter => "recruiter",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A marketplace user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Identity provider's user id, verbatim.
    pub id: String,
    pub full_name: String,
    pub role: Role,
    pub email: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// External billing customer id, set once billing onboarding completes.
    pub stripe_customer_id: Option<String>,
}

/// Input for profile creation.
///
/// Carries the identity provider's user id (per the id invariant) but no
/// other server-assigned fields.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: String,
    pub full_name: String,
    pub role: Role,
    pub email: String,
    pub avatar_url: Option<String>,
}

/// Partial update for a profile. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub stripe_customer_id: Option<String>,
}
