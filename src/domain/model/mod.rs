//! Domain entities shared by both persistence providers.

mod agent;
mod auth;
mod message;
mod profile;
mod project;
mod review;
mod subscription;

pub use agent::{AgentStatus, AiAgent, AgentUpdate, NewAgent};
pub use auth::{AuthSession, AuthUser};
pub use message::{Message, NewMessage};
pub use profile::{NewProfile, Profile, ProfileUpdate, Role};
pub use project::{NewProject, Project, ProjectStatus, ProjectUpdate};
pub use review::{NewReview, Review, ReviewResponse, ReviewUpdate};
pub use subscription::{Subscription, SubscriptionRecord, SubscriptionStatus, Tier};
