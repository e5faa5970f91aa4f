//! The provider contract.

use std::sync::Arc;

use super::auth_gateway::AuthGateway;
use super::stores::{
    AgentStore, MessageStore, ProfileStore, ProjectStore, ReviewStore, SubscriptionStore,
};

/// A complete persistence provider.
///
/// Selected exactly once at startup from configuration and shared as
/// `Arc<dyn DataProvider>`; nothing downstream ever knows which backend is
/// behind it. Accessors hand out shared store handles so handlers can own
/// exactly the stores they orchestrate.
pub trait DataProvider: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthGateway>;
    fn profiles(&self) -> Arc<dyn ProfileStore>;
    fn subscriptions(&self) -> Arc<dyn SubscriptionStore>;
    fn agents(&self) -> Arc<dyn AgentStore>;
    fn projects(&self) -> Arc<dyn ProjectStore>;
    fn messages(&self) -> Arc<dyn MessageStore>;
    fn reviews(&self) -> Arc<dyn ReviewStore>;
}
