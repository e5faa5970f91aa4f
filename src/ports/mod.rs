//! Port definitions: the contract every persistence provider implements.
//!
//! The application layer depends only on these traits; the concrete
//! providers live in `adapters` and are selected once at startup.

mod auth_gateway;
mod change_feed;
mod provider;
mod stores;

pub use auth_gateway::{AuthGateway, SignUp};
pub use change_feed::ChangeFeed;
pub use provider::DataProvider;
pub use stores::{
    AgentStore, MessageStore, ProfileStore, ProjectStore, ReviewStore, SubscriptionStore,
};
