//! Document provider: the native driver over a document database.

mod auth;
mod docs;
mod provider;

pub use provider::DocumentProvider;
