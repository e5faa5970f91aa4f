//! Relational provider: the hosted Postgres store behind its REST surface.

mod auth;
mod client;
mod feed;
mod provider;
mod rows;

pub use provider::RelationalProvider;
