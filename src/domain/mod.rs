//! Domain layer - entities, billing reconciliation, and the token service.

pub mod auth;
pub mod billing;
pub mod foundation;
pub mod model;
