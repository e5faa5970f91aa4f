//! AgentHub - Marketplace backend data-consistency core.
//!
//! This crate implements the persistence abstraction (one adapter contract,
//! two interchangeable providers), the billing webhook reconciler, and the
//! token service for the AgentHub agent marketplace.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
