//! Command handlers.
//!
//! Each handler owns exactly the store handles it orchestrates and exposes a
//! single `handle` entry point. HTTP concerns stay in the adapters.

pub mod auth;
pub mod billing;
