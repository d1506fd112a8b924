//! HTTP middleware components.

/// Admin API key authentication
pub mod auth;
