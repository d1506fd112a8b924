//! Clients for external collaborators.

/// Tripay payment-aggregator client
pub mod tripay;
