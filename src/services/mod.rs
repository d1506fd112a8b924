//! Business logic services.
//!
//! Services contain the core ledger-consistency logic separated from the
//! HTTP handlers: atomic balance mutation, transaction recording, the
//! savings-goal state machine, and the PPOB purchase/callback flow.

pub mod admin_service;
pub mod ledger;
pub mod ppob_service;
pub mod tabungan_service;
pub mod transaksi_service;
