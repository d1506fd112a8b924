//! HTTP request handlers.
//!
//! Handlers translate between the HTTP surface and the service layer:
//! extract and deserialize, call the service, serialize the result.
//! Anything touching the ledger lives in `services`, not here.

pub mod admin;
pub mod health;
pub mod ppob;
pub mod tabungan;
pub mod transaksi;
pub mod users;
