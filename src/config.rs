//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment
//! variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `TRIPAY_API_KEY` / `TRIPAY_PRIVATE_KEY` / `TRIPAY_MERCHANT_CODE`:
///   aggregator credentials (empty by default, sandbox mode needs none)
/// - `TRIPAY_BASE_URL` (optional): aggregator API base, defaults to sandbox
/// - `TRIPAY_SANDBOX` (optional): when true, purchases are confirmed
///   locally without calling the aggregator; defaults to true
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default)]
    pub tripay_api_key: String,

    #[serde(default)]
    pub tripay_private_key: String,

    #[serde(default)]
    pub tripay_merchant_code: String,

    #[serde(default = "default_tripay_base_url")]
    pub tripay_base_url: String,

    #[serde(default = "default_sandbox")]
    pub tripay_sandbox: bool,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_tripay_base_url() -> String {
    "https://tripay.co.id/api-sandbox".to_string()
}

fn default_sandbox() -> bool {
    true
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config
    /// struct.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing
    /// (e.g. DATABASE_URL) or cannot be parsed into the expected types.
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }
}
