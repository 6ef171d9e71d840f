//! # Configuration Management
//!
//! This module handles loading configuration from environment variables.
//! Configuration follows the "12-factor app" methodology: everything comes
//! from the environment, with sensible defaults for local development.
//!
//! ## Environment Variables
//! - `HOST`: Server bind address (default: 127.0.0.1)
//! - `PORT`: Server port (default: 8080)
//! - `DATABASE_URL`: SQLite database connection string
//! - `RP_ID`: WebAuthn Relying Party ID (usually your domain)
//! - `RP_ORIGIN`: WebAuthn Relying Party Origin (full URL)
//! - `RP_NAME`: Human-readable name for the site
//! - `TOKEN_SECRET`: HMAC secret for session tokens (required)
//! - `TOKEN_TTL_SECS`: Session token lifetime (default: 24h)
//! - `ASSISTANT_API_KEY` / `ASSISTANT_ID`: hosted assistant credentials
//! - `ASSISTANT_API_BASE`: assistant API base URL

use anyhow::{anyhow, Result};
use std::env;

/// Application configuration.
///
/// ## WebAuthn Terminology
/// - **RP (Relying Party)**: this site, the service verifying ceremonies
/// - **RP ID**: the domain name (e.g., "example.com" or "localhost")
/// - **RP Origin**: the full URL the site is served from
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host/IP address to bind to.
    pub host: String,

    /// Server port number.
    pub port: u16,

    /// SQLite database connection URL.
    /// Format: "sqlite:portfolio.db?mode=rwc" (read, write, create).
    pub database_url: String,

    /// WebAuthn Relying Party ID. Must match the domain the site is
    /// served from ("localhost" for development).
    pub rp_id: String,

    /// WebAuthn Relying Party Origin, including protocol.
    pub rp_origin: String,

    /// Human-readable site name, shown to users during passkey creation.
    pub rp_name: String,

    /// Secret used to sign session tokens (HS256). Required.
    pub token_secret: String,

    /// Session token lifetime in seconds.
    pub token_ttl_secs: i64,

    /// API key for the hosted conversational assistant. The chat endpoint
    /// reports a configuration error when this is unset.
    pub assistant_api_key: Option<String>,

    /// Identifier of the hosted assistant to run.
    pub assistant_id: Option<String>,

    /// Base URL of the assistant API.
    pub assistant_api_base: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Loads a `.env` file first if present (dotenvy doesn't error if the
    /// file is missing), then reads each value, falling back to defaults.
    /// Fails if `TOKEN_SECRET` is unset or `PORT`/`TOKEN_TTL_SECS` don't
    /// parse.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),

            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:portfolio.db?mode=rwc".to_string()),

            rp_id: env::var("RP_ID").unwrap_or_else(|_| "localhost".to_string()),

            rp_origin: env::var("RP_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),

            rp_name: env::var("RP_NAME").unwrap_or_else(|_| "Portfolio".to_string()),

            // Session tokens are worthless with a guessable key, so no
            // default here.
            token_secret: env::var("TOKEN_SECRET")
                .map_err(|_| anyhow!("TOKEN_SECRET must be set"))?,

            token_ttl_secs: env::var("TOKEN_TTL_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()?,

            assistant_api_key: env::var("ASSISTANT_API_KEY").ok(),

            assistant_id: env::var("ASSISTANT_ID").ok(),

            assistant_api_base: env::var("ASSISTANT_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
        })
    }

    /// Socket address to bind the server to, e.g. "127.0.0.1:8080".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
