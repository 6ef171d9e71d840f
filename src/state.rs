//! # Application State
//!
//! Shared state handed to every request handler. Axum clones the state per
//! request, which is cheap: the pool is already a handle, the WebAuthn
//! instance sits behind an `Arc`, and the remaining pieces are thin wrappers
//! around `Arc`-style internals.

use crate::assistant::AssistantClient;
use crate::config::Config;
use crate::rate_limit::RateLimiter;
use crate::tokens::TokenIssuer;
use anyhow::Result;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use webauthn_rs::prelude::*;

/// How many contact-form submissions one client may make per window.
const CONTACT_MAX_ATTEMPTS: usize = 3;
/// Contact-form rate limit window.
const CONTACT_WINDOW: Duration = Duration::from_secs(3600);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: SqlitePool,

    /// WebAuthn instance for generating challenges and verifying
    /// attestations/assertions.
    pub webauthn: Arc<Webauthn>,

    /// Mints and verifies session tokens for authenticated users.
    pub tokens: TokenIssuer,

    /// Client for the hosted conversational assistant. `None` when the
    /// assistant credentials are not configured; the chat endpoint then
    /// reports a configuration error.
    pub assistant: Option<AssistantClient>,

    /// Per-IP limiter for the contact form.
    pub contact_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Initialize application state: connect the pool, run migrations,
    /// build the WebAuthn instance from the relying-party configuration and
    /// wire up the token issuer and assistant client.
    ///
    /// # Errors
    /// Fails if the database connection or migrations fail, or if the
    /// relying-party origin is not a valid URL.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = SqlitePool::connect(&config.database_url).await?;

        // The `sqlx::migrate!` macro embeds ./migrations into the binary;
        // applied migrations are tracked and not re-run.
        sqlx::migrate!("./migrations").run(&db).await?;

        let rp_origin = Url::parse(&config.rp_origin)?;
        let builder = WebauthnBuilder::new(&config.rp_id, &rp_origin)?.rp_name(&config.rp_name);
        let webauthn = Arc::new(builder.build()?);

        let tokens = TokenIssuer::new(&config.token_secret, config.token_ttl_secs);

        // The assistant client only exists when both credentials are set.
        let assistant = match (&config.assistant_api_key, &config.assistant_id) {
            (Some(key), Some(id)) => Some(AssistantClient::new(
                &config.assistant_api_base,
                key,
                id,
            )),
            _ => None,
        };

        let contact_limiter = Arc::new(RateLimiter::new(CONTACT_MAX_ATTEMPTS, CONTACT_WINDOW));

        Ok(AppState {
            db,
            webauthn,
            tokens,
            assistant,
            contact_limiter,
        })
    }
}
