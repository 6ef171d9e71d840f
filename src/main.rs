use portfolio_api::config::Config;
use portfolio_api::state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main application entry point:
/// 1. Set up logging
/// 2. Load configuration from environment variables
/// 3. Initialize database, WebAuthn and service clients
/// 4. Start the background cleanup of expired challenges
/// 5. Serve the API
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,portfolio_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        rp_id = %config.rp_id,
        rp_origin = %config.rp_origin,
        "Configuration loaded"
    );

    let app_state = AppState::new(&config).await?;
    tracing::info!("Application state initialized");

    // WebAuthn challenges expire after five minutes; sweep abandoned ones
    // so the tables don't fill up.
    let cleanup_pool = app_state.db.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(600));
        loop {
            interval.tick().await;
            tracing::debug!("Running challenge cleanup task");
            if let Err(e) =
                portfolio_api::db::challenges::cleanup_expired_challenges(&cleanup_pool).await
            {
                tracing::error!("Challenge cleanup failed: {:?}", e);
            }
        }
    });

    let app = portfolio_api::app(app_state);

    let bind_addr = config.bind_address();
    tracing::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
