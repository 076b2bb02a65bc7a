//! workdesk-cloud: multi-tenant work-order service
//!
//! Long-running service that:
//! - Registers tenants and issues JWTs for the tenant API
//! - Gates work-order and team-member creation by subscription plan
//! - Applies Stripe billing events to subscription records
//! - Connects tenants to QuickBooks and proxies the Gemini assistant

mod api;
mod auth;
mod config;
mod db;
mod error;
mod gemini;
mod quickbooks;
mod quota;
mod state;
mod store;
mod stripe;
mod util;

use std::net::SocketAddr;
use std::time::Duration;

use config::Config;
use state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// How often abandoned QuickBooks authorizations are deleted
const OAUTH_STATE_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "workdesk_cloud=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting workdesk-cloud (env: {})", config.environment);

    let state = AppState::new(&config).await?;

    // Expired rate-limit windows are dropped once per longest window
    let rate_limiter = state.rate_limiter.clone();
    let period = rate_limiter.longest_window().max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            rate_limiter.cleanup().await;
        }
    });

    let pool = state.pool.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(OAUTH_STATE_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match db::accounting::purge_expired_states(&pool, shared::util::now_millis()).await {
                Ok(0) => {}
                Ok(purged) => tracing::info!(purged, "Purged expired OAuth states"),
                Err(e) => tracing::warn!("OAuth state sweep failed: {e}"),
            }
        }
    });

    let app = api::create_router(state);

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("workdesk-cloud HTTP listening on {http_addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
