//! Application state for workdesk-cloud

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::rate_limit::RateLimiter;
use crate::config::Config;
use crate::db::PgSubscriptionStore;
use crate::gemini::{AssistantProvider, GeminiClient};
use crate::quickbooks::{AccountingProvider, QuickBooksClient};
use crate::store::SubscriptionStore;
use crate::stripe::{BillingProvider, StripeClient};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// External capabilities behind their traits
#[derive(Clone)]
pub struct Providers {
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub billing: Arc<dyn BillingProvider>,
    pub accounting: Arc<dyn AccountingProvider>,
    pub assistant: Arc<dyn AssistantProvider>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Subscription record store used by the quota gate
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub billing: Arc<dyn BillingProvider>,
    pub accounting: Arc<dyn AccountingProvider>,
    pub assistant: Arc<dyn AssistantProvider>,
    /// JWT secret for tenant authentication
    pub jwt_secret: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    pub stripe_professional_price_id: String,
    pub stripe_enterprise_price_id: String,
    /// Web app base URL (checkout redirects)
    pub app_base_url: String,
    /// Per-client limits for login/registration routes
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Connect to Postgres, run migrations and build the production providers
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::info!(
            environment = %config.quickbooks.environment,
            "QuickBooks client configured"
        );
        if config.gemini.api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY not set, assistant disabled");
        }

        let providers = Providers {
            subscriptions: Arc::new(PgSubscriptionStore::new(pool.clone())),
            billing: Arc::new(StripeClient::new(
                &config.stripe.secret_key,
                &config.stripe.api_base,
            )),
            accounting: Arc::new(QuickBooksClient::new(config.quickbooks.clone())),
            assistant: Arc::new(GeminiClient::new(config.gemini.clone())),
        };

        Ok(Self::from_parts(pool, providers, config))
    }

    pub fn from_parts(pool: PgPool, providers: Providers, config: &Config) -> Self {
        Self {
            pool,
            subscriptions: providers.subscriptions,
            billing: providers.billing,
            accounting: providers.accounting,
            assistant: providers.assistant,
            jwt_secret: config.jwt_secret.clone(),
            stripe_webhook_secret: config.stripe.webhook_secret.clone(),
            stripe_professional_price_id: config.stripe.professional_price_id.clone(),
            stripe_enterprise_price_id: config.stripe.enterprise_price_id.clone(),
            app_base_url: config.app_base_url.clone(),
            rate_limiter: RateLimiter::new(config.rate_limits),
        }
    }

    pub fn store(&self) -> &dyn SubscriptionStore {
        self.subscriptions.as_ref()
    }
}
