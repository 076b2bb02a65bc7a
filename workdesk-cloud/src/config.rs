//! Cloud server configuration

use std::time::Duration;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Cloud server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT secret for tenant authentication
    pub jwt_secret: String,
    /// Public base URL of the web app (checkout redirects)
    pub app_base_url: String,
    pub stripe: StripeConfig,
    pub quickbooks: QuickBooksConfig,
    pub gemini: GeminiConfig,
    pub rate_limits: RateLimitConfig,
}

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    /// Stripe Price ID for the professional tier (monthly)
    pub professional_price_id: String,
    /// Stripe Price ID for the enterprise tier (monthly)
    pub enterprise_price_id: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct QuickBooksConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// `sandbox` or `production`
    pub environment: String,
    pub authorize_url: String,
    pub token_url: String,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Unset disables the assistant
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
}

/// Per-client request budget for an unauthenticated route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimit {
    /// Parse `<max_requests>/<window_secs>`, e.g. `5/60`
    pub fn parse(value: &str) -> Option<Self> {
        let (max, secs) = value.split_once('/')?;
        let max_requests = max.trim().parse().ok().filter(|&n: &u32| n > 0)?;
        let secs: u64 = secs.trim().parse().ok()?;
        Some(Self {
            max_requests,
            window: Duration::from_secs(secs),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub login: RateLimit,
    pub register: RateLimit,
}

fn rate_limit_from_env(name: &str, default: &str) -> Result<RateLimit, BoxError> {
    let raw = env_or(name, default);
    RateLimit::parse(&raw)
        .ok_or_else(|| format!("{name} must look like <max>/<seconds>, got {raw:?}").into())
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = env_or("ENVIRONMENT", "development");

        let stripe = StripeConfig {
            secret_key: Self::require_secret("STRIPE_SECRET_KEY", &environment)?,
            webhook_secret: Self::require_secret("STRIPE_WEBHOOK_SECRET", &environment)?,
            professional_price_id: env_or("STRIPE_PROFESSIONAL_PRICE_ID", "price_professional"),
            enterprise_price_id: env_or("STRIPE_ENTERPRISE_PRICE_ID", "price_enterprise"),
            api_base: env_or("STRIPE_API_BASE", "https://api.stripe.com"),
        };

        let qb_environment = env_or("QUICKBOOKS_ENVIRONMENT", "sandbox");
        let quickbooks = QuickBooksConfig {
            client_id: Self::require_secret("QUICKBOOKS_CLIENT_ID", &environment)?,
            client_secret: Self::require_secret("QUICKBOOKS_CLIENT_SECRET", &environment)?,
            redirect_uri: env_or(
                "QUICKBOOKS_REDIRECT_URI",
                "http://localhost:8080/api/quickbooks/callback",
            ),
            environment: qb_environment,
            authorize_url: env_or(
                "QUICKBOOKS_AUTHORIZE_URL",
                "https://appcenter.intuit.com/connect/oauth2",
            ),
            token_url: env_or(
                "QUICKBOOKS_TOKEN_URL",
                "https://oauth.platform.intuit.com/oauth2/v1/tokens/bearer",
            ),
        };

        let gemini = GeminiConfig {
            api_key: std::env::var("GEMINI_API_KEY").ok().filter(|s| !s.is_empty()),
            model: env_or("GEMINI_MODEL", "gemini-2.0-flash"),
            api_base: env_or(
                "GEMINI_API_BASE",
                "https://generativelanguage.googleapis.com",
            ),
        };

        let rate_limits = RateLimitConfig {
            login: rate_limit_from_env("LOGIN_RATE_LIMIT", "5/60")?,
            register: rate_limit_from_env("REGISTER_RATE_LIMIT", "3/60")?,
        };

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            app_base_url: env_or("APP_BASE_URL", "http://localhost:3000"),
            environment,
            stripe,
            quickbooks,
            gemini,
            rate_limits,
        })
    }
}
