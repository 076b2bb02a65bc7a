//! QuickBooks Online OAuth2 client

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::QuickBooksConfig;
use crate::db::accounting::AccountingConnection;

const SCOPE: &str = "com.intuit.quickbooks.accounting";

/// Access tokens this close to expiry are refreshed before use (ms)
pub const REFRESH_MARGIN_MS: i64 = 5 * 60 * 1000;

#[derive(Debug, thiserror::Error)]
pub enum AccountingError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("invalid authorize url: {0}")]
    InvalidUrl(String),
}

/// Token response from the OAuth token endpoint
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

impl TokenSet {
    pub fn expires_at(&self, now: i64) -> i64 {
        now + self.expires_in * 1000
    }
}

#[async_trait]
pub trait AccountingProvider: Send + Sync {
    /// User-facing consent URL carrying `state`
    fn authorize_url(&self, state: &str) -> Result<String, AccountingError>;

    async fn exchange_code(&self, code: &str) -> Result<TokenSet, AccountingError>;

    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, AccountingError>;
}

#[derive(Clone)]
pub struct QuickBooksClient {
    http: reqwest::Client,
    config: QuickBooksConfig,
}

impl QuickBooksClient {
    pub fn new(config: QuickBooksConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenSet, AccountingError> {
        let resp = self
            .http
            .post(&self.config.token_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .header(reqwest::header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AccountingError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl AccountingProvider for QuickBooksClient {
    fn authorize_url(&self, state: &str) -> Result<String, AccountingError> {
        let url = reqwest::Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("scope", SCOPE),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| AccountingError::InvalidUrl(e.to_string()))?;
        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenSet, AccountingError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ])
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, AccountingError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }
}

pub fn needs_refresh(token_expires_at: i64, now: i64) -> bool {
    token_expires_at - now <= REFRESH_MARGIN_MS
}

/// Refresh the connection's tokens in place when the access token is about
/// to expire. Returns `true` when the connection changed and must be saved.
pub async fn refresh_if_expiring(
    provider: &dyn AccountingProvider,
    conn: &mut AccountingConnection,
    now: i64,
) -> Result<bool, AccountingError> {
    if !needs_refresh(conn.token_expires_at, now) {
        return Ok(false);
    }
    let tokens = provider.refresh(&conn.refresh_token).await?;
    conn.token_expires_at = tokens.expires_at(now);
    conn.access_token = tokens.access_token;
    conn.refresh_token = tokens.refresh_token;
    conn.updated_at = now;
    tracing::info!(tenant_id = %conn.tenant_id, realm_id = %conn.realm_id, "QuickBooks token refreshed");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn config(base: &str) -> QuickBooksConfig {
        QuickBooksConfig {
            client_id: "client".into(),
            client_secret: "secret".into(),
            redirect_uri: "https://app.test/api/quickbooks/callback".into(),
            environment: "sandbox".into(),
            authorize_url: "https://appcenter.intuit.test/connect/oauth2".into(),
            token_url: format!("{base}/oauth2/v1/tokens/bearer"),
        }
    }

    fn connection(expires_at: i64) -> AccountingConnection {
        AccountingConnection {
            tenant_id: "t1".into(),
            realm_id: "realm-1".into(),
            access_token: "old-access".into(),
            refresh_token: "old-refresh".into(),
            token_expires_at: expires_at,
            updated_at: 0,
        }
    }

    #[test]
    fn authorize_url_carries_state_and_scope() {
        let client = QuickBooksClient::new(config("http://unused"));
        let url = client.authorize_url("abc123").unwrap();
        assert!(url.starts_with("https://appcenter.intuit.test/connect/oauth2?"));
        assert!(url.contains("state=abc123"));
        assert!(url.contains("scope=com.intuit.quickbooks.accounting"));
        assert!(url.contains("response_type=code"));
    }

    #[test]
    fn refresh_margin() {
        let now = 1_000_000_000;
        assert!(needs_refresh(now + REFRESH_MARGIN_MS, now));
        assert!(needs_refresh(now - 1, now));
        assert!(!needs_refresh(now + REFRESH_MARGIN_MS + 1, now));
    }

    #[tokio::test]
    async fn exchanges_code_for_tokens() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/oauth2/v1/tokens/bearer")
                .form_urlencoded_tuple("grant_type", "authorization_code")
                .form_urlencoded_tuple("code", "the-code");
            then.status(200).json_body(serde_json::json!({
                "access_token": "access-1",
                "refresh_token": "refresh-1",
                "expires_in": 3600,
                "x_refresh_token_expires_in": 8_726_400,
                "token_type": "bearer"
            }));
        });

        let client = QuickBooksClient::new(config(&server.base_url()));
        let tokens = client.exchange_code("the-code").await.unwrap();

        assert_eq!(tokens.access_token, "access-1");
        assert_eq!(tokens.expires_at(1_000), 1_000 + 3_600_000);
        mock.assert();
    }

    #[tokio::test]
    async fn rejected_exchange_reports_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/oauth2/v1/tokens/bearer");
            then.status(400).body(r#"{"error":"invalid_grant"}"#);
        });

        let client = QuickBooksClient::new(config(&server.base_url()));
        let err = client.exchange_code("bad").await.unwrap_err();
        assert!(matches!(err, AccountingError::Rejected { status: 400, .. }));
    }

    #[tokio::test]
    async fn expiring_connection_is_refreshed() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/oauth2/v1/tokens/bearer")
                .form_urlencoded_tuple("grant_type", "refresh_token")
                .form_urlencoded_tuple("refresh_token", "old-refresh");
            then.status(200).json_body(serde_json::json!({
                "access_token": "new-access",
                "refresh_token": "new-refresh",
                "expires_in": 3600
            }));
        });

        let client = QuickBooksClient::new(config(&server.base_url()));
        let now = 10_000_000;
        let mut conn = connection(now + 60_000);

        assert!(refresh_if_expiring(&client, &mut conn, now).await.unwrap());
        assert_eq!(conn.access_token, "new-access");
        assert_eq!(conn.refresh_token, "new-refresh");
        assert_eq!(conn.token_expires_at, now + 3_600_000);
        mock.assert();
    }

    #[tokio::test]
    async fn fresh_connection_is_left_alone() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/oauth2/v1/tokens/bearer");
            then.status(500);
        });

        let client = QuickBooksClient::new(config(&server.base_url()));
        let now = 10_000_000;
        let mut conn = connection(now + 30 * 60_000);

        assert!(!refresh_if_expiring(&client, &mut conn, now).await.unwrap());
        assert_eq!(conn.access_token, "old-access");
        assert_eq!(mock.calls(), 0);
    }
}
