//! Stripe integration via REST API (no SDK dependency)

pub mod events;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use shared::plan::PlanTier;

pub use events::{Applied, BillingEvent};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Webhook timestamps older than this are rejected (seconds)
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Parameters for a subscription-mode checkout session
pub struct CheckoutRequest<'a> {
    pub customer_id: &'a str,
    pub price_id: &'a str,
    pub tenant_id: &'a str,
    pub tier: PlanTier,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
}

/// Billing provider operations used by the service
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Customer ids registered under `email`, newest first
    async fn list_customers(&self, email: &str) -> Result<Vec<String>, BoxError>;

    async fn create_customer(&self, email: &str, tenant_id: &str) -> Result<String, BoxError>;

    /// Returns the hosted checkout URL
    async fn create_checkout_session(&self, req: &CheckoutRequest<'_>) -> Result<String, BoxError>;
}

#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeClient {
    pub fn new(secret_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: secret_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn list_customers(&self, email: &str) -> Result<Vec<String>, BoxError> {
        let resp: serde_json::Value = self
            .http
            .get(self.url("/v1/customers"))
            .basic_auth(&self.secret_key, None::<&str>)
            .query(&[("email", email), ("limit", "10")])
            .send()
            .await?
            .json()
            .await?;

        let data = resp["data"]
            .as_array()
            .ok_or_else(|| format!("Stripe list_customers failed: {resp}"))?;
        Ok(data
            .iter()
            .filter_map(|c| c["id"].as_str().map(String::from))
            .collect())
    }

    async fn create_customer(&self, email: &str, tenant_id: &str) -> Result<String, BoxError> {
        let resp: serde_json::Value = self
            .http
            .post(self.url("/v1/customers"))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[("email", email), ("metadata[tenant_id]", tenant_id)])
            .send()
            .await?
            .json()
            .await?;

        resp["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| format!("Stripe create_customer failed: {resp}").into())
    }

    async fn create_checkout_session(&self, req: &CheckoutRequest<'_>) -> Result<String, BoxError> {
        let tier = req.tier.as_db();
        let resp: serde_json::Value = self
            .http
            .post(self.url("/v1/checkout/sessions"))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("customer", req.customer_id),
                ("mode", "subscription"),
                ("line_items[0][price]", req.price_id),
                ("line_items[0][quantity]", "1"),
                ("success_url", req.success_url),
                ("cancel_url", req.cancel_url),
                ("allow_promotion_codes", "true"),
                ("metadata[tenant_id]", req.tenant_id),
                ("metadata[tier]", tier),
                ("subscription_data[metadata][tenant_id]", req.tenant_id),
                ("subscription_data[metadata][tier]", tier),
            ])
            .send()
            .await?
            .json()
            .await?;

        resp["url"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| format!("Stripe create_checkout failed: {resp}").into())
    }
}

/// Verify Stripe webhook signature (HMAC-SHA256)
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), &'static str> {
    verify_webhook_signature_at(payload, sig_header, secret, chrono::Utc::now().timestamp())
}

fn verify_webhook_signature_at(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
    now: i64,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signatures = Vec::new();
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signatures.push(v);
        }
    }

    if timestamp.is_empty() || signatures.is_empty() {
        return Err("Invalid Stripe-Signature header");
    }

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    // Several v1 entries are sent while a signing secret is rolled; any match is enough
    let decoded: Vec<Vec<u8>> = signatures
        .iter()
        .filter_map(|sig| hex::decode(sig).ok())
        .collect();
    if decoded.is_empty() {
        return Err("Invalid signature hex");
    }
    // hmac::verify_slice compares in constant time
    if !decoded
        .iter()
        .any(|sig| mac.clone().verify_slice(sig).is_ok())
    {
        return Err("Webhook signature mismatch");
    }

    // Replay window
    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    if (now - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err("Webhook timestamp too old");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const SECRET: &str = "whsec_test";

    fn sign(payload: &[u8], ts: i64) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(format!("{ts}.").as_bytes());
        mac.update(payload);
        let sig = hex::encode(mac.finalize().into_bytes());
        format!("t={ts},v1={sig}")
    }

    #[test]
    fn accepts_valid_signature() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = sign(payload, 1_700_000_000);
        assert!(verify_webhook_signature_at(payload, &header, SECRET, 1_700_000_100).is_ok());
    }

    #[test]
    fn accepts_any_matching_signature_during_secret_roll() {
        let payload = br#"{"id":"evt_1"}"#;
        let rolled = format!("{},v1={}", sign(payload, 1_700_000_000), "00".repeat(32));
        assert!(verify_webhook_signature_at(payload, &rolled, SECRET, 1_700_000_000).is_ok());

        let valid = sign(payload, 1_700_000_000);
        let sig = valid.split_once(",v1=").unwrap().1;
        let reversed = format!("t=1700000000,v1={},v1={sig}", "00".repeat(32));
        assert!(verify_webhook_signature_at(payload, &reversed, SECRET, 1_700_000_000).is_ok());
    }

    #[test]
    fn rejects_when_no_signature_matches() {
        let payload = b"{}";
        let header = format!("t=1700000000,v1={},v1={}", "00".repeat(32), "11".repeat(32));
        assert_eq!(
            verify_webhook_signature_at(payload, &header, SECRET, 1_700_000_000).unwrap_err(),
            "Webhook signature mismatch"
        );
    }

    #[test]
    fn rejects_tampered_payload() {
        let header = sign(br#"{"id":"evt_1"}"#, 1_700_000_000);
        let err =
            verify_webhook_signature_at(br#"{"id":"evt_2"}"#, &header, SECRET, 1_700_000_000)
                .unwrap_err();
        assert_eq!(err, "Webhook signature mismatch");
    }

    #[test]
    fn rejects_stale_timestamp() {
        let payload = b"{}";
        let header = sign(payload, 1_700_000_000);
        let err = verify_webhook_signature_at(payload, &header, SECRET, 1_700_000_301).unwrap_err();
        assert_eq!(err, "Webhook timestamp too old");
    }

    #[test]
    fn rejects_malformed_header() {
        assert_eq!(
            verify_webhook_signature_at(b"{}", "v1=abcd", SECRET, 0).unwrap_err(),
            "Invalid Stripe-Signature header"
        );
        assert_eq!(
            verify_webhook_signature_at(b"{}", "t=1,v1=zz", SECRET, 1).unwrap_err(),
            "Invalid signature hex"
        );
    }

    #[tokio::test]
    async fn checkout_session_carries_tier_metadata() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/checkout/sessions")
                .form_urlencoded_tuple("customer", "cus_1")
                .form_urlencoded_tuple("metadata[tier]", "professional")
                .form_urlencoded_tuple("metadata[tenant_id]", "t1")
                .form_urlencoded_tuple("subscription_data[metadata][tier]", "professional");
            then.status(200)
                .json_body(serde_json::json!({ "url": "https://checkout.test/s/1" }));
        });

        let client = StripeClient::new("sk_test", server.base_url());
        let url = client
            .create_checkout_session(&CheckoutRequest {
                customer_id: "cus_1",
                price_id: "price_pro",
                tenant_id: "t1",
                tier: PlanTier::Professional,
                success_url: "https://app.test/ok",
                cancel_url: "https://app.test/cancel",
            })
            .await
            .unwrap();

        assert_eq!(url, "https://checkout.test/s/1");
        mock.assert();
    }

    #[tokio::test]
    async fn list_customers_returns_ids() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/v1/customers")
                .query_param("email", "a@b.test");
            then.status(200).json_body(serde_json::json!({
                "data": [{ "id": "cus_2" }, { "id": "cus_1" }]
            }));
        });

        let client = StripeClient::new("sk_test", server.base_url());
        let ids = client.list_customers("a@b.test").await.unwrap();
        assert_eq!(ids, vec!["cus_2".to_string(), "cus_1".to_string()]);
    }

    #[tokio::test]
    async fn create_customer_surfaces_api_errors() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/customers");
            then.status(400)
                .json_body(serde_json::json!({ "error": { "message": "bad email" } }));
        });

        let client = StripeClient::new("sk_test", server.base_url());
        let err = client.create_customer("nope", "t1").await.unwrap_err();
        assert!(err.to_string().contains("create_customer failed"));
    }
}
