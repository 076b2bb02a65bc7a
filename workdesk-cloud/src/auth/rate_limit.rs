//! Per-client rate limiting for the unauthenticated login and registration routes
//!
//! Each route has its own fixed-window budget from [`RateLimitConfig`]. A
//! rejected request gets `TooManyAttempts` with a `Retry-After` header and a
//! `retry_after_secs` detail.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::error::{AppError, ErrorCode};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::{RateLimit, RateLimitConfig};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitedRoute {
    Login,
    Register,
}

impl LimitedRoute {
    fn as_str(self) -> &'static str {
        match self {
            LimitedRoute::Login => "login",
            LimitedRoute::Register => "register",
        }
    }
}

struct Window {
    count: u32,
    started: Instant,
}

#[derive(Clone)]
pub struct RateLimiter {
    limits: RateLimitConfig,
    windows: Arc<Mutex<HashMap<(LimitedRoute, String), Window>>>,
}

impl RateLimiter {
    pub fn new(limits: RateLimitConfig) -> Self {
        Self {
            limits,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn limit(&self, route: LimitedRoute) -> RateLimit {
        match route {
            LimitedRoute::Login => self.limits.login,
            LimitedRoute::Register => self.limits.register,
        }
    }

    /// Count one request from `client`. Once the window's budget is spent,
    /// returns how long until the window resets.
    async fn hit(&self, route: LimitedRoute, client: &str, now: Instant) -> Result<(), Duration> {
        let limit = self.limit(route);
        let mut windows = self.windows.lock().await;
        let window = windows
            .entry((route, client.to_owned()))
            .or_insert(Window {
                count: 0,
                started: now,
            });

        let elapsed = now.duration_since(window.started);
        if elapsed >= limit.window {
            window.count = 0;
            window.started = now;
        }

        if window.count >= limit.max_requests {
            return Err(limit.window.saturating_sub(now.duration_since(window.started)));
        }
        window.count += 1;
        Ok(())
    }

    /// Drop windows that have already expired for their route
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        windows.retain(|(route, _), window| {
            now.duration_since(window.started) < self.limit(*route).window
        });
    }

    /// Longest configured window; the cleanup task runs at this period
    pub fn longest_window(&self) -> Duration {
        self.limits.login.window.max(self.limits.register.window)
    }
}

/// Client address: first X-Forwarded-For hop (load balancer), then the peer address
fn client_ip(request: &Request) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_owned)
        .or_else(|| {
            request
                .extensions()
                .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
                .map(|ci| ci.0.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_owned())
}

fn too_many_requests(route: LimitedRoute, ip: &str, retry_after: Duration) -> Response {
    // Round up so a client never retries before the window has reset
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    tracing::warn!(route = route.as_str(), ip = %ip, retry_after_secs = secs, "Rate limit exceeded");

    let mut response =
        AppError::with_message(ErrorCode::TooManyAttempts, "Too many requests, try again later")
            .with_detail("retry_after_secs", secs)
            .into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(secs));
    response
}

async fn enforce(
    route: LimitedRoute,
    state: &AppState,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let ip = client_ip(&request);
    state
        .rate_limiter
        .hit(route, &ip, Instant::now())
        .await
        .map_err(|retry_after| too_many_requests(route, &ip, retry_after))?;
    Ok(next.run(request).await)
}

pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(LimitedRoute::Login, &state, request, next).await
}

pub async fn register_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(LimitedRoute::Register, &state, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn limiter(login: u32, register: u32, window_secs: u64) -> RateLimiter {
        let window = Duration::from_secs(window_secs);
        RateLimiter::new(RateLimitConfig {
            login: RateLimit {
                max_requests: login,
                window,
            },
            register: RateLimit {
                max_requests: register,
                window,
            },
        })
    }

    #[tokio::test]
    async fn each_route_has_its_own_budget() {
        let limiter = limiter(5, 3, 60);
        let now = Instant::now();

        for _ in 0..3 {
            limiter.hit(LimitedRoute::Register, "1.2.3.4", now).await.unwrap();
        }
        assert!(limiter.hit(LimitedRoute::Register, "1.2.3.4", now).await.is_err());

        // Other clients and the login budget are unaffected
        limiter.hit(LimitedRoute::Register, "5.6.7.8", now).await.unwrap();
        for _ in 0..5 {
            limiter.hit(LimitedRoute::Login, "1.2.3.4", now).await.unwrap();
        }
        assert!(limiter.hit(LimitedRoute::Login, "1.2.3.4", now).await.is_err());
    }

    #[tokio::test]
    async fn rejection_reports_time_until_reset() {
        let limiter = limiter(1, 1, 60);
        let start = Instant::now();

        limiter.hit(LimitedRoute::Login, "ip", start).await.unwrap();
        let wait = limiter
            .hit(LimitedRoute::Login, "ip", start + Duration::from_secs(20))
            .await
            .unwrap_err();
        assert_eq!(wait, Duration::from_secs(40));

        // Rejected requests don't extend the window
        limiter
            .hit(LimitedRoute::Login, "ip", start + Duration::from_secs(60))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cleanup_drops_only_expired_windows() {
        let limiter = limiter(1, 1, 60);
        limiter.hit(LimitedRoute::Login, "fresh", Instant::now()).await.unwrap();
        limiter.cleanup().await;
        assert!(limiter.hit(LimitedRoute::Login, "fresh", Instant::now()).await.is_err());

        let expired = self::limiter(1, 1, 0);
        expired.hit(LimitedRoute::Login, "old", Instant::now()).await.unwrap();
        expired.cleanup().await;
        assert!(expired.windows.lock().await.is_empty());
    }

    #[test]
    fn rejection_response_carries_retry_after() {
        let resp = too_many_requests(LimitedRoute::Login, "ip", Duration::from_millis(40_500));
        assert_eq!(resp.status(), axum::http::StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(resp.headers()[header::RETRY_AFTER], "41");
    }

    #[test]
    fn forwarded_for_takes_first_hop() {
        let req = Request::builder()
            .header("x-forwarded-for", "10.0.0.1, 172.16.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req), "10.0.0.1");

        let bare = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_ip(&bare), "unknown");
    }
}
