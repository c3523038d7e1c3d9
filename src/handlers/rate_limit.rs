//! Per-IP rate limiting for the public API
//!
//! Fixed window per client IP, sized by `RATE_LIMIT_MAX` requests per
//! `RATE_LIMIT_WINDOW_SECS`. State lives in memory and resets on restart.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tokio::sync::Mutex;
use tracing::warn;

use crate::models::ErrorResponse;
use crate::AppState;

/// Entries idle this long are dropped by [`RateLimiter::cleanup`]
const STALE_AFTER: Duration = Duration::from_secs(300);

struct IpWindow {
    count: u32,
    started: Instant,
}

#[derive(Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: Arc<Mutex<HashMap<String, IpWindow>>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record a request from `ip`; false once the window is used up
    pub async fn check(&self, ip: &str) -> bool {
        self.check_at(ip, Instant::now()).await
    }

    async fn check_at(&self, ip: &str, now: Instant) -> bool {
        let mut clients = self.clients.lock().await;
        let entry = clients.entry(ip.to_string()).or_insert(IpWindow {
            count: 0,
            started: now,
        });

        if now.duration_since(entry.started) >= self.window {
            entry.count = 0;
            entry.started = now;
        }

        if entry.count >= self.max_requests {
            return false;
        }
        entry.count += 1;
        true
    }

    pub async fn cleanup(&self) {
        let now = Instant::now();
        self.clients
            .lock()
            .await
            .retain(|_, entry| now.duration_since(entry.started) < STALE_AFTER.max(self.window));
    }
}

/// First `X-Forwarded-For` hop, then the peer address
fn client_ip(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<std::net::SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn limit_by_ip(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let ip = client_ip(&request);

    if !state.rate_limiter.check(&ip).await {
        warn!(ip = %ip, path = %request.uri().path(), "Rate limit exceeded");
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                error: "Too many requests, try again later".to_string(),
                code: Some("RATE_LIMITED".to_string()),
            }),
        )
            .into_response());
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_window_fills_and_resets() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check_at("10.0.0.1", start).await);
        assert!(limiter.check_at("10.0.0.1", start).await);
        assert!(!limiter.check_at("10.0.0.1", start + Duration::from_secs(59)).await);

        // Other clients have their own window
        assert!(limiter.check_at("10.0.0.2", start).await);

        assert!(limiter.check_at("10.0.0.1", start + Duration::from_secs(60)).await);
    }

    #[test]
    fn test_client_ip_prefers_first_forwarded_hop() {
        let request = axum::http::Request::builder()
            .header("x-forwarded-for", " 203.0.113.7 , 10.0.0.1")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(client_ip(&request), "203.0.113.7");

        let request = axum::http::Request::builder().body(axum::body::Body::empty()).unwrap();
        assert_eq!(client_ip(&request), "unknown");
    }
}
