//! Hosted checkout integration
//!
//! [`PaymentProvider`] is the seam between the ordering core and whoever
//! takes the money. [`StripeProvider`] talks to the Stripe REST API with
//! plain form-encoded requests; tests substitute their own provider.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::order::OrderWithItems;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Max age of a signed webhook, in seconds
pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

lazy_static! {
    static ref SESSION_ID: Regex = Regex::new(r"^cs_[A-Za-z0-9_]+$").unwrap();
}

/// Checkout session ids are interpolated into provider URL paths
pub fn is_valid_session_id(session_id: &str) -> bool {
    SESSION_ID.is_match(session_id)
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected request: {0}")]
    Rejected(String),

    #[error("Unexpected provider response: {0}")]
    UnexpectedResponse(String),

    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(&'static str),

    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(String),
}

/// A hosted checkout the customer is redirected to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Complete,
    Expired,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Open => "open",
            SessionState::Complete => "complete",
            SessionState::Expired => "expired",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(SessionState::Open),
            "complete" => Some(SessionState::Complete),
            "expired" => Some(SessionState::Expired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: SessionState,
    pub order_id: Option<String>,
}

/// A verified provider notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    /// Checkout completed and the money is captured
    OrderPaid { order_id: String },
    /// Anything else; acknowledged and dropped
    Ignored { event_type: String },
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_checkout(&self, order: &OrderWithItems) -> Result<CheckoutSession, PaymentError>;

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionStatus, PaymentError>;

    /// Verify `signature` over the raw body and decode the event
    fn parse_webhook(&self, payload: &[u8], signature: &str) -> Result<PaymentEvent, PaymentError>;
}

#[derive(Clone)]
pub struct StripeProvider {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
    webhook_secret: String,
    public_base_url: String,
    currency: String,
}

impl StripeProvider {
    pub fn new(
        secret_key: String,
        webhook_secret: String,
        public_base_url: String,
        currency: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: STRIPE_API_BASE.to_string(),
            secret_key,
            webhook_secret,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            currency: currency.to_lowercase(),
        }
    }

    fn checkout_form(&self, order: &OrderWithItems) -> Vec<(String, String)> {
        let order_id = &order.order.id;
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            (
                "success_url".to_string(),
                format!(
                    "{}/api/checkout/success?session_id={{CHECKOUT_SESSION_ID}}",
                    self.public_base_url
                ),
            ),
            (
                "cancel_url".to_string(),
                format!("{}/?checkout=cancelled&order_id={}", self.public_base_url, order_id),
            ),
            ("client_reference_id".to_string(), order_id.clone()),
            ("metadata[orderId]".to_string(), order_id.clone()),
        ];

        for (i, item) in order.items.iter().enumerate() {
            let prefix = format!("line_items[{}]", i);
            form.push((format!("{prefix}[quantity]"), item.qty.to_string()));
            form.push((format!("{prefix}[price_data][currency]"), self.currency.clone()));
            form.push((
                format!("{prefix}[price_data][unit_amount]"),
                item.price_cents_snapshot.to_string(),
            ));
            form.push((
                format!("{prefix}[price_data][product_data][name]"),
                item.name_snapshot.clone(),
            ));
        }

        form
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, PaymentError> {
        let status = response.status();
        let body: Value = response.json().await?;
        if !status.is_success() {
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string();
            return Err(PaymentError::Rejected(format!("{}: {}", status, message)));
        }
        Ok(body)
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn create_checkout(&self, order: &OrderWithItems) -> Result<CheckoutSession, PaymentError> {
        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&self.checkout_form(order))
            .send()
            .await?;
        let body = Self::read_json(response).await?;

        let session_id = body["id"].as_str();
        let url = body["url"].as_str();
        match (session_id, url) {
            (Some(session_id), Some(url)) => {
                debug!(order_id = %order.order.id, session_id, "Checkout session created");
                Ok(CheckoutSession {
                    session_id: session_id.to_string(),
                    url: url.to_string(),
                })
            }
            _ => Err(PaymentError::UnexpectedResponse(body.to_string())),
        }
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionStatus, PaymentError> {
        if !is_valid_session_id(session_id) {
            return Err(PaymentError::Rejected(format!("Invalid session id: {}", session_id)));
        }

        let response = self
            .client
            .get(format!("{}/checkout/sessions/{}", self.api_base, session_id))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?;
        let body = Self::read_json(response).await?;

        let state = body["status"]
            .as_str()
            .and_then(SessionState::parse)
            .ok_or_else(|| PaymentError::UnexpectedResponse(body.to_string()))?;

        Ok(SessionStatus {
            state,
            order_id: order_id_of(&body),
        })
    }

    fn parse_webhook(&self, payload: &[u8], signature: &str) -> Result<PaymentEvent, PaymentError> {
        verify_webhook_signature(
            payload,
            signature,
            &self.webhook_secret,
            chrono::Utc::now().timestamp(),
        )?;
        parse_event(payload)
    }
}

/// Order id carried by a checkout session object
fn order_id_of<'a>(session: &'a Value) -> Option<String> {
    let non_empty = |value: &'a Value| value.as_str().filter(|id| !id.is_empty());
    non_empty(&session["metadata"]["orderId"])
        .or_else(|| non_empty(&session["client_reference_id"]))
        .map(str::to_string)
}

/// Decode a verified webhook body
pub fn parse_event(payload: &[u8]) -> Result<PaymentEvent, PaymentError> {
    let event: Value =
        serde_json::from_slice(payload).map_err(|e| PaymentError::MalformedPayload(e.to_string()))?;

    let event_type = event["type"]
        .as_str()
        .ok_or_else(|| PaymentError::MalformedPayload("missing event type".to_string()))?;

    if event_type != "checkout.session.completed" {
        return Ok(PaymentEvent::Ignored {
            event_type: event_type.to_string(),
        });
    }

    let session = &event["data"]["object"];
    if session["payment_status"].as_str() != Some("paid") {
        debug!(
            payment_status = session["payment_status"].as_str().unwrap_or(""),
            "Checkout completed without captured payment"
        );
        return Ok(PaymentEvent::Ignored {
            event_type: event_type.to_string(),
        });
    }

    match order_id_of(session) {
        Some(order_id) => Ok(PaymentEvent::OrderPaid { order_id }),
        None => {
            warn!("Paid checkout session carries no order id");
            Err(PaymentError::MalformedPayload("missing order id".to_string()))
        }
    }
}

/// Verify a `t=<unix>,v1=<hex>` signature header: HMAC-SHA256 of
/// `"{t}.{payload}"` under `secret`, no older than five minutes
pub fn verify_webhook_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now_ts: i64,
) -> Result<(), PaymentError> {
    let mut timestamp = "";
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signatures.push(v);
        }
    }

    if timestamp.is_empty() || signatures.is_empty() {
        return Err(PaymentError::InvalidSignature("malformed signature header"));
    }

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| PaymentError::InvalidSignature("invalid timestamp"))?;
    if (now_ts - ts).abs() > WEBHOOK_TOLERANCE_SECS {
        return Err(PaymentError::InvalidSignature("timestamp outside tolerance"));
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| PaymentError::InvalidSignature("invalid secret"))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    // Secret rotation sends several v1 entries; any one may match
    let matched = signatures.iter().any(|sig| {
        hex::decode(sig)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });

    if matched {
        Ok(())
    } else {
        Err(PaymentError::InvalidSignature("signature mismatch"))
    }
}

/// Build a signature header the way the provider does
pub fn sign_webhook_payload(payload: &[u8], secret: &str, ts: i64) -> Result<String, PaymentError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| PaymentError::InvalidSignature("invalid secret"))?;
    mac.update(ts.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(format!("t={},v1={}", ts, hex::encode(mac.finalize().into_bytes())))
}
