//! Payment redirect and webhook models

use serde::{Deserialize, Serialize};

/// Query for GET /api/checkout/success
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSuccessQuery {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSuccessResponse {
    /// Provider session state: `open`, `complete` or `expired`
    pub session_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Whether the order is now paid and queued
    pub finalized: bool,
    /// Payment went through for an order staff had cancelled
    pub reconciliation_needed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub received: bool,
}
