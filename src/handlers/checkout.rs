//! Payment triggers
//!
//! The success redirect and the provider webhook both end in finalize.
//! Neither surfaces a finalize failure to the payer; see
//! `services::checkout`.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::{info, warn};

use crate::error::OrderError;
use crate::models::checkout::{CheckoutSuccessQuery, CheckoutSuccessResponse, WebhookResponse};
use crate::models::ErrorResponse;
use crate::services::checkout::{self, WebhookAck};
use crate::services::payments::PaymentError;
use crate::AppState;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// GET /api/checkout/success?session_id=
pub async fn checkout_success(
    State(state): State<AppState>,
    Query(query): Query<CheckoutSuccessQuery>,
) -> Result<Json<CheckoutSuccessResponse>, OrderError> {
    let Some(provider) = state.payments.as_deref() else {
        return Err(OrderError::InvalidRequest(
            "payments are simulated; there is no checkout session".to_string(),
        ));
    };

    let outcome = checkout::handle_success_redirect(
        &state.db,
        state.clock.as_ref(),
        provider,
        query.session_id.trim(),
    )
    .await?;

    Ok(Json(CheckoutSuccessResponse {
        session_status: outcome.state.as_str().to_string(),
        order_id: outcome.order_id,
        finalized: outcome.finalized,
        reconciliation_needed: outcome.reconciliation_needed,
    }))
}

/// POST /api/webhooks/payment
///
/// Takes the raw body: the signature covers the exact bytes sent.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Some(provider) = state.payments.as_deref() else {
        return Err(reject(StatusCode::NOT_FOUND, "Payment webhooks are not enabled", "NOT_ENABLED"));
    };

    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        warn!("Webhook without signature header");
        return Err(reject(StatusCode::BAD_REQUEST, "Missing signature", "INVALID_SIGNATURE"));
    };

    let event = provider.parse_webhook(&body, signature).map_err(|e| {
        warn!(error = %e, "Rejected webhook");
        let code = match e {
            PaymentError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            _ => "INVALID_SIGNATURE",
        };
        reject(StatusCode::BAD_REQUEST, &e.to_string(), code)
    })?;

    info!(?event, "Payment webhook received");

    match checkout::handle_payment_event(&state.db, state.clock.as_ref(), event).await {
        WebhookAck::Accepted => Ok(Json(WebhookResponse { received: true })),
        WebhookAck::Retry => Err(reject(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Temporary failure, retry later",
            "STORE_UNAVAILABLE",
        )),
    }
}

fn reject(status: StatusCode, error: &str, code: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            code: Some(code.to_string()),
        }),
    )
}
