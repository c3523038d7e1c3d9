//! Checkout orchestration
//!
//! Glues order creation to the payment provider and funnels both payment
//! triggers into [`finalization::finalize`]. Finalize failures stop here:
//! by the time a trigger fires the provider has captured the money, so
//! they are logged for manual reconciliation and never surfaced to the
//! payer.

use sea_orm::DatabaseConnection;
use tracing::{debug, error, info, warn};

use crate::error::{OrderError, OrderResult};
use crate::models::order::{OrderDraft, OrderWithItems};
use crate::services::clock::Clock;
use crate::services::finalization::{self, FinalizeOutcome, Trigger};
use crate::services::order_creation;
use crate::services::order_repository;
use crate::services::payments::{self, PaymentEvent, PaymentProvider, SessionState};

/// A freshly created order and where to send the customer to pay
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: OrderWithItems,
    pub checkout_url: Option<String>,
}

/// Result of the success-redirect trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessOutcome {
    pub state: SessionState,
    pub order_id: Option<String>,
    /// The order is paid and queued
    pub finalized: bool,
    /// Paid, but the order had been cancelled
    pub reconciliation_needed: bool,
}

/// Create an order and start payment. Without a provider the order is
/// finalized on the spot.
pub async fn place_order(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    payments: Option<&dyn PaymentProvider>,
    draft: &OrderDraft,
) -> OrderResult<PlacedOrder> {
    let created = order_creation::create_order(db, clock, draft).await?;
    let order_id = created.order.id.clone();

    let Some(provider) = payments else {
        run_finalize(db, clock, &order_id, Trigger::Simulated).await;
        let order = order_repository::find_order_by_id(db, &order_id)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.clone()))?;
        return Ok(PlacedOrder {
            order,
            checkout_url: None,
        });
    };

    // The order stays pending_payment if this fails; staff can purge it
    let session = provider.create_checkout(&created).await.map_err(|e| {
        error!(order_id = %order_id, error = %e, "Failed to create checkout session");
        OrderError::from(e)
    })?;

    info!(order_id = %order_id, session_id = %session.session_id, "Checkout session started");
    Ok(PlacedOrder {
        order: created,
        checkout_url: Some(session.url),
    })
}

/// Customer came back from the hosted checkout
pub async fn handle_success_redirect(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    provider: &dyn PaymentProvider,
    session_id: &str,
) -> OrderResult<SuccessOutcome> {
    if !payments::is_valid_session_id(session_id) {
        warn!(session_id = %session_id, "Malformed checkout session id");
        return Err(OrderError::InvalidRequest("invalid session_id".to_string()));
    }

    let session = provider.retrieve_session(session_id).await?;

    let mut outcome = SuccessOutcome {
        state: session.state,
        order_id: session.order_id.clone(),
        finalized: false,
        reconciliation_needed: false,
    };

    match (session.state, session.order_id.as_deref()) {
        (SessionState::Complete, Some(order_id)) => {
            if let Some(result) = run_finalize(db, clock, order_id, Trigger::SuccessRedirect).await {
                outcome.finalized = !result.reconciliation_needed;
                outcome.reconciliation_needed = result.reconciliation_needed;
            }
        }
        (SessionState::Complete, None) => {
            warn!(session_id = %session_id, "Completed session carries no order id");
        }
        (state, _) => {
            info!(session_id = %session_id, ?state, "Checkout session not complete");
        }
    }

    Ok(outcome)
}

/// What the webhook endpoint should answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookAck {
    /// Processed or deliberately ignored
    Accepted,
    /// Transient failure; the provider should redeliver
    Retry,
}

/// Asynchronous provider notification, already verified
pub async fn handle_payment_event(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    event: PaymentEvent,
) -> WebhookAck {
    match event {
        PaymentEvent::OrderPaid { order_id } => {
            match finalization::finalize(db, clock, &order_id).await {
                Ok(outcome) => {
                    log_outcome(&order_id, Trigger::Webhook, outcome);
                    WebhookAck::Accepted
                }
                Err(OrderError::OrderNotFound(_)) => {
                    error!(order_id = %order_id, "Payment received for unknown order");
                    WebhookAck::Accepted
                }
                Err(e) => {
                    error!(order_id = %order_id, error = %e, "Webhook finalize failed");
                    if e.is_retryable() {
                        WebhookAck::Retry
                    } else {
                        WebhookAck::Accepted
                    }
                }
            }
        }
        PaymentEvent::Ignored { event_type } => {
            info!(event_type = %event_type, "Ignoring payment event");
            WebhookAck::Accepted
        }
    }
}

/// Finalize and swallow the error. `None` means it failed.
async fn run_finalize(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    order_id: &str,
    trigger: Trigger,
) -> Option<FinalizeOutcome> {
    match finalization::finalize(db, clock, order_id).await {
        Ok(outcome) => {
            log_outcome(order_id, trigger, outcome);
            Some(outcome)
        }
        Err(e) => {
            error!(order_id = %order_id, %trigger, error = %e, "Finalize failed");
            None
        }
    }
}

fn log_outcome(order_id: &str, trigger: Trigger, outcome: FinalizeOutcome) {
    if outcome.reconciliation_needed {
        warn!(order_id = %order_id, %trigger, "Payment needs manual reconciliation");
    } else if outcome.is_noop() {
        info!(order_id = %order_id, %trigger, "Finalize was a no-op");
    } else {
        debug!(
            order_id = %order_id,
            %trigger,
            status_updated = outcome.status_updated,
            job_created = outcome.job_created,
            "Finalize applied"
        );
    }
}
