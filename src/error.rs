//! Error taxonomy for the ordering core
//!
//! Validation outcomes are expected and user-facing; `StoreUnavailable` and
//! `PaymentUnavailable` are infrastructure failures the caller may retry.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use sea_orm::DbErr;
use thiserror::Error;

use crate::models::order::OrderStatus;
use crate::models::ErrorResponse;
use crate::services::payments::PaymentError;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Ordering is closed")]
    OrderingClosed,

    #[error("Orders are accepted between {start} and {end}")]
    OutsideOrderWindow { start: String, end: String },

    #[error("Pickup time must be between {start} and {end}")]
    OutsidePickupWindow { start: String, end: String },

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Product not available: {0}")]
    ProductUnavailable(String),

    #[error("Could not allocate a unique pickup code, please retry")]
    CodeAllocationExhausted,

    /// Insert-time uniqueness violation; the creation workflow retries on it
    #[error("Pickup code {code} is already in use on {day}")]
    PickupCodeConflict { code: String, day: NaiveDate },

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order in status {0} cannot be deleted")]
    DeletionNotAllowed(OrderStatus),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Print job not found: {0}")]
    JobNotFound(String),

    #[error("Feedback not found: {0}")]
    FeedbackNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Payment provider unavailable: {0}")]
    PaymentUnavailable(#[from] PaymentError),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] DbErr),
}

pub type OrderResult<T> = Result<T, OrderError>;

impl OrderError {
    /// Stable machine-readable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            OrderError::OrderingClosed => "ORDERING_CLOSED",
            OrderError::OutsideOrderWindow { .. } => "OUTSIDE_ORDER_WINDOW",
            OrderError::OutsidePickupWindow { .. } => "OUTSIDE_PICKUP_WINDOW",
            OrderError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            OrderError::ProductUnavailable(_) => "PRODUCT_UNAVAILABLE",
            OrderError::CodeAllocationExhausted => "CODE_ALLOCATION_EXHAUSTED",
            OrderError::PickupCodeConflict { .. } => "PICKUP_CODE_CONFLICT",
            OrderError::InvalidTransition { .. } => "INVALID_TRANSITION",
            OrderError::DeletionNotAllowed(_) => "DELETION_NOT_ALLOWED",
            OrderError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            OrderError::JobNotFound(_) => "JOB_NOT_FOUND",
            OrderError::FeedbackNotFound(_) => "FEEDBACK_NOT_FOUND",
            OrderError::InvalidRequest(_) => "INVALID_REQUEST",
            OrderError::PaymentUnavailable(_) => "PAYMENT_UNAVAILABLE",
            OrderError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            OrderError::OrderingClosed
            | OrderError::OutsideOrderWindow { .. }
            | OrderError::OutsidePickupWindow { .. }
            | OrderError::ProductUnavailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            OrderError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            OrderError::ProductNotFound(_)
            | OrderError::OrderNotFound(_)
            | OrderError::JobNotFound(_)
            | OrderError::FeedbackNotFound(_) => StatusCode::NOT_FOUND,
            OrderError::InvalidTransition { .. }
            | OrderError::DeletionNotAllowed(_)
            | OrderError::PickupCodeConflict { .. } => StatusCode::CONFLICT,
            OrderError::CodeAllocationExhausted | OrderError::StoreUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            OrderError::PaymentUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Whether repeating the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OrderError::CodeAllocationExhausted
                | OrderError::PickupCodeConflict { .. }
                | OrderError::PaymentUnavailable(_)
                | OrderError::StoreUnavailable(_)
        )
    }
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Store internals stay in the logs
        let error = match &self {
            OrderError::StoreUnavailable(_) => "Store unavailable, please retry".to_string(),
            OrderError::PaymentUnavailable(_) => "Payment provider unavailable, please retry".to_string(),
            other => other.to_string(),
        };

        (
            status,
            Json(ErrorResponse {
                error,
                code: Some(self.code().to_string()),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OrderError::InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Ready,
        };
        assert_eq!(err.to_string(), "Invalid transition from delivered to ready");

        let err = OrderError::OutsideOrderWindow {
            start: "00:00".to_string(),
            end: "10:00".to_string(),
        };
        assert!(err.to_string().contains("10:00"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(OrderError::OrderingClosed.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            OrderError::DeletionNotAllowed(OrderStatus::Paid).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            OrderError::OrderNotFound("x".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            OrderError::CodeAllocationExhausted.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_retryable() {
        assert!(OrderError::CodeAllocationExhausted.is_retryable());
        assert!(OrderError::StoreUnavailable(DbErr::Custom("down".to_string())).is_retryable());
        assert!(!OrderError::OrderingClosed.is_retryable());
        assert!(!OrderError::DeletionNotAllowed(OrderStatus::Ready).is_retryable());
    }
}
