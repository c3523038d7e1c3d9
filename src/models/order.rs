//! Order status graph and order request/response models
//!
//! Status progresses:
//!
//! ```text
//! pending_payment ──(finalize)──► paid ──► in_preparation ──► ready ──► delivered
//!        │                          │  └──────────────────────►┘
//!        ▼                          ▼            ▼               ▼
//!    cancelled ◄────────────────────┴────────────┴───────────────┘
//! ```
//!
//! `delivered` and `cancelled` are terminal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::{order_items, orders};

/// Max characters in the free-text note
pub const MAX_NOTE_LENGTH: usize = 120;

/// Max characters in customer name / class label
pub const MAX_CUSTOMER_FIELD_LENGTH: usize = 64;

/// Max characters in a line's selected-options summary
pub const MAX_OPTIONS_LENGTH: usize = 200;

/// Max lines per order
pub const MAX_LINES: usize = 50;

/// Max quantity per line
pub const MAX_QTY: i32 = 20;

/// Order lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, waiting for the payment provider to confirm
    PendingPayment,
    /// Payment recorded and fulfilment job issued
    Paid,
    /// Kitchen is working on it
    InPreparation,
    /// Waiting at the counter
    Ready,
    /// Handed over. Terminal.
    Delivered,
    /// Terminal.
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::PendingPayment,
        OrderStatus::Paid,
        OrderStatus::InPreparation,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::Paid => "paid",
            OrderStatus::InPreparation => "in_preparation",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// No transition leaves a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Full transition graph, including `pending_payment -> paid` which only
    /// finalization may take.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (PendingPayment, Paid)
                | (PendingPayment, Cancelled)
                | (Paid, InPreparation)
                | (Paid, Ready)
                | (InPreparation, Ready)
                | (Ready, Delivered)
                | (Paid, Cancelled)
                | (InPreparation, Cancelled)
                | (Ready, Cancelled)
        )
    }

    /// Transitions staff may request directly. `paid` is reachable only
    /// through finalization.
    pub fn can_staff_transition_to(&self, next: OrderStatus) -> bool {
        next != OrderStatus::Paid && self.can_transition_to(next)
    }

    /// Orders holding accounted money (paid and in flight) may not be deleted
    pub fn is_deletable(&self) -> bool {
        matches!(self, OrderStatus::PendingPayment | OrderStatus::Delivered)
    }

    pub fn deletable() -> [OrderStatus; 2] {
        [OrderStatus::PendingPayment, OrderStatus::Delivered]
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown order status: {}", s))
    }
}

/// Format minor currency units as a two-decimal amount (600 -> "6.00")
pub fn format_minor_units(cents: i64) -> String {
    Decimal::new(cents, 2).to_string()
}

/// One requested product line. Prices are never accepted from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftLine {
    pub product_id: String,
    pub qty: i32,
    #[serde(default)]
    pub selected_options: Option<String>,
}

/// Request body for POST /api/orders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
    pub customer_name: String,
    pub customer_class: String,
    #[serde(default)]
    pub note: Option<String>,
    /// Requested pickup time of day, `HH:MM`
    #[serde(default)]
    pub pickup_time: Option<String>,
    pub lines: Vec<DraftLine>,
}

impl OrderDraft {
    /// Shape checks that need no database access
    pub fn validate(&self) -> Result<(), String> {
        if self.customer_name.trim().is_empty() {
            return Err("customer_name cannot be empty".to_string());
        }
        if self.customer_name.chars().count() > MAX_CUSTOMER_FIELD_LENGTH {
            return Err(format!(
                "customer_name cannot exceed {} characters",
                MAX_CUSTOMER_FIELD_LENGTH
            ));
        }
        if self.customer_class.trim().is_empty() {
            return Err("customer_class cannot be empty".to_string());
        }
        if self.customer_class.chars().count() > MAX_CUSTOMER_FIELD_LENGTH {
            return Err(format!(
                "customer_class cannot exceed {} characters",
                MAX_CUSTOMER_FIELD_LENGTH
            ));
        }
        if let Some(note) = &self.note {
            if note.chars().count() > MAX_NOTE_LENGTH {
                return Err(format!("note cannot exceed {} characters", MAX_NOTE_LENGTH));
            }
        }
        if self.lines.is_empty() {
            return Err("order must contain at least one line".to_string());
        }
        if self.lines.len() > MAX_LINES {
            return Err(format!("order cannot contain more than {} lines", MAX_LINES));
        }
        for line in &self.lines {
            if line.qty < 1 || line.qty > MAX_QTY {
                return Err(format!("qty must be between 1 and {}", MAX_QTY));
            }
            if let Some(options) = &line.selected_options {
                if options.chars().count() > MAX_OPTIONS_LENGTH {
                    return Err(format!(
                        "selected_options cannot exceed {} characters",
                        MAX_OPTIONS_LENGTH
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Trimmed optional text; blank becomes `None`
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// An order together with its line items, in line order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderWithItems {
    pub order: orders::Model,
    pub items: Vec<order_items::Model>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemView {
    pub product_id: Option<String>,
    pub name: String,
    pub unit_price_cents: i64,
    pub qty: i32,
    pub line_total_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_options: Option<String>,
}

impl From<order_items::Model> for OrderItemView {
    fn from(model: order_items::Model) -> Self {
        Self {
            line_total_cents: model.price_cents_snapshot * i64::from(model.qty),
            product_id: model.product_id,
            name: model.name_snapshot,
            unit_price_cents: model.price_cents_snapshot,
            qty: model.qty,
            topic: model.topic_snapshot,
            selected_options: model.selected_options,
        }
    }
}

/// Response shape for a single order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub id: String,
    pub customer_name: String,
    pub customer_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_time: Option<String>,
    pub total_cents: i64,
    /// Display amount, e.g. "6.00"
    pub total: String,
    pub pickup_code: String,
    pub status: String,
    pub order_day: String,
    pub created_at: String,
    pub items: Vec<OrderItemView>,
}

impl From<OrderWithItems> for OrderView {
    fn from(value: OrderWithItems) -> Self {
        let OrderWithItems { order, items } = value;
        Self {
            id: order.id,
            customer_name: order.customer_name,
            customer_class: order.customer_class,
            note: order.note,
            pickup_time: order.pickup_time,
            total: format_minor_units(order.total_cents),
            total_cents: order.total_cents,
            pickup_code: order.pickup_code,
            status: order.status,
            order_day: order.order_day.to_string(),
            created_at: order.created_at.to_rfc3339(),
            items: items.into_iter().map(OrderItemView::from).collect(),
        }
    }
}

/// Response for POST /api/orders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub order: OrderView,
    /// Present when the customer must complete payment with the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
}

/// Response for GET /api/orders/{id}/status (client polling)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusResponse {
    pub id: String,
    pub status: String,
    pub pickup_code: String,
}

/// Query for GET /api/orders?ids=a,b,c
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLookupQuery {
    pub ids: String,
}

impl OrderLookupQuery {
    /// Max ids per lookup
    pub const MAX_IDS: usize = 50;

    pub fn parse_ids(&self) -> Result<Vec<String>, String> {
        let ids: Vec<String> = self
            .ids
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if ids.len() > Self::MAX_IDS {
            return Err(format!("cannot look up more than {} orders at once", Self::MAX_IDS));
        }
        Ok(ids)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderView>,
}

/// Request body for POST /api/staff/orders/{id}/status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub status: OrderStatus,
}

/// Request body for POST /api/staff/orders/bulk-status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkTransitionRequest {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkTransitionResponse {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub updated: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOrdersResponse {
    pub deleted: u64,
}

/// Query for GET /api/staff/orders
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaffOrdersQuery {
    /// A status name, or `all`. Default hides `pending_payment`.
    pub status: Option<String>,
    /// Exact pickup code
    pub code: Option<String>,
}

/// Status selection for the staff dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// Everything except orders still waiting for payment
    Default,
    All,
    Only(OrderStatus),
}

impl StaffOrdersQuery {
    pub fn status_filter(&self) -> Result<StatusFilter, String> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(StatusFilter::Default),
            Some(s) if s.eq_ignore_ascii_case("all") => Ok(StatusFilter::All),
            Some(s) => s.parse().map(StatusFilter::Only),
        }
    }
}

/// Response for GET /api/staff/orders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub orders: Vec<OrderView>,
    pub lifetime_revenue_cents: i64,
    pub period_revenue_cents: i64,
}
