//! Order read model

use jiff::Timestamp;
use ombaro::{
    cart::{CartTotals, LineItem},
    catalog::ProviderId,
    checkout::{Schedule, ServiceType},
    orders::{EstimatedArrival, Order, OrderId, OrderStatus, PaymentReceipt, StatusChange},
    pricing::PaymentBreakdown,
};

/// Snapshot of an order for presentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderView {
    /// Order id
    pub id: OrderId,

    /// Current status
    pub status: OrderStatus,

    /// Status headline
    pub title: &'static str,

    /// Status explanation
    pub description: &'static str,

    /// Service type
    pub service_type: ServiceType,

    /// Arrival estimate
    pub estimated_arrival: EstimatedArrival,

    /// Status history, oldest first
    pub history: Vec<StatusChange>,

    /// Booked services
    pub line_items: Vec<LineItem>,

    /// Cart totals at submission
    pub totals: CartTotals,

    /// Charged amount
    pub payment: PaymentBreakdown,

    /// Payment method and reference
    pub receipt: PaymentReceipt,

    /// Appointment
    pub schedule: Schedule,

    /// Service address, single line
    pub address: String,

    /// Provider currently responsible for the order
    pub provider: Option<ProviderId>,

    /// Time of the last status change
    pub updated_at: Timestamp,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id(),
            status: order.status(),
            title: order.status_title(),
            description: order.status_description(),
            service_type: order.service_type(),
            estimated_arrival: order.estimated_arrival(),
            history: order.history().to_vec(),
            line_items: order.line_items().to_vec(),
            totals: order.totals(),
            payment: *order.payment(),
            receipt: order.receipt().clone(),
            schedule: order.schedule(),
            address: order.address().display_line(),
            provider: order.current_provider().cloned(),
            updated_at: order.updated_at(),
        }
    }
}

/// Notification broadcast whenever an order changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUpdate {
    /// Order id
    pub order_id: OrderId,

    /// Status after the change
    pub status: OrderStatus,

    /// Arrival estimate after the change
    pub estimated_arrival: EstimatedArrival,

    /// Time of the last status change
    pub at: Timestamp,
}

impl From<&Order> for OrderUpdate {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id(),
            status: order.status(),
            estimated_arrival: order.estimated_arrival(),
            at: order.updated_at(),
        }
    }
}
