//! Orders
//!
//! An [`Order`] is the immutable record of a paid submission. The only thing
//! that changes after placement is its status, and every change is appended
//! to the history with a timestamp strictly later than the previous entry.

use std::fmt;

use jiff::{SignedDuration, Timestamp};
use serde::Serialize;

use crate::{
    cart::{CartTotals, LineItem},
    catalog::ProviderId,
    checkout::{CustomerInfo, Schedule, ServiceAddress, ServiceType, Submission},
    ids::TypedUuid,
    pricing::PaymentBreakdown,
};

pub mod status;

pub use status::{
    CancelledBy, OrderEvent, OrderStatus, ProviderResolution, TransitionError, transition,
};

/// Order identifier
pub type OrderId = TypedUuid<Order>;

/// How the customer paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Credit or debit card
    Card,

    /// UPI transfer
    Upi,

    /// Stored-value wallet
    Wallet,
}

impl PaymentMethod {
    /// Stable machine-readable label.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Wallet => "wallet",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proof of a successful payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    /// Method used
    pub method: PaymentMethod,

    /// Processor reference
    pub reference: String,
}

/// Estimated arrival of the professional
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatedArrival {
    /// No professional is on the way yet.
    #[default]
    Pending,

    /// Minutes until arrival.
    Minutes(u32),

    /// The professional has arrived.
    Arrived,
}

impl fmt::Display for EstimatedArrival {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimatedArrival::Pending => f.write_str("Pending"),
            EstimatedArrival::Minutes(1) => f.write_str("1 min"),
            EstimatedArrival::Minutes(minutes) => write!(f, "{minutes} mins"),
            EstimatedArrival::Arrived => f.write_str("Arrived"),
        }
    }
}

/// One entry of an order's status history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// Status entered
    pub status: OrderStatus,

    /// When it was entered
    pub at: Timestamp,

    /// Event that caused the change; `None` for placement
    pub event: Option<OrderEvent>,
}

/// A placed order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    line_items: Vec<LineItem>,
    totals: CartTotals,
    service_type: ServiceType,
    schedule: Schedule,
    customer: CustomerInfo,
    address: ServiceAddress,
    payment: PaymentBreakdown,
    receipt: PaymentReceipt,
    status: OrderStatus,
    estimated_arrival: EstimatedArrival,
    history: Vec<StatusChange>,
    updated_at: Timestamp,
}

impl Order {
    /// Place an order from a paid submission. The order starts `Confirmed`.
    pub fn place(
        id: OrderId,
        submission: Submission,
        receipt: PaymentReceipt,
        at: Timestamp,
    ) -> Self {
        let Submission {
            line_items,
            totals,
            service_type,
            schedule,
            customer,
            address,
            payment,
        } = submission;

        Self {
            id,
            line_items,
            totals,
            service_type,
            schedule,
            customer,
            address,
            payment,
            receipt,
            status: OrderStatus::Confirmed,
            estimated_arrival: EstimatedArrival::Pending,
            history: vec![StatusChange {
                status: OrderStatus::Confirmed,
                at,
                event: None,
            }],
            updated_at: at,
        }
    }

    /// Apply an event and append the resulting status to the history.
    ///
    /// `at` is moved forward to one nanosecond past the last entry if it is not
    /// already later, so history timestamps are strictly increasing.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] if the event is not legal in the current
    /// status; the order is left unchanged.
    pub fn apply(
        &mut self,
        event: OrderEvent,
        at: Timestamp,
    ) -> Result<OrderStatus, TransitionError> {
        let next = transition(self.status, &event)?;

        self.estimated_arrival = match &event {
            OrderEvent::Depart { eta_minutes } => EstimatedArrival::Minutes(*eta_minutes),
            OrderEvent::Arrive => EstimatedArrival::Arrived,
            OrderEvent::ProviderCancelled(ProviderResolution::Reassign(_)) => {
                EstimatedArrival::Pending
            }
            _ => self.estimated_arrival,
        };

        let at = self.next_timestamp(at);

        self.status = next;
        self.updated_at = at;
        self.history.push(StatusChange {
            status: next,
            at,
            event: Some(event),
        });

        Ok(next)
    }

    /// Replace the arrival estimate while the professional is on the way.
    /// Does not add a history entry.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::OutOfOrder`] unless the order is `EnRoute`.
    pub fn update_eta(&mut self, minutes: u32) -> Result<(), TransitionError> {
        if self.status != OrderStatus::EnRoute {
            return Err(TransitionError::OutOfOrder {
                status: self.status,
                event: "update_eta",
            });
        }

        self.estimated_arrival = EstimatedArrival::Minutes(minutes);

        Ok(())
    }

    fn next_timestamp(&self, at: Timestamp) -> Timestamp {
        if at > self.updated_at {
            return at;
        }

        self.updated_at
            .checked_add(SignedDuration::from_nanos(1))
            .unwrap_or(Timestamp::MAX)
    }

    /// Order id
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Frozen cart contents
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// Cart totals at submission time
    pub fn totals(&self) -> CartTotals {
        self.totals
    }

    /// Service type
    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    /// Appointment
    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Contact details
    pub fn customer(&self) -> &CustomerInfo {
        &self.customer
    }

    /// Service address
    pub fn address(&self) -> &ServiceAddress {
        &self.address
    }

    /// Charged amount
    pub fn payment(&self) -> &PaymentBreakdown {
        &self.payment
    }

    /// Payment method and reference
    pub fn receipt(&self) -> &PaymentReceipt {
        &self.receipt
    }

    /// Current status
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Whether the order can no longer change
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Current arrival estimate
    pub fn estimated_arrival(&self) -> EstimatedArrival {
        self.estimated_arrival
    }

    /// Status history, oldest first. Never empty.
    pub fn history(&self) -> &[StatusChange] {
        &self.history
    }

    /// When the status last changed.
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Provider currently responsible for fulfillment: the most recent
    /// reassignment, or the provider of the first line item.
    pub fn current_provider(&self) -> Option<&ProviderId> {
        self.history
            .iter()
            .rev()
            .find_map(|change| match &change.event {
                Some(OrderEvent::ProviderCancelled(ProviderResolution::Reassign(provider))) => {
                    Some(provider)
                }
                _ => None,
            })
            .or_else(|| self.line_items.first().map(|item| &item.provider_id))
    }

    /// Headline for the current status.
    pub fn status_title(&self) -> &'static str {
        self.status.title(self.service_type)
    }

    /// Explanation for the current status.
    pub fn status_description(&self) -> &'static str {
        self.status.description(self.service_type)
    }
}
