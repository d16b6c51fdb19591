//! Order Status
//!
//! The fulfillment state machine. [`transition`] is the single source of
//! truth for which events are legal in which state; it depends only on the
//! current status and the event, never on who produced the event.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::{catalog::ProviderId, checkout::ServiceType};

/// Fulfillment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Paid and waiting for a professional.
    Confirmed,

    /// A professional accepted the booking.
    TherapistAssigned,

    /// The professional is travelling.
    EnRoute,

    /// The professional is at the service address.
    Arrived,

    /// The service has started.
    InProgress,

    /// The service finished. Terminal.
    Completed,

    /// The order was cancelled. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// The next status on the forward path, if any.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Confirmed => Some(OrderStatus::TherapistAssigned),
            OrderStatus::TherapistAssigned => Some(OrderStatus::EnRoute),
            OrderStatus::EnRoute => Some(OrderStatus::Arrived),
            OrderStatus::Arrived => Some(OrderStatus::InProgress),
            OrderStatus::InProgress => Some(OrderStatus::Completed),
            OrderStatus::Completed | OrderStatus::Cancelled => None,
        }
    }

    /// Whether any event moves an order from `self` to `target`.
    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }

        self.next() == Some(target)
            || matches!(target, OrderStatus::Cancelled | OrderStatus::Confirmed)
    }

    /// Stable machine-readable label.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::TherapistAssigned => "therapist_assigned",
            OrderStatus::EnRoute => "en_route",
            OrderStatus::Arrived => "arrived",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Headline shown to the customer.
    pub fn title(self, service_type: ServiceType) -> &'static str {
        let at_home = service_type == ServiceType::AtHome;

        match self {
            OrderStatus::Confirmed => "Booking Confirmed",
            OrderStatus::TherapistAssigned if at_home => "Professional Assigned",
            OrderStatus::TherapistAssigned => "Therapist Assigned",
            OrderStatus::EnRoute => "On the Way",
            OrderStatus::Arrived if at_home => "Professional Arrived",
            OrderStatus::Arrived => "Therapist Ready",
            OrderStatus::InProgress => "Service in Progress",
            OrderStatus::Completed => "Service Completed",
            OrderStatus::Cancelled => "Booking Cancelled",
        }
    }

    /// Explanatory line shown under the title.
    pub fn description(self, service_type: ServiceType) -> &'static str {
        let at_home = service_type == ServiceType::AtHome;

        match self {
            OrderStatus::Confirmed if at_home => {
                "We are assigning a professional for your at-home appointment"
            }
            OrderStatus::Confirmed => "Your spa appointment has been confirmed",
            OrderStatus::TherapistAssigned if at_home => {
                "Your professional is preparing to come to your location"
            }
            OrderStatus::TherapistAssigned => "Your therapist is ready for your spa visit",
            OrderStatus::EnRoute => "Your professional is traveling to your location",
            OrderStatus::Arrived if at_home => "Your professional has reached your location",
            OrderStatus::Arrived => "Your therapist is ready at the spa",
            OrderStatus::InProgress if at_home => {
                "Your at-home service session is currently ongoing"
            }
            OrderStatus::InProgress => "Your spa session is currently ongoing",
            OrderStatus::Completed => "Thank you for choosing our service!",
            OrderStatus::Cancelled => "This booking will not go ahead",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who asked for a cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelledBy {
    /// The customer
    Customer,

    /// Customer support
    Support,
}

/// What the customer chose after the provider cancelled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderResolution {
    /// Restart fulfillment with another provider.
    Reassign(ProviderId),

    /// Give up and refund the payment.
    Refund,
}

/// Input to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderEvent {
    /// A professional accepted the booking.
    AssignTherapist,

    /// The professional set off, with an initial arrival estimate.
    Depart {
        /// Minutes until arrival
        eta_minutes: u32,
    },

    /// The professional reached the service address.
    Arrive,

    /// The service started.
    StartService,

    /// The service ended.
    CompleteService,

    /// Explicit cancellation.
    Cancel(CancelledBy),

    /// The provider withdrew; the customer chose how to continue.
    ProviderCancelled(ProviderResolution),
}

impl OrderEvent {
    /// Stable machine-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderEvent::AssignTherapist => "assign_therapist",
            OrderEvent::Depart { .. } => "depart",
            OrderEvent::Arrive => "arrive",
            OrderEvent::StartService => "start_service",
            OrderEvent::CompleteService => "complete_service",
            OrderEvent::Cancel(_) => "cancel",
            OrderEvent::ProviderCancelled(_) => "provider_cancelled",
        }
    }
}

impl fmt::Display for OrderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected transition. The order is left as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The order already reached a terminal status.
    #[error("order is {status} and can no longer change")]
    Terminal {
        /// Current status
        status: OrderStatus,
    },

    /// The event does not apply to the current status.
    #[error("cannot {event} while order is {status}")]
    OutOfOrder {
        /// Current status
        status: OrderStatus,

        /// Rejected event label
        event: &'static str,
    },
}

/// Resolve the status an event leads to.
///
/// # Errors
///
/// - [`TransitionError::Terminal`]: `status` is terminal.
/// - [`TransitionError::OutOfOrder`]: the event would skip or revisit a step.
pub fn transition(status: OrderStatus, event: &OrderEvent) -> Result<OrderStatus, TransitionError> {
    use OrderEvent as E;
    use OrderStatus as S;

    if status.is_terminal() {
        return Err(TransitionError::Terminal { status });
    }

    match (status, event) {
        (S::Confirmed, E::AssignTherapist) => Ok(S::TherapistAssigned),
        (S::TherapistAssigned, E::Depart { .. }) => Ok(S::EnRoute),
        (S::EnRoute, E::Arrive) => Ok(S::Arrived),
        (S::Arrived, E::StartService) => Ok(S::InProgress),
        (S::InProgress, E::CompleteService) => Ok(S::Completed),
        (_, E::Cancel(_) | E::ProviderCancelled(ProviderResolution::Refund)) => Ok(S::Cancelled),
        (_, E::ProviderCancelled(ProviderResolution::Reassign(_))) => Ok(S::Confirmed),
        (status, event) => Err(TransitionError::OutOfOrder {
            status,
            event: event.as_str(),
        }),
    }
}
